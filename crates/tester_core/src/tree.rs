//! The run-item tree: scripts, sessions and packages, held in a flat arena
//! and addressed by `RunItemId` so the tree never needs self-referential
//! pointers or `Rc<RefCell<_>>`.

use crate::error::CoreError;
use crate::ids::RunItemId;
use crate::requirement::Requirement;
use crate::vararg::{group_by_list, VarArg};

/// How far an inherited override (prologue/epilogue/keepalive/exception or
/// `track_conf`) propagates past the session that sets it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub enum Handdown {
    /// Visible only to this session's own non-session processing; a
    /// nested child session does not see it at all.
    None,
    /// Visible to this session's direct children (including one level of
    /// nested session), but not beyond.
    Children,
    /// Visible to all descendants, transitively, until overridden again.
    #[default]
    Descendants,
}

/// Configuration-backup discipline for a run item's iterations.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub enum TrackConf {
    /// No backup is taken around this item's iterations.
    No,
    /// Backup is taken and restored; drift is reported.
    #[default]
    Yes,
    /// Like `Yes`, but drift is not reported (restored quietly).
    Silent,
    /// Backup is taken but never rolled back into history.
    Nohistory,
    /// Combination of `Yes` and `Nohistory`.
    YesNohistory,
}

impl TrackConf {
    pub fn tracks(self) -> bool {
        !matches!(self, TrackConf::No)
    }

    pub fn reports_drift(self) -> bool {
        matches!(self, TrackConf::Yes | TrackConf::Nohistory)
    }

    pub fn keeps_history(self) -> bool {
        matches!(self, TrackConf::Yes | TrackConf::Silent)
    }
}

/// One of the four service hooks a session may declare, with its handdown
/// reach.
#[derive(Clone, Copy, Debug)]
pub struct HookSlot {
    pub item: RunItemId,
    pub handdown: Handdown,
}

/// A session's own (non-inherited) overrides. Any field left `None` falls
/// through to whatever the parent handed down.
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionHooks {
    pub prologue: Option<HookSlot>,
    pub epilogue: Option<HookSlot>,
    pub keepalive: Option<HookSlot>,
    pub exception: Option<HookSlot>,
    pub track_conf: Option<(TrackConf, Handdown)>,
}

/// A leaf test script.
#[derive(Clone, Debug)]
pub struct ScriptItem {
    pub executable: String,
    pub objective: String,
    pub reqs: Vec<Requirement>,
    pub args: Vec<VarArg>,
    /// Repeat count; the fastest-varying digit in this item's own
    /// iteration numbering.
    pub iterate: u64,
}

/// An interior container of other run items.
#[derive(Clone, Debug)]
pub struct SessionItem {
    pub vars: Vec<VarArg>,
    pub hooks: SessionHooks,
    pub children: Vec<RunItemId>,
    pub iterate: u64,
}

/// A named, separately-loadable bundle: a thin wrapper over one session.
#[derive(Clone, Debug)]
pub struct PackageItem {
    pub name: String,
    pub session: SessionItem,
}

#[derive(Clone, Debug)]
pub enum RunItemKind {
    Script(ScriptItem),
    Session(SessionItem),
    Package(PackageItem),
}

/// One node in a `RunItemArena`.
#[derive(Clone, Debug)]
pub struct RunItemNode {
    pub parent: Option<RunItemId>,
    /// Explicit name used by the path matcher; `None` for service items.
    pub name: Option<String>,
    pub kind: RunItemKind,
    /// `true` for nodes referenced only as a prologue/epilogue/keepalive/
    /// exception hook: excluded from normal iteration numbering and from
    /// path matching.
    pub is_service: bool,

    // Numbering fields, filled in by the preparation pass.
    pub n_args: u64,
    pub n_iters: u64,
    pub weight: u64,
}

impl RunItemNode {
    pub fn own_vars(&self) -> &[VarArg] {
        match &self.kind {
            RunItemKind::Script(s) => &s.args,
            RunItemKind::Session(s) => &s.vars,
            RunItemKind::Package(p) => &p.session.vars,
        }
    }

    pub fn iterate(&self) -> u64 {
        match &self.kind {
            RunItemKind::Script(s) => s.iterate,
            RunItemKind::Session(s) => s.iterate,
            RunItemKind::Package(p) => p.session.iterate,
        }
    }

    pub fn children(&self) -> &[RunItemId] {
        match &self.kind {
            RunItemKind::Script(_) => &[],
            RunItemKind::Session(s) => &s.children,
            RunItemKind::Package(p) => &p.session.children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, RunItemKind::Script(_))
    }
}

/// A flat, index-addressed store of `RunItemNode`s.
#[derive(Clone, Debug, Default)]
pub struct RunItemArena {
    nodes: Vec<RunItemNode>,
}

impl RunItemArena {
    pub fn new() -> Self {
        RunItemArena { nodes: Vec::new() }
    }

    pub fn insert(
        &mut self,
        parent: Option<RunItemId>,
        name: Option<String>,
        kind: RunItemKind,
        is_service: bool,
    ) -> RunItemId {
        let id = RunItemId(self.nodes.len() as u32);
        self.nodes.push(RunItemNode {
            parent,
            name,
            kind,
            is_service,
            n_args: 0,
            n_iters: 0,
            weight: 0,
        });
        id
    }

    pub fn get(&self, id: RunItemId) -> &RunItemNode {
        &self.nodes[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: RunItemId) -> &mut RunItemNode {
        &mut self.nodes[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// One loaded config tree: an arena plus its root item.
#[derive(Clone, Debug)]
pub struct Config {
    pub arena: RunItemArena,
    pub root: RunItemId,
    /// Total iterations of `root`, filled in by preparation
    /// (`root.n_iters * root.weight`).
    pub total_iters: u64,
}

/// A package is a named config, loaded independently and addressable by
/// name in a path.
#[derive(Clone, Debug)]
pub struct ConfigTree {
    pub packages: Vec<Config>,
}

/// Bottom-up numbering pass: fills `n_args`, `n_iters`, `weight` for every
/// node and `total_iters` for the config, per the digit-counting scheme
/// where `iterate` is the fastest-varying own digit, own vars/args are the
/// next digits (list-grouped members share one digit), and a session's
/// weight is the sum of its children's `n_iters * weight` contributions.
pub fn number_config(config: &mut Config) -> Result<(), CoreError> {
    number_node(&mut config.arena, config.root, 0)?;
    let root = config.arena.get(config.root);
    config.total_iters = checked_mul(root.n_iters, root.weight, "root")?;
    Ok(())
}

fn number_node(arena: &mut RunItemArena, id: RunItemId, inherited_args: u64) -> Result<(), CoreError> {
    let children: Vec<RunItemId> = arena.get(id).children().to_vec();
    for &child in &children {
        number_node(arena, child, inherited_args + own_arg_count(arena, id))?;
    }

    let node = arena.get(id);
    let own_count = own_arg_count(arena, id);
    let own_radix = own_radix(node)?;
    let iterate = node.iterate();
    let n_iters = checked_mul(iterate, own_radix, "n_iters")?;

    let weight = if node.is_leaf() {
        1
    } else {
        let mut total = 0u64;
        for &child in &children {
            let c = arena.get(child);
            let contrib = checked_mul(c.n_iters, c.weight, "weight")?;
            total = total
                .checked_add(contrib)
                .ok_or_else(|| CoreError::Overflow { item: format!("{id}") })?;
        }
        total.max(1)
    };

    let node = arena.get_mut(id);
    node.n_args = inherited_args + own_count;
    node.n_iters = n_iters;
    node.weight = weight;
    Ok(())
}

fn own_arg_count(arena: &RunItemArena, id: RunItemId) -> u64 {
    own_arg_groups(arena.get(id)).len() as u64
}

fn own_arg_groups(node: &RunItemNode) -> Vec<(usize, Vec<usize>)> {
    group_by_list(node.own_vars())
}

/// Product of value-counts across own list-groups (each list counts once,
/// at its representative length; empty own vars give radix 1).
fn own_radix(node: &RunItemNode) -> Result<u64, CoreError> {
    let mut radix: u64 = 1;
    for (len, _) in own_arg_groups(node) {
        radix = checked_mul(radix, len.max(1) as u64, "own_radix")?;
    }
    Ok(radix)
}

fn checked_mul(a: u64, b: u64, item: &str) -> Result<u64, CoreError> {
    a.checked_mul(b).ok_or_else(|| CoreError::Overflow { item: item.to_string() })
}

/// Decode a node's own local combo index (`[0, n_iters)`) into the repeat
/// (`iterate`) digit, innermost and fastest-varying, and the bound
/// string value of each of the node's own vars/args. Values that are not
/// plain strings (a `Ref`, `External`, or `TypeRef`) are left unbound;
/// resolving those is the caller's responsibility.
///
/// A list-grouped arg whose own value count is shorter than the list's
/// (the representative length every member steps through) has no value
/// at an out-of-range index; it falls back to its `preferred` value if
/// one is set, per §4.2's "out-of-range indices ... are also kept" rule,
/// and stays unbound otherwise.
pub fn decode_own_combo(node: &RunItemNode, combo: u64) -> (u64, std::collections::HashMap<String, String>) {
    use crate::value::ValueKind;

    let iterate = node.iterate().max(1);
    let repeat_idx = combo % iterate;
    let mut rest = combo / iterate;

    let mut bound = std::collections::HashMap::new();
    for (len, members) in own_arg_groups(node) {
        let radix = len.max(1) as u64;
        let idx = rest % radix;
        rest /= radix;
        for mi in members {
            let arg = &node.own_vars()[mi];
            let value = arg.values.get(idx as usize).or_else(|| arg.preferred.and_then(|p| arg.values.get(p)));
            if let Some(value) = value {
                if let ValueKind::Plain(s) = &value.kind {
                    bound.insert(arg.name.clone(), s.clone());
                }
            }
        }
    }
    (repeat_idx, bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn script(name: &str, args: Vec<VarArg>) -> RunItemKind {
        RunItemKind::Script(ScriptItem {
            executable: name.to_string(),
            objective: String::new(),
            reqs: Vec::new(),
            args,
            iterate: 1,
        })
    }

    fn values(n: usize) -> Vec<Value> {
        (0..n).map(|i| Value::plain(i.to_string())).collect()
    }

    /// Session with var x in {a,b,c}, children P(y in 2 values) and
    /// Q(z in 3 values): P.n_iters=2, Q.n_iters=3, session.weight=5,
    /// session.n_iters=3, total=15.
    #[test]
    fn numbering_example() {
        let mut arena = RunItemArena::new();
        let root = arena.insert(
            None,
            Some("session".into()),
            RunItemKind::Session(SessionItem {
                vars: vec![VarArg::new("x", values(3))],
                hooks: SessionHooks::default(),
                children: Vec::new(),
                iterate: 1,
            }),
            false,
        );
        let p = arena.insert(
            Some(root),
            Some("p".into()),
            script("p", vec![VarArg::new("y", values(2))]),
            false,
        );
        let q = arena.insert(
            Some(root),
            Some("q".into()),
            script("q", vec![VarArg::new("z", values(3))]),
            false,
        );
        if let RunItemKind::Session(s) = &mut arena.get_mut(root).kind {
            s.children = vec![p, q];
        }

        let mut config = Config { arena, root, total_iters: 0 };
        number_config(&mut config).unwrap();

        assert_eq!(config.arena.get(p).n_iters, 2);
        assert_eq!(config.arena.get(q).n_iters, 3);
        assert_eq!(config.arena.get(root).weight, 5);
        assert_eq!(config.arena.get(root).n_iters, 3);
        assert_eq!(config.total_iters, 15);
    }

    #[test]
    fn list_grouped_args_share_one_digit() {
        let mut arena = RunItemArena::new();
        let root = arena.insert(
            None,
            Some("p".into()),
            script(
                "p",
                vec![
                    VarArg::new("a", values(3)).in_list("L"),
                    VarArg::new("b", values(3)).in_list("L"),
                ],
            ),
            false,
        );
        let mut config = Config { arena, root, total_iters: 0 };
        number_config(&mut config).unwrap();
        assert_eq!(config.arena.get(root).n_iters, 3);
        assert_eq!(config.total_iters, 3);
    }

    #[test]
    fn iterate_multiplies_leaf_n_iters() {
        let mut arena = RunItemArena::new();
        let root = arena.insert(
            None,
            Some("p".into()),
            RunItemKind::Script(ScriptItem {
                executable: "p".into(),
                objective: String::new(),
                reqs: Vec::new(),
                args: vec![VarArg::new("y", values(2))],
                iterate: 4,
            }),
            false,
        );
        let mut config = Config { arena, root, total_iters: 0 };
        number_config(&mut config).unwrap();
        assert_eq!(config.arena.get(root).n_iters, 8);
    }

    /// `a` has 3 values, `b` (same list) only 2 with `preferred=0`: the
    /// list's representative length is 3, so at combo index 2 `b` has no
    /// value of its own and falls back to its preferred one instead of
    /// staying unbound.
    #[test]
    fn out_of_range_list_member_falls_back_to_preferred() {
        let node = RunItemNode {
            parent: None,
            name: Some("p".into()),
            kind: script(
                "p",
                vec![
                    VarArg::new("a", values(3)).in_list("L"),
                    VarArg::new("b", values(2)).with_preferred(0).in_list("L"),
                ],
            ),
            is_service: false,
            n_args: 0,
            n_iters: 0,
            weight: 0,
        };
        let (_, bound) = decode_own_combo(&node, 2);
        assert_eq!(bound.get("a").map(String::as_str), Some("2"));
        assert_eq!(bound.get("b").map(String::as_str), Some("0"));
    }

    #[test]
    fn out_of_range_list_member_without_preferred_is_unbound() {
        let node = RunItemNode {
            parent: None,
            name: Some("p".into()),
            kind: script(
                "p",
                vec![
                    VarArg::new("a", values(3)).in_list("L"),
                    VarArg::new("b", values(2)).in_list("L"),
                ],
            ),
            is_service: false,
            n_args: 0,
            n_iters: 0,
            weight: 0,
        };
        let (_, bound) = decode_own_combo(&node, 2);
        assert_eq!(bound.get("a").map(String::as_str), Some("2"));
        assert!(!bound.contains_key("b"));
    }
}
