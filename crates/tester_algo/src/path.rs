//! Path matcher and scenario builder: turns a sequence of named path
//! segments (one per level of the run-item tree, innermost optionally
//! pinned to a single own iteration) into the disjoint iteration ranges
//! they denote, then overlays those ranges onto a `Scenario`.
//!
//! A run item's local index space is laid out own-combo-major: for
//! `n_iters` values of its own vars/args, each value owns one contiguous
//! block of `weight` positions holding that value's copy of the item's
//! children (mirrors the digit decomposition used when numbering the
//! tree). Selecting a named child without pinning a specific own-combo
//! therefore yields one range per value of every ancestor's own vars —
//! a strided selection, not a single contiguous one.

use tester_core::{decode_own_combo, Act, Flags, RunItemArena, RunItemId, Scenario};

use crate::error::AlgoError;

#[derive(Clone, Debug, Default)]
pub struct PathSegment {
    pub name: String,
    /// Pin this segment's own iteration digit to one value instead of
    /// ranging over all of them.
    pub selector: Option<u64>,
    /// `arg=[v1,v2,…]` constraints narrowing the own-combo domain to
    /// combos whose bound argument value is one of the listed values,
    /// e.g. `P:y=1`.
    pub bindings: Vec<(String, Vec<String>)>,
    /// `select`: 1-based position (within the post-binding domain, in
    /// combo order) of the first iteration to keep.
    pub select: Option<u64>,
    /// `step`: stride applied after `select`; `0`/absent keeps only the
    /// selected position.
    pub step: Option<u64>,
}

impl PathSegment {
    pub fn named(name: impl Into<String>) -> Self {
        PathSegment { name: name.into(), ..Default::default() }
    }

    pub fn at(name: impl Into<String>, iteration: u64) -> Self {
        PathSegment { name: name.into(), selector: Some(iteration), ..Default::default() }
    }

    pub fn with_binding(name: impl Into<String>, arg: impl Into<String>, value: impl Into<String>) -> Self {
        PathSegment { name: name.into(), bindings: vec![(arg.into(), vec![value.into()])], ..Default::default() }
    }
}

/// Parse a slash-separated path spec, e.g. `/Session/P:y=1`, into segments.
/// Each segment may carry `;`-separated `arg=v1,v2` bindings after a `:`
/// (each binding's values are OR-matched). Unparseable bindings (missing
/// `=`) are ignored rather than rejected, matching the scenario-build
/// merge's silent-skip-on-no-match stance for unrecognised selectors.
pub fn parse_segments(spec: &str) -> Vec<PathSegment> {
    spec.trim_start_matches('/')
        .split('/')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (name, rest) = match part.split_once(':') {
                Some((n, r)) => (n, Some(r)),
                None => (part, None),
            };
            let mut seg = PathSegment::named(name);
            if let Some(rest) = rest {
                for binding in rest.split(';') {
                    if let Some((k, values)) = binding.split_once('=') {
                        seg.bindings.push((k.to_string(), values.split(',').map(str::to_string).collect()));
                    }
                }
            }
            seg
        })
        .collect()
}

fn node_size(arena: &RunItemArena, id: RunItemId) -> u64 {
    let n = arena.get(id);
    n.n_iters * n.weight.max(1)
}

fn own_domain(arena: &RunItemArena, id: RunItemId, segment: &PathSegment) -> Result<Vec<u64>, AlgoError> {
    let node = arena.get(id);
    let n_iters = node.n_iters;
    let mut domain = match segment.selector {
        None => (0..n_iters).collect::<Vec<_>>(),
        Some(k) if k < n_iters => vec![k],
        Some(k) => {
            return Err(AlgoError::SelectorOutOfRange { name: node.name.clone().unwrap_or_default(), index: k, bound: n_iters })
        }
    };
    if !segment.bindings.is_empty() {
        domain.retain(|&combo| {
            let (_, bound) = decode_own_combo(node, combo);
            segment.bindings.iter().all(|(arg, values)| bound.get(arg).map(|v| values.iter().any(|want| want == v)).unwrap_or(false))
        });
    }
    if let Some(select) = segment.select {
        domain = if select == 0 {
            Vec::new()
        } else {
            let step = segment.step.unwrap_or(0) as usize;
            let mut out = Vec::new();
            let mut idx = (select - 1) as usize;
            loop {
                match domain.get(idx) {
                    Some(&c) => out.push(c),
                    None => break,
                }
                if step == 0 {
                    break;
                }
                idx += step;
            }
            out
        };
    }
    Ok(domain)
}

/// Ranges (inclusive) within `id`'s own local index space that `segments`
/// (starting with the segment matching `id` itself) denote.
fn resolve(arena: &RunItemArena, id: RunItemId, segments: &[PathSegment]) -> Result<Vec<(u64, u64)>, AlgoError> {
    let node = arena.get(id);
    let weight = node.weight.max(1);
    let domain = own_domain(arena, id, &segments[0])?;

    if segments.len() == 1 {
        return Ok(domain.iter().map(|&c| (c * weight, c * weight + weight - 1)).collect());
    }

    let next = &segments[1];
    let mut child_offset = 0u64;
    for &child_id in node.children() {
        let csize = node_size(arena, child_id);
        if arena.get(child_id).name.as_deref() == Some(next.name.as_str()) {
            let sub = resolve(arena, child_id, &segments[1..])?;
            let mut out = Vec::with_capacity(domain.len() * sub.len());
            for &combo in &domain {
                let base = combo * weight + child_offset;
                for &(a, b) in &sub {
                    out.push((base + a, base + b));
                }
            }
            return Ok(out);
        }
        child_offset += csize;
    }
    Err(AlgoError::UnknownPathSegment { name: next.name.clone() })
}

/// Resolve a full path, `segments[0]` matching the config's root item.
pub fn resolve_path(
    arena: &RunItemArena,
    root: RunItemId,
    segments: &[PathSegment],
) -> Result<Vec<(u64, u64)>, AlgoError> {
    if segments.is_empty() {
        return Ok(vec![(0, node_size(arena, root).saturating_sub(1))]);
    }
    if let Some(root_name) = arena.get(root).name.as_deref() {
        if root_name != segments[0].name {
            return Err(AlgoError::UnknownPathSegment { name: segments[0].name.clone() });
        }
    }
    resolve(arena, root, segments)
}

/// One path expression paired with the overlay flags it contributes.
pub struct PathRule<'a> {
    pub segments: &'a [PathSegment],
    pub flags: Flags,
}

/// Build a scenario from an ordered set of path rules, each OR-ing its
/// flags onto the ranges it denotes (later rules can widen, never erase,
/// an earlier one's flags — exclusion is itself just a flag bit).
pub fn build_scenario(
    arena: &RunItemArena,
    root: RunItemId,
    rules: &[PathRule<'_>],
) -> Result<Scenario, AlgoError> {
    let mut scenario = Scenario::new();
    for rule in rules {
        for (first, last) in resolve_path(arena, root, rule.segments)? {
            scenario.add_flags(first, last, rule.flags).map_err(AlgoError::Core)?;
        }
    }
    Ok(scenario)
}

/// A single matched range as a standalone act, useful for callers that
/// want the raw ranges rather than a merged scenario.
pub fn resolve_to_acts(arena: &RunItemArena, root: RunItemId, segments: &[PathSegment], flags: Flags) -> Result<Vec<Act>, AlgoError> {
    resolve_path(arena, root, segments)
        .map(|ranges| ranges.into_iter().map(|(first, last)| Act { first, last, flags }).collect())
}
