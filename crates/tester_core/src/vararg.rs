//! `VarArg`: a named parameter of a session (variable) or run item (argument).

use crate::value::Value;

/// A named parameter with an ordered list of candidate `Value`s.
///
/// A `VarArg` may belong to a **list** (symbolic name): all `VarArg`s
/// sharing a list name iterate in lock-step, and the list's length equals
/// the maximum member's value count.
#[derive(Clone, Debug)]
pub struct VarArg {
    pub name: String,
    pub values: Vec<Value>,
    pub list: Option<String>,
    /// Index into `values` that is the "preferred" pick; path-matcher
    /// out-of-range handling consults this.
    pub preferred: Option<usize>,
}

impl VarArg {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        VarArg { name: name.into(), values, list: None, preferred: None }
    }

    pub fn in_list(mut self, list: impl Into<String>) -> Self {
        self.list = Some(list.into());
        self
    }

    pub fn with_preferred(mut self, idx: usize) -> Self {
        self.preferred = Some(idx);
        self
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }
}

/// Group a set of `VarArg`s by list membership, in first-seen order.
/// Solo (non-listed) args each form their own singleton group.
///
/// Returns groups as `(representative_len, member_indices)`. The
/// representative length is the maximum value count among the group's
/// members; the list's length equals the maximum member's value count.
pub fn group_by_list(args: &[VarArg]) -> Vec<(usize, Vec<usize>)> {
    let mut groups: Vec<(Option<String>, usize, Vec<usize>)> = Vec::new();
    for (i, a) in args.iter().enumerate() {
        match &a.list {
            None => groups.push((None, a.value_count(), vec![i])),
            Some(name) => {
                if let Some(g) = groups.iter_mut().find(|g| g.0.as_deref() == Some(name.as_str())) {
                    g.1 = g.1.max(a.value_count());
                    g.2.push(i);
                } else {
                    groups.push((Some(name.clone()), a.value_count(), vec![i]));
                }
            }
        }
    }
    groups.into_iter().map(|(_, len, idxs)| (len, idxs)).collect()
}
