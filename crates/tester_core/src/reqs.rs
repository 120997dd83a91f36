//! Requirement-expression evaluation and sticky-requirement bookkeeping.

use std::collections::{HashMap, HashSet};

use crate::error::CoreError;
use crate::requirement::{ReqId, Requirement, RequirementExpression};

/// Resolve a run item's own requirements plus the sticky requirements
/// handed down from its ancestors into one held-tag set, substituting
/// `ref=arg-name` indirections with the argument's currently bound value.
pub fn collect_held(
    own_reqs: &[Requirement],
    sticky: &[Requirement],
    bound_args: &HashMap<String, String>,
) -> Result<HashSet<String>, CoreError> {
    let mut held = HashSet::new();
    for r in own_reqs.iter().chain(sticky.iter()) {
        match &r.id {
            ReqId::Direct(tag) => {
                held.insert(tag.clone());
            }
            ReqId::ArgRef(name) => {
                let value = bound_args
                    .get(name)
                    .ok_or_else(|| CoreError::UnknownArgRef { name: name.clone() })?;
                held.insert(value.clone());
            }
        }
    }
    Ok(held)
}

/// The subset of `reqs` that propagate to descendants during traversal.
pub fn sticky_subset(reqs: &[Requirement]) -> Vec<Requirement> {
    reqs.iter().filter(|r| r.sticky).cloned().collect()
}

/// Accumulate a new level's sticky requirements onto the inherited set.
pub fn extend_sticky(inherited: &[Requirement], own: &[Requirement]) -> Vec<Requirement> {
    let mut out = inherited.to_vec();
    out.extend(sticky_subset(own));
    out
}

/// Evaluate `expr` against `held`, threading `force` the way the
/// reference evaluator does: `Not` sets it on a successful negation,
/// `And` short-circuits its right branch only once a `false` left
/// branch has already set `force` (a probabilistic left miss still
/// lets the right branch run and possibly flip the result), `Or`
/// evaluates both branches unconditionally and leaves `force` at
/// whatever the (always-evaluated) right branch left it at.
fn eval_expr(expr: &RequirementExpression, held: &HashSet<String>, force: &mut bool) -> bool {
    match expr {
        RequirementExpression::Value(v) => held.contains(v),
        RequirementExpression::Not(e) => {
            let result = !eval_expr(e, held, force);
            if !result {
                *force = true;
            }
            result
        }
        RequirementExpression::And(a, b) => {
            let lhs = eval_expr(a, held, force);
            let rhs = if lhs || !*force { eval_expr(b, held, force) } else { false };
            lhs && rhs
        }
        RequirementExpression::Or(a, b) => {
            let lhs = eval_expr(a, held, force);
            let rhs = eval_expr(b, held, force);
            lhs || rhs
        }
    }
}

/// Decide whether an item should run given an optional target expression,
/// the item's held requirement tags, whether this item is a script leaf
/// (a non-script "probabilistic miss" still lets descent continue, since
/// some descendant may yet match), and whether a blanket force-run is in
/// effect.
///
/// Returns `(should_run, forced)`: `forced` is set whenever the
/// expression's own evaluation settled on a definite (non-probabilistic)
/// verdict, or a force-run override made the item run despite a mismatch.
pub fn is_run_required(
    expr: Option<&RequirementExpression>,
    held: &HashSet<String>,
    is_script: bool,
    force_run: bool,
) -> (bool, bool) {
    let (matched, force) = match expr {
        None => (true, false),
        Some(e) => {
            let mut force = false;
            let mut matched = eval_expr(e, held, &mut force);
            if !force {
                // A probabilistic (non-forced) miss still lets a
                // non-script item be entered: its descendants, not
                // itself, carry the real verdict.
                matched = matched || !is_script;
            }
            (matched, force)
        }
    };
    if matched {
        (true, force)
    } else if force_run {
        (true, true)
    } else {
        (false, force)
    }
}
