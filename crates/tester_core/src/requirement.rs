//! Requirements and target requirement expressions.

/// A single requirement attached to a run item, session, or value.
///
/// `id` is either a literal requirement tag or an indirect reference to one
/// of the current run item's argument names (`ref=arg-name`), resolved to
/// that argument's current value during evaluation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Requirement {
    pub id: ReqId,
    /// Sticky requirements propagate to all descendants during traversal.
    pub sticky: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReqId {
    /// A literal requirement tag.
    Direct(String),
    /// Indirect: resolves to the value currently bound to this argument.
    ArgRef(String),
}

impl Requirement {
    pub fn direct(id: impl Into<String>, sticky: bool) -> Self {
        Requirement { id: ReqId::Direct(id.into()), sticky }
    }

    pub fn arg_ref(arg_name: impl Into<String>, sticky: bool) -> Self {
        Requirement { id: ReqId::ArgRef(arg_name.into()), sticky }
    }
}

/// Boolean target-requirement expression.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RequirementExpression {
    Value(String),
    Not(Box<RequirementExpression>),
    And(Box<RequirementExpression>, Box<RequirementExpression>),
    Or(Box<RequirementExpression>, Box<RequirementExpression>),
}

impl RequirementExpression {
    pub fn value(v: impl Into<String>) -> Self {
        RequirementExpression::Value(v.into())
    }

    pub fn not(e: RequirementExpression) -> Self {
        RequirementExpression::Not(Box::new(e))
    }

    pub fn and(a: RequirementExpression, b: RequirementExpression) -> Self {
        RequirementExpression::And(Box::new(a), Box::new(b))
    }

    pub fn or(a: RequirementExpression, b: RequirementExpression) -> Self {
        RequirementExpression::Or(Box::new(a), Box::new(b))
    }
}
