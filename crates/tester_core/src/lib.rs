//! Core data model for the test orchestrator: the run-item tree, scenario
//! algebra, requirement evaluation, and deterministic RNG. Depends on
//! nothing else in this workspace; every other crate builds on top of it.

pub mod error;
pub mod ids;
pub mod reqs;
pub mod requirement;
pub mod rng;
pub mod scenario;
pub mod tree;
pub mod value;
pub mod vararg;

pub use error::CoreError;
pub use ids::{ExecId, IterIndex, RunItemId, Tin, TypeId};
pub use reqs::{collect_held, extend_sticky, is_run_required, sticky_subset};
pub use requirement::{ReqId, Requirement, RequirementExpression};
pub use rng::DeterministicRng;
pub use scenario::{new_act, Act, Flags, Scenario};
pub use tree::{
    decode_own_combo, number_config, Config, ConfigTree, Handdown, HookSlot, PackageItem, RunItemArena,
    RunItemKind, RunItemNode, ScriptItem, SessionHooks, SessionItem, TrackConf,
};
pub use value::{Type, Value, ValueKind, ValueRef};
pub use vararg::{group_by_list, VarArg};
