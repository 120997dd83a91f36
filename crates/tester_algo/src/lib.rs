//! Algorithm layer built only on `tester_core`: the path matcher and
//! scenario builder, and the weighted without-replacement dial sampler.

pub mod dial;
pub mod error;
pub mod path;

pub use dial::{apply_dial_to_scenario, DialSampler};
pub use error::AlgoError;
pub use path::{build_scenario, parse_segments, resolve_path, resolve_to_acts, PathRule, PathSegment};
