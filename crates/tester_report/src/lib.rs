//! Pure, offline test-result report model and renderers. Fed by whatever
//! drove the walk (the CLI binary): this crate knows nothing about
//! scripts, processes, or the scenario algebra, only the per-iteration
//! outcomes and optional expected-results cross-check it's handed.

pub mod model;
pub mod render_text;

#[cfg(feature = "render_json")]
pub mod render_json;

pub use model::{build_model, percent_1dp, ReportModel, Summary, TestEntry, Verdict};
pub use render_text::render_text;

#[cfg(feature = "render_json")]
pub use render_json::render_json;
