//! HTTP surface for the feedback dashboards.
//!
//! Every POST route takes the same form (`COURSE_ID`, `DATE`), runs the
//! analysis pipeline for that date and renders one view of the result.

pub mod analyze;
pub mod routes;
mod state;

pub use analyze::{Analysis, AnalyzeError, Mode, analyze, classify_responses};
pub use routes::{AnalyzeForm, router, serve};
pub use state::{AppState, Today};
