//! Run orchestration: sequential execution, summary, and reporting.

pub mod pipeline;
pub mod report;
pub mod summary;

pub use pipeline::{execute, Executor};
pub use report::{exit_code, format_elapsed, summary_lines, trailer, write_report};
pub use summary::{RunStatus, RunSummary};
