//! Run output: the `gaps.json` file and the console summary.

pub mod output;
pub mod summary;

pub use output::write_report;
pub use summary::render_summary;
