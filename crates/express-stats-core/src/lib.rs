//! express-stats-core: hypothesis-testing decision engine
//!
//! Classifies the columns of a dataset snapshot, offers the experiment
//! designs they support, checks the assumptions of parametric tests, runs the
//! test the decision tree selects and formats the result as verdict records.
//!
//! ```no_run
//! use express_stats_core::{analyze, Column, Dataset, ExperimentOptions, Selection};
//!
//! # fn main() -> express_stats_core::StatsResult<()> {
//! let dataset = Dataset::new(vec![
//!     Column::text("group", ["A", "A", "B", "B"]),
//!     Column::float("value", [10.0, 12.0, 30.0, 31.0]),
//! ])?;
//! let report = analyze(
//!     &dataset,
//!     &Selection::independent("group", "value"),
//!     &ExperimentOptions::default().with_seed(7),
//! )?;
//! println!("{}", report.selection_note);
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod dataset;
pub mod design;
pub mod diagnostics;
pub mod errors;
pub mod experiment;
pub mod report;
pub mod tests;
pub mod types;

pub use classify::{classify, ColumnRole, ColumnRoles};
pub use dataset::{Column, ColumnData, Dataset, Value};
pub use design::{available_designs, ExperimentDesign, Selection};
pub use errors::{StatsError, StatsResult};
pub use experiment::{run_experiment, ExperimentOutcome};
pub use report::{analyze, format_outcome, format_result, Decision, ExperimentReport, Verdict};
pub use types::*;
