//! Assumption diagnostics run before choosing between parametric and
//! non-parametric tests

mod assumptions;

pub use assumptions::{check, AssumptionVerdict, NormalityCheck};
