//! Data-quality checks: gap and duplicate detection, plus the fill and
//! truncation helpers used once the gaps are known.
//!
//! Quality problems are reported, never raised as errors.

pub mod duplicates;
pub mod fill;
pub mod gaps;
pub mod report;

pub use duplicates::*;
pub use fill::*;
pub use gaps::*;
pub use report::*;
