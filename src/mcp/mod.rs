//! Long-term correction of short measurement records (measure-correlate-predict).

pub mod corrector;
pub mod split;

pub use corrector::*;
pub use split::*;
