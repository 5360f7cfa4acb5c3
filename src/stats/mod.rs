//! Numerical building blocks: least squares, Weibull MLE, adaptive
//! quadrature and held-out error metrics.

pub mod metrics;
pub mod quadrature;
pub mod regression;
pub mod weibull;

pub use metrics::*;
pub use quadrature::*;
pub use regression::*;
pub use weibull::*;
