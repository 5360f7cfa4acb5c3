pub mod frame;
pub mod power_curve;
pub mod types;
pub mod wind;

pub use frame::*;
pub use power_curve::*;
pub use types::*;
pub use wind::*;
