use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::Energy;
use crate::error::{AssessmentError, Result};

/// Farm yield under increasingly complete wake modelling, with the losses
/// relative to the wake-free estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldComparison {
    pub no_wakes: Energy,
    pub internal_wakes: Energy,
    pub external_wakes: Energy,
    /// Loss from the farm's own wakes, % of `no_wakes`
    pub internal_loss_percent: f64,
    /// Loss from own plus neighbouring farms' wakes, % of `no_wakes`
    pub total_loss_percent: f64,
}

/// Compare the wake-free yield with the internal-wake and the
/// internal-plus-external-wake yields.
pub fn compare_yield_scenarios(
    no_wakes: Energy,
    internal_wakes: Energy,
    external_wakes: Energy,
) -> Result<YieldComparison> {
    if no_wakes.as_watt_hours() <= 0.0 {
        return Err(AssessmentError::Domain(format!(
            "wake-free yield must be positive, got {no_wakes}"
        )));
    }

    let comparison = YieldComparison {
        no_wakes,
        internal_wakes,
        external_wakes,
        internal_loss_percent: 100.0 - internal_wakes.percent_of(no_wakes),
        total_loss_percent: 100.0 - external_wakes.percent_of(no_wakes),
    };

    info!(
        no_wakes_twh = no_wakes.as_terawatt_hours(),
        internal_twh = internal_wakes.as_terawatt_hours(),
        external_twh = external_wakes.as_terawatt_hours(),
        internal_loss_percent = comparison.internal_loss_percent,
        total_loss_percent = comparison.total_loss_percent,
        "yield scenarios compared"
    );
    Ok(comparison)
}
