pub mod irr;
pub mod moic;
pub mod payback;

use serde::{Deserialize, Serialize};

use crate::types::{Multiple, Percent};

pub use irr::{calculate_irr, calculate_irr_with, IrrMethod, IrrSolverConfig};
pub use moic::calculate_moic;
pub use payback::{calculate_payback_period, PaybackPeriodResult};

/// Headline return figures for a deal's equity cash flows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnMetrics {
    pub irr: Percent,
    pub moic: Multiple,
    pub payback_period: PaybackPeriodResult,
}
