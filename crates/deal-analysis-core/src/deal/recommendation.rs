use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Multiple, Percent};

const HIGH_IRR_PCT: Percent = dec!(20);
const HIGH_MOIC: Multiple = dec!(2);
const MIN_COVERAGE: Multiple = dec!(1.5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongBuy,
    BuyWithConditions,
    RestructureDeal,
    Pass,
}

/// The four screens behind a recommendation, kept for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationScreens {
    pub strong_cash_flow: bool,
    pub high_irr: bool,
    pub high_moic: bool,
    pub good_debt_coverage: bool,
}

impl RecommendationScreens {
    /// `coverage_ratios` holds one debt-service coverage ratio per year with a
    /// payment; an all-equity deal passes the coverage screen.
    pub fn evaluate(
        cash_generation: &[Money],
        coverage_ratios: &[Multiple],
        irr: Percent,
        moic: Multiple,
    ) -> Self {
        Self {
            strong_cash_flow: cash_generation.iter().all(|cf| *cf > Decimal::ZERO),
            high_irr: irr > HIGH_IRR_PCT,
            high_moic: moic > HIGH_MOIC,
            good_debt_coverage: coverage_ratios.iter().all(|r| *r > MIN_COVERAGE),
        }
    }

    pub fn recommendation(&self) -> Recommendation {
        if self.strong_cash_flow && self.high_irr && self.high_moic && self.good_debt_coverage {
            Recommendation::StrongBuy
        } else if (self.strong_cash_flow && self.high_irr)
            || (self.high_moic && self.good_debt_coverage)
        {
            Recommendation::BuyWithConditions
        } else if !self.strong_cash_flow || !self.good_debt_coverage {
            Recommendation::RestructureDeal
        } else {
            Recommendation::Pass
        }
    }
}
