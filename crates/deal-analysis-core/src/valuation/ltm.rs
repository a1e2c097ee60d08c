use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::Money;

/// One fiscal year of reported or projected financials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialPeriod {
    pub year: i32,
    #[serde(default)]
    pub gross_revenue: Money,
    pub ebitda: Money,
}

/// Last-twelve-months metrics and the calendar window they cover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LtmMetrics {
    pub gross_revenue: Money,
    pub ebitda: Money,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// LTM metrics from annual history: the most recent fiscal year, regardless of
/// input order. `None` when there is no history or the year is not a valid date.
pub fn calculate_ltm(history: &[FinancialPeriod]) -> Option<LtmMetrics> {
    let latest = history.iter().max_by_key(|p| p.year)?;
    Some(LtmMetrics {
        gross_revenue: latest.gross_revenue,
        ebitda: latest.ebitda,
        start_date: NaiveDate::from_ymd_opt(latest.year, 1, 1)?,
        end_date: NaiveDate::from_ymd_opt(latest.year, 12, 31)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn period(year: i32, ebitda: Money) -> FinancialPeriod {
        FinancialPeriod {
            year,
            gross_revenue: ebitda * dec!(3),
            ebitda,
        }
    }

    #[test]
    fn test_latest_year_wins_regardless_of_order() {
        let history = vec![
            period(2023, dec!(390)),
            period(2021, dec!(300)),
            period(2022, dec!(330)),
        ];
        let ltm = calculate_ltm(&history).unwrap();
        assert_eq!(ltm.ebitda, dec!(390));
        assert_eq!(ltm.gross_revenue, dec!(1170));
        assert_eq!(ltm.start_date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(ltm.end_date, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn test_empty_history() {
        assert!(calculate_ltm(&[]).is_none());
    }
}
