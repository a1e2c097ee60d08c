use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::deal::recommendation::{Recommendation, RecommendationScreens};
use crate::error::DealAnalysisError;
use crate::financing::{self, AmortizationYear, DebtServiceResult};
use crate::returns::{self, IrrSolverConfig, ReturnMetrics};
use crate::time_value;
use crate::types::*;
use crate::validation;
use crate::valuation::ltm::{self, FinancialPeriod, LtmMetrics};
use crate::valuation::calculate_valuation;
use crate::DealAnalysisResult;

fn default_cash_conversion() -> Percent {
    dec!(100)
}

/// A dated step in a staged acquisition of the target's equity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionTranche {
    pub date: NaiveDate,
    /// Stake acquired on `date`, in percent
    pub percentage: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealStructure {
    /// EV/EBITDA multiple paid at entry, applied to LTM EBITDA
    pub multiple_paid: Multiple,
    /// EV/EBITDA multiple assumed at exit, applied to the final projected EBITDA
    pub exit_multiple: Multiple,
    #[serde(default)]
    pub acquisition_schedule: Vec<AcquisitionTranche>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancingTerms {
    /// Share of the purchase price funded with acquisition debt, in percent
    pub debt_component_pct: Percent,
    /// Annual interest rate on the acquisition debt, in percent
    pub interest_rate_pct: Percent,
    /// Amortisation term of the acquisition debt
    pub term_years: u32,
    /// Discount rate for NPV, in percent
    pub discount_rate_pct: Percent,
}

/// Input for a full deal analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealAnalysisInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    /// Reported annual financials; the latest year supplies LTM EBITDA
    pub historical: Vec<FinancialPeriod>,
    /// Projected annual financials over the holding period
    pub projections: Vec<FinancialPeriod>,
    pub deal_structure: DealStructure,
    pub financing: FinancingTerms,
    /// Share of EBITDA converted to cash each year, in percent
    #[serde(default = "default_cash_conversion")]
    pub cash_conversion_rate_pct: Percent,
    #[serde(default)]
    pub solver: IrrSolverConfig,
    /// Emit `debug` events for each stage of the analysis
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalStructure {
    pub enterprise_value: Money,
    pub equity_investment: Money,
    pub debt_financing: Money,
}

/// One projected year of the holding period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectedYear {
    pub year: i32,
    pub ebitda: Money,
    pub cash_generation: Money,
    pub debt_service: Money,
    pub net_cash_flow: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitSummary {
    pub exit_ebitda: Money,
    pub exit_multiple: Multiple,
    pub exit_enterprise_value: Money,
    /// Acquisition debt still outstanding at the end of the projections
    pub outstanding_debt: Money,
    pub net_exit_proceeds: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Lowest cash generation / debt service across years with a payment
    pub min_debt_service_coverage: Option<Multiple>,
    /// First projected EBITDA / first-year interest
    pub interest_coverage: Option<Multiple>,
    pub debt_to_ebitda: Multiple,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeStep {
    pub date: NaiveDate,
    pub percentage: Percent,
    pub cumulative_pct: Percent,
}

/// Output of a full deal analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealAnalysisOutput {
    pub ltm: LtmMetrics,
    pub valuation: Money,
    pub capital_structure: CapitalStructure,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debt_service: Option<DebtServiceResult>,
    pub amortization: Vec<AmortizationYear>,
    pub projections: Vec<ProjectedYear>,
    pub exit: ExitSummary,
    /// Equity cash flows: entry outlay, then net flows with exit proceeds in the final year
    pub cash_flows: Vec<Money>,
    /// Sum of pre-exit net cash flows
    pub net_cash_position: Money,
    pub return_metrics: ReturnMetrics,
    pub npv: Money,
    pub risk_metrics: RiskMetrics,
    pub acquisition_schedule: Vec<StakeStep>,
    pub acquired_stake_pct: Percent,
    pub screens: RecommendationScreens,
    pub recommendation: Recommendation,
}

fn stake_steps(schedule: &[AcquisitionTranche]) -> DealAnalysisResult<Vec<StakeStep>> {
    for (i, tranche) in schedule.iter().enumerate() {
        validation::is_valid_rate(
            tranche.percentage,
            &format!("deal_structure.acquisition_schedule[{i}].percentage"),
        )?;
    }

    let mut sorted = schedule.to_vec();
    sorted.sort_by_key(|t| t.date);

    let mut cumulative = Decimal::ZERO;
    let steps: Vec<StakeStep> = sorted
        .into_iter()
        .map(|t| {
            cumulative += t.percentage;
            StakeStep {
                date: t.date,
                percentage: t.percentage,
                cumulative_pct: cumulative,
            }
        })
        .collect();

    if cumulative > dec!(100) {
        return Err(DealAnalysisError::invalid_input(
            "deal_structure.acquisition_schedule",
            format!("stakes add up to {cumulative}%, more than 100%"),
        ));
    }
    Ok(steps)
}

fn checked_total<'a>(
    values: impl IntoIterator<Item = &'a Money>,
    context: &str,
) -> DealAnalysisResult<Money> {
    values.into_iter().try_fold(Decimal::ZERO, |acc, v| {
        acc.checked_add(*v)
            .ok_or_else(|| DealAnalysisError::non_finite(context))
    })
}

fn coverage(numerator: Money, denominator: Money) -> Option<Multiple> {
    if denominator.is_zero() {
        None
    } else {
        numerator.checked_div(denominator).map(round2)
    }
}

/// Run the complete acquisition analysis: entry valuation, acquisition debt,
/// projected equity cash flows, exit, and IRR / MOIC / payback / NPV.
pub fn analyze_deal(
    input: &DealAnalysisInput,
) -> DealAnalysisResult<ComputationOutput<DealAnalysisOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let financing_terms = &input.financing;
    let structure = &input.deal_structure;

    // --- Validation ---
    if input.historical.is_empty() {
        return Err(DealAnalysisError::invalid_input(
            "historical",
            "at least one historical year is required",
        ));
    }
    if input.projections.is_empty() {
        return Err(DealAnalysisError::invalid_input(
            "projections",
            "at least one projected year is required",
        ));
    }
    validation::is_valid_rate(financing_terms.debt_component_pct, "financing.debt_component_pct")?;
    validation::is_valid_rate(financing_terms.discount_rate_pct, "financing.discount_rate_pct")?;
    validation::is_valid_rate(input.cash_conversion_rate_pct, "cash_conversion_rate_pct")?;
    validation::is_positive(structure.exit_multiple, "deal_structure.exit_multiple")?;
    let solver = input
        .solver
        .clone()
        .with_trace(input.solver.trace || input.debug);
    solver.validate()?;

    let acquisition_schedule = stake_steps(&structure.acquisition_schedule)?;
    let acquired_stake_pct = acquisition_schedule
        .last()
        .map_or(dec!(100), |s| s.cumulative_pct);
    if acquired_stake_pct < dec!(100) {
        warnings.push(format!(
            "Acquisition schedule covers {acquired_stake_pct}% of the company; returns assume full ownership"
        ));
    }

    // --- Entry valuation ---
    let ltm = ltm::calculate_ltm(&input.historical).ok_or_else(|| {
        DealAnalysisError::invalid_input("historical", "latest year is not a valid calendar year")
    })?;
    let valuation = calculate_valuation(ltm.ebitda, structure.multiple_paid)?;
    if input.debug {
        debug!(ltm_ebitda = %ltm.ebitda, multiple = %structure.multiple_paid, %valuation, "entry valuation");
    }

    // --- Acquisition financing ---
    let debt = valuation
        .checked_mul(financing_terms.debt_component_pct / dec!(100))
        .map(round2)
        .ok_or_else(|| DealAnalysisError::non_finite("debt financing"))?;
    let equity = valuation - debt;
    if equity <= Decimal::ZERO {
        return Err(DealAnalysisError::invalid_input(
            "financing.debt_component_pct",
            "must leave a positive equity investment",
        ));
    }

    let (debt_service, amortization) = if debt > Decimal::ZERO {
        (
            Some(financing::calculate_debt_service(
                debt,
                financing_terms.interest_rate_pct,
                financing_terms.term_years,
            )?),
            financing::amortization_schedule(
                debt,
                financing_terms.interest_rate_pct,
                financing_terms.term_years,
            )?,
        )
    } else {
        (None, Vec::new())
    };
    if input.debug {
        debug!(%debt, %equity, years = amortization.len(), "acquisition financing");
    }

    // --- Holding-period cash flows ---
    let mut periods = input.projections.clone();
    periods.sort_by_key(|p| p.year);
    let conversion = input.cash_conversion_rate_pct / dec!(100);
    let payments = debt_service
        .as_ref()
        .map(|ds| ds.yearly_payments.as_slice())
        .unwrap_or(&[]);

    let projections = periods
        .iter()
        .enumerate()
        .map(|(idx, period)| {
            let cash_generation = period
                .ebitda
                .checked_mul(conversion)
                .map(round2)
                .ok_or_else(|| DealAnalysisError::non_finite("cash generation"))?;
            let payment = payments.get(idx).copied().unwrap_or(Decimal::ZERO);
            let net_cash_flow = cash_generation
                .checked_sub(payment)
                .ok_or_else(|| DealAnalysisError::non_finite("net cash flow"))?;
            Ok(ProjectedYear {
                year: period.year,
                ebitda: period.ebitda,
                cash_generation,
                debt_service: payment,
                net_cash_flow,
            })
        })
        .collect::<DealAnalysisResult<Vec<ProjectedYear>>>()?;

    // --- Exit ---
    let horizon = projections.len();
    let exit_ebitda = periods[horizon - 1].ebitda;
    if exit_ebitda <= Decimal::ZERO {
        return Err(DealAnalysisError::invalid_input(
            "projections",
            "final projected EBITDA must be positive to value the exit",
        ));
    }
    let exit_enterprise_value = calculate_valuation(exit_ebitda, structure.exit_multiple)?;
    let outstanding_debt = amortization
        .get(horizon - 1)
        .map_or(Decimal::ZERO, |y| y.remaining_balance);
    if outstanding_debt > Decimal::ZERO {
        warnings.push(format!(
            "Debt term of {} years outlives the {horizon}-year projection; {outstanding_debt} outstanding is repaid from exit proceeds",
            financing_terms.term_years
        ));
    }
    let net_exit_proceeds = exit_enterprise_value
        .checked_sub(outstanding_debt)
        .ok_or_else(|| DealAnalysisError::non_finite("net exit proceeds"))?;

    let mut cash_flows = Vec::with_capacity(horizon + 1);
    cash_flows.push(-equity);
    cash_flows.extend(projections.iter().map(|p| p.net_cash_flow));
    if let Some(last) = cash_flows.last_mut() {
        *last = last
            .checked_add(net_exit_proceeds)
            .ok_or_else(|| DealAnalysisError::non_finite("final-year cash flow with exit"))?;
    }
    let net_cash_position =
        checked_total(projections.iter().map(|p| &p.net_cash_flow), "net cash position")?;
    if input.debug {
        debug!(?cash_flows, %net_exit_proceeds, "equity cash flows");
    }

    // --- Returns ---
    let irr = returns::calculate_irr_with(&cash_flows, &solver)?;
    let total_return = checked_total(&cash_flows[1..], "total return")?;
    let moic = returns::calculate_moic(total_return, equity)?;
    let payback_period = returns::calculate_payback_period(&cash_flows)?;
    let npv = time_value::calculate_npv(financing_terms.discount_rate_pct, &cash_flows)?;
    if !payback_period.is_achieved {
        warnings.push("Equity investment is not paid back within the projection horizon".into());
    }
    if input.debug {
        debug!(%irr, %moic, payback_years = %payback_period.years, %npv, "return metrics");
    }

    // --- Risk ---
    let debt_to_ebitda = debt
        .checked_div(ltm.ebitda)
        .map(round2)
        .ok_or_else(|| DealAnalysisError::non_finite("debt / EBITDA"))?;
    let coverage_ratios: Vec<Multiple> = projections
        .iter()
        .filter_map(|p| coverage(p.cash_generation, p.debt_service))
        .collect();
    let risk_metrics = RiskMetrics {
        min_debt_service_coverage: coverage_ratios.iter().copied().min(),
        interest_coverage: amortization
            .first()
            .and_then(|y| coverage(projections[0].ebitda, y.interest)),
        debt_to_ebitda,
    };

    let cash_generation: Vec<Money> = projections.iter().map(|p| p.cash_generation).collect();
    let screens = RecommendationScreens::evaluate(&cash_generation, &coverage_ratios, irr, moic);
    let recommendation = screens.recommendation();

    let output = DealAnalysisOutput {
        ltm,
        valuation,
        capital_structure: CapitalStructure {
            enterprise_value: valuation,
            equity_investment: equity,
            debt_financing: debt,
        },
        debt_service,
        amortization,
        projections,
        exit: ExitSummary {
            exit_ebitda,
            exit_multiple: structure.exit_multiple,
            exit_enterprise_value,
            outstanding_debt,
            net_exit_proceeds,
        },
        cash_flows,
        net_cash_position,
        return_metrics: ReturnMetrics {
            irr,
            moic,
            payback_period,
        },
        npv,
        risk_metrics,
        acquisition_schedule,
        acquired_stake_pct,
        screens,
        recommendation,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "M&A deal analysis: EBITDA multiple valuation, amortising acquisition debt, IRR / MOIC / payback / NPV",
        &serde_json::json!({
            "company_name": input.company_name,
            "multiple_paid": structure.multiple_paid.to_string(),
            "exit_multiple": structure.exit_multiple.to_string(),
            "debt_component_pct": financing_terms.debt_component_pct.to_string(),
            "interest_rate_pct": financing_terms.interest_rate_pct.to_string(),
            "term_years": financing_terms.term_years,
            "discount_rate_pct": financing_terms.discount_rate_pct.to_string(),
            "cash_conversion_rate_pct": input.cash_conversion_rate_pct.to_string(),
            "irr_method": solver.method,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rust_decimal_macros::dec;

    fn period(year: i32, ebitda: Money) -> FinancialPeriod {
        FinancialPeriod {
            year,
            gross_revenue: ebitda * dec!(4),
            ebitda,
        }
    }

    fn sample_input() -> DealAnalysisInput {
        DealAnalysisInput {
            company_name: Some("Project Alpha".into()),
            historical: vec![
                period(2021, dec!(300)),
                period(2022, dec!(390)),
                period(2023, dec!(507)),
            ],
            projections: vec![
                period(2024, dec!(600)),
                period(2025, dec!(660)),
                period(2026, dec!(726)),
                period(2027, dec!(800)),
                period(2028, dec!(880)),
            ],
            deal_structure: DealStructure {
                multiple_paid: dec!(6),
                exit_multiple: dec!(7),
                acquisition_schedule: vec![],
            },
            financing: FinancingTerms {
                debt_component_pct: dec!(50),
                interest_rate_pct: dec!(8),
                term_years: 5,
                discount_rate_pct: dec!(12),
            },
            cash_conversion_rate_pct: dec!(80),
            solver: IrrSolverConfig::default(),
            debug: false,
        }
    }

    #[test]
    fn test_entry_and_financing() {
        let out = analyze_deal(&sample_input()).unwrap().result;
        assert_eq!(out.valuation, dec!(3042));
        assert_eq!(out.capital_structure.debt_financing, dec!(1521));
        assert_eq!(out.capital_structure.equity_investment, dec!(1521));
        let ds = out.debt_service.unwrap();
        assert_eq!(ds.yearly_payments[0], dec!(370.08));
        assert_eq!(out.amortization.len(), 5);
    }

    #[test]
    fn test_cash_flow_vector() {
        let out = analyze_deal(&sample_input()).unwrap().result;
        assert_eq!(
            out.cash_flows,
            vec![
                dec!(-1521),
                dec!(109.92),
                dec!(157.92),
                dec!(210.72),
                dec!(269.92),
                dec!(6493.92),
            ]
        );
        assert_eq!(out.exit.exit_enterprise_value, dec!(6160));
        assert_eq!(out.exit.outstanding_debt, Decimal::ZERO);
        assert_eq!(out.net_cash_position, dec!(1082.40));
    }

    #[test]
    fn test_return_metrics() {
        let out = analyze_deal(&sample_input()).unwrap().result;
        let metrics = &out.return_metrics;
        assert!((metrics.irr - dec!(39.85)).abs() <= dec!(0.01), "irr {}", metrics.irr);
        assert_eq!(metrics.moic, dec!(4.76));
        assert_eq!(metrics.payback_period.years, dec!(4.12));
        assert!(metrics.payback_period.is_achieved);
        assert!((out.npv - dec!(2709.39)).abs() <= dec!(0.01), "npv {}", out.npv);
    }

    #[test]
    fn test_risk_and_recommendation() {
        let out = analyze_deal(&sample_input()).unwrap().result;
        assert_eq!(out.risk_metrics.min_debt_service_coverage, Some(dec!(1.30)));
        assert_eq!(out.risk_metrics.interest_coverage, Some(dec!(5.34)));
        assert_eq!(out.risk_metrics.debt_to_ebitda, dec!(3));
        assert!(!out.screens.good_debt_coverage);
        assert_eq!(out.recommendation, Recommendation::BuyWithConditions);
    }

    #[test]
    fn test_all_equity_deal() {
        let mut input = sample_input();
        input.financing.debt_component_pct = Decimal::ZERO;
        let out = analyze_deal(&input).unwrap().result;
        assert!(out.debt_service.is_none());
        assert!(out.amortization.is_empty());
        assert_eq!(out.capital_structure.equity_investment, dec!(3042));
        assert_eq!(out.risk_metrics.min_debt_service_coverage, None);
        assert_eq!(out.risk_metrics.interest_coverage, None);
        assert!(out.screens.good_debt_coverage);
    }

    #[test]
    fn test_debt_outliving_projection_reduces_exit() {
        let mut input = sample_input();
        input.financing.term_years = 7;
        let output = analyze_deal(&input).unwrap();
        let out = &output.result;
        assert!(out.exit.outstanding_debt > Decimal::ZERO);
        assert_eq!(
            out.exit.net_exit_proceeds,
            out.exit.exit_enterprise_value - out.exit.outstanding_debt
        );
        assert!(output.warnings.iter().any(|w| w.contains("outlives")));
    }

    #[test]
    fn test_fully_debt_funded_rejected() {
        let mut input = sample_input();
        input.financing.debt_component_pct = dec!(100);
        let err = analyze_deal(&input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_missing_history_rejected() {
        let mut input = sample_input();
        input.historical.clear();
        assert!(analyze_deal(&input).is_err());
    }

    #[test]
    fn test_negative_exit_ebitda_rejected() {
        let mut input = sample_input();
        input.projections.last_mut().unwrap().ebitda = dec!(-10);
        let err = analyze_deal(&input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_acquisition_schedule() {
        let mut input = sample_input();
        input.deal_structure.acquisition_schedule = vec![
            AcquisitionTranche {
                date: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
                percentage: dec!(30),
            },
            AcquisitionTranche {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                percentage: dec!(60),
            },
        ];
        let output = analyze_deal(&input).unwrap();
        let steps = &output.result.acquisition_schedule;
        assert_eq!(steps[0].percentage, dec!(60));
        assert_eq!(steps[1].cumulative_pct, dec!(90));
        assert_eq!(output.result.acquired_stake_pct, dec!(90));
        assert!(output.warnings.iter().any(|w| w.contains("90%")));

        input.deal_structure.acquisition_schedule[0].percentage = dec!(50);
        assert!(analyze_deal(&input).is_err());
    }

    #[test]
    fn test_exit_overflow_is_a_calculation_failure() {
        let mut input = sample_input();
        input.deal_structure.exit_multiple = dec!(1);
        input.projections.last_mut().unwrap().ebitda = Decimal::MAX * dec!(0.6);
        // 80% cash generation plus a 1x exit on the same EBITDA exceeds Decimal::MAX
        let err = analyze_deal(&input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CalculationFailure);
    }

    #[test]
    fn test_input_defaults_from_json() {
        let json = r#"{
            "historical": [{ "year": 2023, "ebitda": "507" }],
            "projections": [{ "year": 2024, "ebitda": "600" }],
            "deal_structure": { "multiple_paid": "6", "exit_multiple": "7" },
            "financing": {
                "debt_component_pct": "0",
                "interest_rate_pct": "0",
                "term_years": 5,
                "discount_rate_pct": "10"
            }
        }"#;
        let input: DealAnalysisInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.cash_conversion_rate_pct, dec!(100));
        assert!(!input.debug);
        let out = analyze_deal(&input).unwrap().result;
        // -3042, then 600 + 4200 exit
        assert_eq!(out.cash_flows, vec![dec!(-3042), dec!(4800)]);
    }
}
