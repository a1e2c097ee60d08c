//! Internal rate of return on a periodic cash-flow series.
//!
//! The solver works on `NPV(r) = sum cf_j / (1 + r)^j`. Newton-Raphson is fast
//! but is only guaranteed to find *a* root: a series with several sign changes
//! can have several IRRs, and Newton returns whichever its path reaches first
//! (from the default 10% guess, usually the one nearest 10%). Bisection over a
//! bounded range always converges when the range brackets a root, so the default
//! method runs Newton first and falls back to bisection when Newton diverges or
//! runs out of iterations.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::error::{CalculationFailure, DealAnalysisError};
use crate::types::{round2, Money, Percent, Rate};
use crate::validation;
use crate::DealAnalysisResult;

const DEFAULT_INITIAL_GUESS: Rate = dec!(0.10);
const DEFAULT_TOLERANCE: Decimal = dec!(0.00001);
const DEFAULT_MAX_ITERATIONS: u32 = 1000;
const DEFAULT_LOWER_BOUND: Rate = dec!(-0.99);
const DEFAULT_UPPER_BOUND: Rate = dec!(10);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrrMethod {
    Newton,
    Bisection,
    #[default]
    NewtonWithBisectionFallback,
}

/// Solver settings. Every field has a default, so partial JSON/YAML is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IrrSolverConfig {
    pub method: IrrMethod,
    /// Starting rate for Newton, as a decimal
    pub initial_guess: Rate,
    /// Convergence threshold on the rate step (and on NPV for degenerate steps)
    pub tolerance: Decimal,
    pub max_iterations: u32,
    /// Bisection bracket, as decimals
    pub lower_bound: Rate,
    pub upper_bound: Rate,
    /// Emit a `trace` event per iteration
    pub trace: bool,
}

impl Default for IrrSolverConfig {
    fn default() -> Self {
        Self {
            method: IrrMethod::default(),
            initial_guess: DEFAULT_INITIAL_GUESS,
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            lower_bound: DEFAULT_LOWER_BOUND,
            upper_bound: DEFAULT_UPPER_BOUND,
            trace: false,
        }
    }
}

impl IrrSolverConfig {
    #[must_use]
    pub fn with_method(mut self, method: IrrMethod) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    #[must_use]
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn validate(&self) -> DealAnalysisResult<()> {
        validation::is_positive(self.tolerance, "solver.tolerance")?;
        validation::is_positive(Decimal::from(self.max_iterations), "solver.max_iterations")?;
        if self.lower_bound <= dec!(-1) {
            return Err(DealAnalysisError::invalid_input(
                "solver.lower_bound",
                "must be greater than -100%",
            ));
        }
        if self.lower_bound >= self.upper_bound {
            return Err(DealAnalysisError::invalid_input(
                "solver.upper_bound",
                "must be greater than solver.lower_bound",
            ));
        }
        if self.initial_guess <= dec!(-1) {
            return Err(DealAnalysisError::invalid_input(
                "solver.initial_guess",
                "must be greater than -100%",
            ));
        }
        Ok(())
    }
}

/// IRR as a percentage rounded to 2 dp, using the default solver.
pub fn calculate_irr(cash_flows: &[Money]) -> DealAnalysisResult<Percent> {
    calculate_irr_with(cash_flows, &IrrSolverConfig::default())
}

/// IRR as a percentage rounded to 2 dp.
pub fn calculate_irr_with(
    cash_flows: &[Money],
    config: &IrrSolverConfig,
) -> DealAnalysisResult<Percent> {
    validation::is_valid_array(cash_flows, "cash_flows")?;
    config.validate()?;

    let rate = match config.method {
        IrrMethod::Newton => newton(cash_flows, config)?,
        IrrMethod::Bisection => bisection(cash_flows, config)?,
        IrrMethod::NewtonWithBisectionFallback => match newton(cash_flows, config) {
            Ok(rate) => rate,
            Err(newton_err) => {
                if config.trace {
                    warn!(error = %newton_err, "Newton IRR failed, retrying with bisection");
                }
                bisection(cash_flows, config).map_err(|_| newton_err)?
            }
        },
    };

    rate.checked_mul(dec!(100))
        .map(round2)
        .ok_or_else(|| DealAnalysisError::non_finite("IRR percentage"))
}

/// NPV and dNPV/dr at `rate`; `None` when a discount factor overflows or reaches zero.
fn npv_and_derivative(cash_flows: &[Money], rate: Rate) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;
    let mut npv = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;

    for (j, cf) in cash_flows.iter().enumerate() {
        if j > 0 {
            discount = discount.checked_mul(one_plus_r)?;
        }
        if discount.is_zero() {
            return None;
        }
        npv = npv.checked_add(cf.checked_div(discount)?)?;

        if j > 0 {
            let denom = discount.checked_mul(one_plus_r)?;
            if denom.is_zero() {
                return None;
            }
            let term = Decimal::from(j as u64)
                .checked_mul(*cf)?
                .checked_div(denom)?;
            dnpv = dnpv.checked_sub(term)?;
        }
    }

    Some((npv, dnpv))
}

fn divergence(iteration: u32, rate: Rate) -> DealAnalysisError {
    CalculationFailure::IrrDivergence { iteration, rate }.into()
}

fn newton(cash_flows: &[Money], config: &IrrSolverConfig) -> DealAnalysisResult<Rate> {
    let mut rate = config.initial_guess;
    let mut last_delta = Decimal::ZERO;
    let restart = config
        .initial_guess
        .checked_mul(dec!(2))
        .ok_or_else(|| DealAnalysisError::invalid_input("solver.initial_guess", "is too large"))?;

    for iteration in 0..config.max_iterations {
        let (npv, dnpv) =
            npv_and_derivative(cash_flows, rate).ok_or_else(|| divergence(iteration, rate))?;

        if config.trace {
            trace!(iteration, %rate, %npv, %dnpv, "IRR Newton step");
        }

        // Flat NPV: accept if already on the root, otherwise restart from twice the
        // initial guess. A plateau everywhere runs out of iterations.
        if dnpv.abs() < config.tolerance {
            if npv.abs() < config.tolerance {
                return Ok(rate);
            }
            rate = restart;
            continue;
        }

        let next = npv
            .checked_div(dnpv)
            .and_then(|step| rate.checked_sub(step))
            .ok_or_else(|| divergence(iteration, rate))?;

        last_delta = (next - rate).abs();
        if last_delta < config.tolerance {
            return Ok(next);
        }
        rate = next;
    }

    Err(CalculationFailure::IrrNonConvergent {
        iterations: config.max_iterations,
        last_delta,
    }
    .into())
}

fn bisection(cash_flows: &[Money], config: &IrrSolverConfig) -> DealAnalysisResult<Rate> {
    let npv_at = |rate: Rate, iteration: u32| -> DealAnalysisResult<Decimal> {
        npv_and_derivative(cash_flows, rate)
            .map(|(npv, _)| npv)
            .ok_or_else(|| divergence(iteration, rate))
    };

    let mut lo = config.lower_bound;
    let mut hi = config.upper_bound;
    let mut f_lo = npv_at(lo, 0)?;
    let f_hi = npv_at(hi, 0)?;

    if f_lo.abs() < config.tolerance {
        return Ok(lo);
    }
    if f_hi.abs() < config.tolerance {
        return Ok(hi);
    }
    // No sign change across the bracket: no root to converge on.
    if f_lo.is_sign_positive() == f_hi.is_sign_positive() {
        return Err(CalculationFailure::IrrNonConvergent {
            iterations: 0,
            last_delta: f_lo.abs().min(f_hi.abs()),
        }
        .into());
    }

    for iteration in 1..=config.max_iterations {
        let mid = (lo + hi) / dec!(2);
        let f_mid = npv_at(mid, iteration)?;

        if config.trace {
            trace!(iteration, %lo, %hi, %f_mid, "IRR bisection step");
        }

        if f_mid.abs() < config.tolerance || (hi - lo) / dec!(2) < config.tolerance {
            return Ok(mid);
        }

        if f_mid.is_sign_positive() == f_lo.is_sign_positive() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    Err(CalculationFailure::IrrNonConvergent {
        iterations: config.max_iterations,
        last_delta: hi - lo,
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rust_decimal_macros::dec;

    #[test]
    fn test_single_period_ten_percent() {
        assert_eq!(calculate_irr(&[dec!(-100), dec!(110)]).unwrap(), dec!(10.00));
    }

    #[test]
    fn test_even_cash_flows() {
        // -1000, +400 x3 => IRR ~9.70%
        let irr = calculate_irr(&[dec!(-1000), dec!(400), dec!(400), dec!(400)]).unwrap();
        assert_eq!(irr, dec!(9.70));
    }

    #[test]
    fn test_bisection_agrees_with_newton() {
        let cfs = [dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let config = IrrSolverConfig::default().with_method(IrrMethod::Bisection);
        let irr = calculate_irr_with(&cfs, &config).unwrap();
        assert!((irr - dec!(9.70)).abs() <= dec!(0.01), "got {irr}");
    }

    #[test]
    fn test_negative_irr() {
        // Lose 20% over one period
        assert_eq!(calculate_irr(&[dec!(-100), dec!(80)]).unwrap(), dec!(-20.00));
    }

    #[test]
    fn test_multiple_roots_returns_root_nearest_guess() {
        // NPV is zero at both 10% and 20%
        let cfs = [dec!(-100), dec!(230), dec!(-132)];
        assert_eq!(calculate_irr(&cfs).unwrap(), dec!(10.00));
    }

    #[test]
    fn test_empty_series_rejected() {
        let err = calculate_irr(&[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_no_sign_change_never_converges() {
        let cfs = [dec!(100), dec!(100)];
        let config = IrrSolverConfig::default().with_method(IrrMethod::Newton);
        let err = calculate_irr_with(&cfs, &config).unwrap_err();
        assert!(matches!(
            err,
            DealAnalysisError::CalculationFailure(CalculationFailure::IrrNonConvergent { .. })
        ));

        // The fallback cannot bracket a root either, so the Newton error surfaces.
        let err = calculate_irr(&cfs).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CalculationFailure);
    }

    #[test]
    fn test_flat_npv_runs_out_of_iterations() {
        // A lone outlay and a lone inflow: NPV does not depend on the rate at all.
        for cfs in [vec![dec!(-100)], vec![dec!(5), Decimal::ZERO, Decimal::ZERO]] {
            let err = calculate_irr(&cfs).unwrap_err();
            assert!(
                matches!(
                    err,
                    DealAnalysisError::CalculationFailure(CalculationFailure::IrrNonConvergent {
                        iterations: 1000,
                        ..
                    })
                ),
                "{cfs:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_flat_npv_on_the_root_is_accepted() {
        let config = IrrSolverConfig::default().with_method(IrrMethod::Newton);
        assert_eq!(
            calculate_irr_with(&[Decimal::ZERO, Decimal::ZERO], &config).unwrap(),
            dec!(10.00)
        );
    }

    #[test]
    fn test_iteration_cap_reports_non_convergence() {
        let cfs = [dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let config = IrrSolverConfig::default()
            .with_method(IrrMethod::Newton)
            .with_max_iterations(1);
        let err = calculate_irr_with(&cfs, &config).unwrap_err();
        assert!(matches!(
            err,
            DealAnalysisError::CalculationFailure(CalculationFailure::IrrNonConvergent {
                iterations: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_fallback_recovers_from_divergent_start() {
        // Doubling over 20 periods => 2^(1/20) - 1 = 3.53%
        let mut cfs = vec![dec!(-100)];
        cfs.extend(std::iter::repeat(Decimal::ZERO).take(19));
        cfs.push(dec!(200));

        // (1 - 0.98)^20 underflows, so Newton cannot even evaluate its first step.
        let mut config = IrrSolverConfig::default().with_method(IrrMethod::Newton);
        config.initial_guess = dec!(-0.98);
        config.lower_bound = dec!(-0.5);
        let err = calculate_irr_with(&cfs, &config).unwrap_err();
        assert!(matches!(
            err,
            DealAnalysisError::CalculationFailure(CalculationFailure::IrrDivergence {
                iteration: 0,
                ..
            })
        ));

        let config = config.with_method(IrrMethod::NewtonWithBisectionFallback);
        let irr = calculate_irr_with(&cfs, &config).unwrap();
        assert!((irr - dec!(3.53)).abs() <= dec!(0.01), "got {irr}");
    }

    #[test]
    fn test_bisection_without_bracket() {
        let config = IrrSolverConfig::default().with_method(IrrMethod::Bisection);
        let err = calculate_irr_with(&[dec!(-100), dec!(-10)], &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CalculationFailure);
    }

    #[test]
    fn test_invalid_solver_config() {
        let mut config = IrrSolverConfig::default();
        config.lower_bound = dec!(0.5);
        config.upper_bound = dec!(0.1);
        let err = calculate_irr_with(&[dec!(-100), dec!(110)], &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: IrrSolverConfig =
            serde_json::from_str(r#"{ "method": "bisection" }"#).unwrap();
        assert_eq!(config.method, IrrMethod::Bisection);
        assert_eq!(config.max_iterations, 1000);
        assert_eq!(config.tolerance, dec!(0.00001));
    }

    #[test]
    fn test_deterministic() {
        let cfs = [dec!(-500), dec!(120), dec!(150), dec!(180), dec!(400)];
        let trace = IrrSolverConfig::default().with_trace(true);
        assert_eq!(
            calculate_irr(&cfs).unwrap(),
            calculate_irr_with(&cfs, &trace).unwrap()
        );
    }
}
