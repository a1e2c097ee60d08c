use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::DealAnalysisError;
use crate::types::*;
use crate::valuation::calculate_valuation;
use crate::DealAnalysisResult;

fn default_shifts() -> Vec<Percent> {
    vec![dec!(-20), dec!(-10), dec!(0), dec!(10), dec!(20)]
}

/// Input for the multiple x EBITDA valuation grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityInput {
    /// EBITDA the base valuation is struck on
    pub base_ebitda: Money,
    /// Multiple the base valuation is struck on
    pub base_multiple: Multiple,
    /// Percentage shifts applied to the multiple (rows)
    #[serde(default = "default_shifts")]
    pub multiple_shifts_pct: Vec<Percent>,
    /// Percentage shifts applied to EBITDA (columns)
    #[serde(default = "default_shifts")]
    pub ebitda_shifts_pct: Vec<Percent>,
}

/// Output of the valuation sensitivity grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub base_valuation: Money,
    pub multiple_shifts_pct: Vec<Percent>,
    pub ebitda_shifts_pct: Vec<Percent>,
    /// valuations[i][j] = EV with multiple_shifts_pct[i] and ebitda_shifts_pct[j] applied
    pub valuations: Vec<Vec<Money>>,
    /// Percentage change of each cell against the base valuation, 1 dp
    pub change_pct: Vec<Vec<Percent>>,
    /// Position of the unshifted case, when both axes contain a zero shift
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_case_position: Option<(usize, usize)>,
}

fn apply_shift(value: Decimal, shift_pct: Percent, field: &str) -> DealAnalysisResult<Decimal> {
    if shift_pct <= dec!(-100) {
        return Err(DealAnalysisError::invalid_input(
            field,
            format!("shift of {shift_pct}% would make the value non-positive"),
        ));
    }
    value
        .checked_mul(Decimal::ONE + shift_pct / dec!(100))
        .ok_or_else(|| DealAnalysisError::non_finite(format!("{field} of {shift_pct}%")))
}

/// Sweep EBITDA and multiple shifts and report how enterprise value moves.
pub fn valuation_sensitivity(
    input: &SensitivityInput,
) -> DealAnalysisResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();

    if input.multiple_shifts_pct.is_empty() {
        return Err(DealAnalysisError::invalid_input(
            "multiple_shifts_pct",
            "cannot be empty",
        ));
    }
    if input.ebitda_shifts_pct.is_empty() {
        return Err(DealAnalysisError::invalid_input(
            "ebitda_shifts_pct",
            "cannot be empty",
        ));
    }

    let base_valuation = calculate_valuation(input.base_ebitda, input.base_multiple)?;

    let mut valuations = Vec::with_capacity(input.multiple_shifts_pct.len());
    let mut change_pct = Vec::with_capacity(input.multiple_shifts_pct.len());

    for m_shift in &input.multiple_shifts_pct {
        let multiple = apply_shift(input.base_multiple, *m_shift, "multiple_shifts_pct")?;
        let mut value_row = Vec::with_capacity(input.ebitda_shifts_pct.len());
        let mut change_row = Vec::with_capacity(input.ebitda_shifts_pct.len());

        for e_shift in &input.ebitda_shifts_pct {
            let ebitda = apply_shift(input.base_ebitda, *e_shift, "ebitda_shifts_pct")?;
            let value = calculate_valuation(ebitda, multiple)?;
            let change = (value - base_valuation)
                .checked_div(base_valuation)
                .and_then(|ratio| ratio.checked_mul(dec!(100)))
                .map(round1)
                .ok_or_else(|| DealAnalysisError::non_finite("valuation change"))?;
            change_row.push(change);
            value_row.push(value);
        }

        valuations.push(value_row);
        change_pct.push(change_row);
    }

    let zero_row = input.multiple_shifts_pct.iter().position(|s| s.is_zero());
    let zero_col = input.ebitda_shifts_pct.iter().position(|s| s.is_zero());

    let output = SensitivityOutput {
        base_valuation,
        multiple_shifts_pct: input.multiple_shifts_pct.clone(),
        ebitda_shifts_pct: input.ebitda_shifts_pct.clone(),
        valuations,
        change_pct,
        base_case_position: zero_row.zip(zero_col),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Valuation sensitivity: EV/EBITDA multiple x EBITDA",
        &serde_json::json!({
            "base_ebitda": input.base_ebitda.to_string(),
            "base_multiple": input.base_multiple.to_string(),
        }),
        Vec::new(),
        elapsed,
        output,
    ))
}
