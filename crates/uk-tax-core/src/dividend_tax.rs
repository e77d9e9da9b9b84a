use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::bands::{stack_on_bands, BandCalculation, TaxBand};
use crate::income_tax::{tapered_personal_allowance, ADDITIONAL_BAND, BASIC_BAND, HIGHER_BAND};
use crate::schedule::TaxYearSchedule;
use crate::types::{ensure_non_negative, ratio_or_zero, round_money, with_metadata, ComputationOutput, Money, Rate};
use crate::TaxResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DividendTaxInput {
    pub dividends: Money,
    #[serde(default)]
    pub other_income: Money,
    #[serde(default)]
    pub schedule: TaxYearSchedule,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DividendBandPortion {
    pub rate: Rate,
    pub amount: Money,
    pub tax: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DividendBreakdown {
    pub basic: DividendBandPortion,
    pub higher: DividendBandPortion,
    pub additional: DividendBandPortion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendTaxOutput {
    pub dividends: Money,
    pub other_income: Money,
    pub dividend_allowance_used: Money,
    pub taxable_dividends: Money,
    /// Taxable slice of `other_income` already sitting in the bands
    pub other_income_taxable: Money,
    pub breakdown_by_band: DividendBreakdown,
    pub dividend_tax: Money,
    pub effective_rate: Rate,
}

#[derive(Debug, Clone)]
pub(crate) struct DividendComputation {
    pub allowance_used: Money,
    pub other_income_taxable: Money,
    pub bands: BandCalculation,
}

impl DividendComputation {
    pub fn tax(&self) -> Money {
        self.bands.total_tax
    }
}

fn dividend_bands(schedule: &TaxYearSchedule) -> Vec<TaxBand> {
    let it = schedule.income_tax();
    let div = schedule.dividends();
    vec![
        TaxBand::new(
            BASIC_BAND,
            Some(it.basic_rate_threshold - it.personal_allowance),
            div.basic_rate,
        ),
        TaxBand::new(HIGHER_BAND, Some(it.additional_rate_threshold), div.higher_rate),
        TaxBand::new(ADDITIONAL_BAND, None, div.additional_rate),
    ]
}

pub(crate) fn dividend_tax_liability(
    dividends: Money,
    other_income: Money,
    schedule: &TaxYearSchedule,
) -> DividendComputation {
    let allowance_used = dividends.min(schedule.dividends().allowance);
    let taxable = dividends - allowance_used;
    let other_income_taxable =
        (other_income - tapered_personal_allowance(other_income, schedule)).max(Decimal::ZERO);
    let bands = stack_on_bands(other_income_taxable, taxable, &dividend_bands(schedule));
    DividendComputation {
        allowance_used,
        other_income_taxable,
        bands,
    }
}

/// Reads from an already rounded calculation so the portions add up.
fn portion(calc: &BandCalculation, label: &str, rate: Rate) -> DividendBandPortion {
    DividendBandPortion {
        rate,
        amount: calc.amount_in(label),
        tax: calc.tax_in(label),
    }
}

/// Dividend tax on `dividends`, stacked on top of `other_income`.
///
/// The dividend allowance comes off first. What remains is placed into
/// whatever basic and higher band capacity other income has left, and the
/// rest falls in the additional band.
pub fn compute_dividend_tax(
    dividends: Money,
    other_income: Money,
    schedule: &TaxYearSchedule,
) -> TaxResult<ComputationOutput<DividendTaxOutput>> {
    let start = Instant::now();

    ensure_non_negative("dividends", dividends)?;
    ensure_non_negative("other_income", other_income)?;

    let calc = dividend_tax_liability(dividends, other_income, schedule);
    let div = schedule.dividends();
    let rounded = calc.bands.rounded();
    let breakdown_by_band = DividendBreakdown {
        basic: portion(&rounded, BASIC_BAND, div.basic_rate),
        higher: portion(&rounded, HIGHER_BAND, div.higher_rate),
        additional: portion(&rounded, ADDITIONAL_BAND, div.additional_rate),
    };
    let output = DividendTaxOutput {
        dividends: round_money(dividends),
        other_income: round_money(other_income),
        dividend_allowance_used: round_money(calc.allowance_used),
        taxable_dividends: rounded.taxable_base,
        other_income_taxable: round_money(calc.other_income_taxable),
        breakdown_by_band,
        dividend_tax: rounded.total_tax,
        effective_rate: ratio_or_zero(calc.tax(), dividends),
    };
    tracing::debug!(
        dividends = %dividends,
        other_income = %other_income,
        dividend_tax = %output.dividend_tax,
        "computed dividend tax"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Dividend tax: allowance first, then remaining band capacity after other income",
        &serde_json::json!({
            "dividends": dividends.to_string(),
            "other_income": other_income.to_string(),
            "tax_year": schedule.label(),
            "dividend_allowance": div.allowance.to_string(),
        }),
        Vec::new(),
        elapsed,
        output,
    ))
}
