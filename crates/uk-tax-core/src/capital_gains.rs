use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::bands::{stack_on_bands, TaxBand};
use crate::income_tax::{tapered_personal_allowance, BASIC_BAND, HIGHER_BAND};
use crate::schedule::TaxYearSchedule;
use crate::types::{ensure_non_negative, ratio_or_zero, round_money, with_metadata, ComputationOutput, Money, Rate};
use crate::TaxResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalGainsInput {
    pub gains: Money,
    #[serde(default)]
    pub other_income: Money,
    #[serde(default)]
    pub is_residential_property: bool,
    #[serde(default)]
    pub schedule: TaxYearSchedule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalGainsOutput {
    pub gains: Money,
    pub annual_exempt_amount_used: Money,
    pub taxable_gains: Money,
    pub basic_rate: Rate,
    pub higher_rate: Rate,
    pub gains_at_basic_rate: Money,
    pub gains_at_higher_rate: Money,
    pub tax: Money,
    pub effective_rate: Rate,
}

/// Capital gains tax. Gains use any basic band left after other income,
/// then the higher rate. Residential property has its own pair of rates.
pub fn compute_capital_gains_tax(
    gains: Money,
    other_income: Money,
    is_residential_property: bool,
    schedule: &TaxYearSchedule,
) -> TaxResult<ComputationOutput<CapitalGainsOutput>> {
    let start = Instant::now();

    ensure_non_negative("gains", gains)?;
    ensure_non_negative("other_income", other_income)?;

    let cg = schedule.capital_gains();
    let it = schedule.income_tax();
    let (basic_rate, higher_rate) = if is_residential_property {
        (cg.residential_basic_rate, cg.residential_higher_rate)
    } else {
        (cg.basic_rate, cg.higher_rate)
    };
    let bands = [
        TaxBand::new(
            BASIC_BAND,
            Some(it.basic_rate_threshold - it.personal_allowance),
            basic_rate,
        ),
        TaxBand::new(HIGHER_BAND, None, higher_rate),
    ];

    let exempt_used = gains.min(cg.annual_exempt_amount);
    let taxable = gains - exempt_used;
    let other_taxable = (other_income - tapered_personal_allowance(other_income, schedule)).max(Decimal::ZERO);
    let calc = stack_on_bands(other_taxable, taxable, &bands);
    let tax = calc.total_tax;
    let rounded = calc.rounded();

    let output = CapitalGainsOutput {
        gains: round_money(gains),
        annual_exempt_amount_used: round_money(exempt_used),
        taxable_gains: rounded.taxable_base,
        basic_rate,
        higher_rate,
        gains_at_basic_rate: rounded.amount_in(BASIC_BAND),
        gains_at_higher_rate: rounded.amount_in(HIGHER_BAND),
        tax: rounded.total_tax,
        effective_rate: ratio_or_zero(tax, gains),
    };
    tracing::debug!(gains = %gains, tax = %output.tax, "computed capital gains tax");

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Capital gains tax: annual exempt amount, then unused basic band, then higher rate",
        &serde_json::json!({
            "gains": gains.to_string(),
            "other_income": other_income.to_string(),
            "is_residential_property": is_residential_property,
            "tax_year": schedule.label(),
        }),
        Vec::new(),
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_within_exempt_amount() {
        let s = TaxYearSchedule::uk_2025_26();
        let out = compute_capital_gains_tax(dec!(3_000), dec!(50_000), false, &s).unwrap().result;
        assert_eq!(out.tax, Decimal::ZERO);
    }

    #[test]
    fn test_higher_rate_taxpayer_shares() {
        // 20,000 - 3,000 = 17,000 all at 24%
        let s = TaxYearSchedule::uk_2025_26();
        let out = compute_capital_gains_tax(dec!(20_000), dec!(60_000), false, &s).unwrap().result;
        assert_eq!(out.gains_at_higher_rate, dec!(17_000));
        assert_eq!(out.tax, dec!(4_080));
    }

    #[test]
    fn test_split_across_basic_band_2024_25() {
        // other 40,000 -> taxable 27,430; basic left 10,270
        // shares: 10,270 * 10% + 6,730 * 20% = 1,027 + 1,346 = 2,373
        let s = TaxYearSchedule::uk_2024_25();
        let out = compute_capital_gains_tax(dec!(20_000), dec!(40_000), false, &s).unwrap().result;
        assert_eq!(out.gains_at_basic_rate, dec!(10_270));
        assert_eq!(out.tax, dec!(2_373));
    }

    #[test]
    fn test_residential_rates_2024_25() {
        // property: 10,270 * 18% + 6,730 * 24% = 1,848.60 + 1,615.20
        let s = TaxYearSchedule::uk_2024_25();
        let out = compute_capital_gains_tax(dec!(20_000), dec!(40_000), true, &s).unwrap().result;
        assert_eq!(out.tax, dec!(3_463.80));
    }

    #[test]
    fn test_basic_and_higher_slices_sum_to_taxable_gains() {
        // other 100,000.01 leaves a half-penny footprint on the band scale
        let s = TaxYearSchedule::uk_2025_26();
        let out = compute_capital_gains_tax(dec!(10_000), dec!(100_000.01), false, &s).unwrap().result;
        assert_eq!(out.gains_at_basic_rate, Decimal::ZERO);
        assert_eq!(out.gains_at_basic_rate + out.gains_at_higher_rate, out.taxable_gains);
        assert_eq!(out.tax, dec!(1_680));
    }

    #[test]
    fn test_negative_gain_rejected() {
        let s = TaxYearSchedule::uk_2025_26();
        assert!(compute_capital_gains_tax(dec!(-1), Decimal::ZERO, false, &s).is_err());
    }
}
