use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::bands::{self, apply_bands, BandCalculation, BandSlice, TaxBand};
use crate::national_insurance::{ni_liability, NiCategory};
use crate::schedule::TaxYearSchedule;
use crate::types::{ensure_non_negative, ratio_or_zero, round_money, with_metadata, ComputationOutput, Money, Rate};
use crate::TaxResult;

pub const BASIC_BAND: &str = "basic";
pub const HIGHER_BAND: &str = "higher";
pub const ADDITIONAL_BAND: &str = "additional";

/// Request shape used by the CLI and bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeTaxInput {
    pub gross_income: Money,
    #[serde(default)]
    pub schedule: TaxYearSchedule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeTaxOutput {
    pub gross_income: Money,
    /// Personal allowance after tapering
    pub personal_allowance: Money,
    /// Portion of the allowance actually set against income
    pub allowance_used: Money,
    pub taxable_income: Money,
    pub income_tax: Money,
    pub breakdown: Vec<BandSlice>,
    /// Band rate on the next pound of income
    pub marginal_rate: Rate,
    pub effective_rate: Rate,
}

/// Unrounded result shared with the other engines.
#[derive(Debug, Clone)]
pub(crate) struct IncomeTaxComputation {
    pub personal_allowance: Money,
    pub bands: BandCalculation,
}

impl IncomeTaxComputation {
    pub fn tax(&self) -> Money {
        self.bands.total_tax
    }

    pub fn taxable_income(&self) -> Money {
        self.bands.taxable_base
    }
}

/// Personal allowance after the £1-per-£2 taper above the taper threshold.
pub(crate) fn tapered_personal_allowance(income: Money, schedule: &TaxYearSchedule) -> Money {
    let it = schedule.income_tax();
    if income <= it.taper_threshold {
        return it.personal_allowance;
    }
    let reduction = (income - it.taper_threshold) / dec!(2);
    (it.personal_allowance - reduction).max(Decimal::ZERO)
}

/// Income tax band table on the taxable scale.
///
/// The basic band has a fixed width (`basic_rate_threshold −
/// personal_allowance`), so a tapered allowance does not widen it. The
/// additional rate starts at `additional_rate_threshold` of taxable income,
/// which is where the allowance has fully tapered away.
pub(crate) fn income_tax_bands(schedule: &TaxYearSchedule) -> Vec<TaxBand> {
    let it = schedule.income_tax();
    vec![
        TaxBand::new(
            BASIC_BAND,
            Some(it.basic_rate_threshold - it.personal_allowance),
            it.basic_rate,
        ),
        TaxBand::new(HIGHER_BAND, Some(it.additional_rate_threshold), it.higher_rate),
        TaxBand::new(ADDITIONAL_BAND, None, it.additional_rate),
    ]
}

pub(crate) fn income_tax_liability(gross_income: Money, schedule: &TaxYearSchedule) -> IncomeTaxComputation {
    let personal_allowance = tapered_personal_allowance(gross_income, schedule);
    let bands = apply_bands(gross_income, personal_allowance, &income_tax_bands(schedule));
    IncomeTaxComputation {
        personal_allowance,
        bands,
    }
}

/// Income-tax marginal band rate for someone with `gross_income`.
pub(crate) fn marginal_income_tax_rate(gross_income: Money, schedule: &TaxYearSchedule) -> Rate {
    let taxable = (gross_income - tapered_personal_allowance(gross_income, schedule)).max(Decimal::ZERO);
    bands::marginal_rate(taxable, &income_tax_bands(schedule))
}

/// Compute income tax on employment or trading income.
///
/// Tapers the personal allowance, then applies the basic, higher and
/// additional bands to what remains.
pub fn compute_income_tax(
    gross_income: Money,
    schedule: &TaxYearSchedule,
) -> TaxResult<ComputationOutput<IncomeTaxOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    ensure_non_negative("gross_income", gross_income)?;

    let computation = income_tax_liability(gross_income, schedule);
    let it = schedule.income_tax();
    if computation.personal_allowance < it.personal_allowance {
        warnings.push(format!(
            "Personal allowance tapered to {} (income above {}).",
            round_money(computation.personal_allowance),
            it.taper_threshold
        ));
    }

    let rounded = computation.bands.rounded();
    let output = IncomeTaxOutput {
        gross_income: round_money(gross_income),
        personal_allowance: round_money(computation.personal_allowance),
        allowance_used: round_money(computation.personal_allowance.min(gross_income)),
        taxable_income: rounded.taxable_base,
        income_tax: rounded.total_tax,
        breakdown: rounded.breakdown,
        marginal_rate: marginal_income_tax_rate(gross_income, schedule),
        effective_rate: ratio_or_zero(computation.tax(), gross_income),
    };
    tracing::debug!(
        gross_income = %gross_income,
        income_tax = %output.income_tax,
        "computed income tax"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "UK income tax: tapered personal allowance then basic/higher/additional bands",
        &serde_json::json!({
            "gross_income": gross_income.to_string(),
            "tax_year": schedule.label(),
            "personal_allowance": it.personal_allowance.to_string(),
            "taper_threshold": it.taper_threshold.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// PAYE
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayeInput {
    pub gross_salary: Money,
    #[serde(default)]
    pub pension_deduction: Money,
    #[serde(default)]
    pub schedule: TaxYearSchedule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayeOutput {
    pub gross_salary: Money,
    /// Pension deduction after capping at the annual allowance and at salary
    pub pension_deduction: Money,
    pub taxable_pay: Money,
    pub personal_allowance: Money,
    pub income_tax: Money,
    pub employee_ni: Money,
    pub total_deductions: Money,
    pub net_pay: Money,
}

/// Payroll view of a salary: income tax after a net-pay pension deduction,
/// Class 1 employee NI on the full salary, and take-home pay.
pub fn compute_paye(
    gross_salary: Money,
    pension_deduction: Money,
    schedule: &TaxYearSchedule,
) -> TaxResult<ComputationOutput<PayeOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    ensure_non_negative("gross_salary", gross_salary)?;
    ensure_non_negative("pension_deduction", pension_deduction)?;

    let annual_allowance = schedule.allowances().pension_annual_allowance;
    let deduction = pension_deduction.min(annual_allowance).min(gross_salary);
    if deduction < pension_deduction {
        let msg = format!(
            "Pension deduction {pension_deduction} capped at {} (annual allowance {annual_allowance}).",
            round_money(deduction)
        );
        tracing::warn!("{msg}");
        warnings.push(msg);
    }

    let taxable_pay = gross_salary - deduction;
    let it = income_tax_liability(taxable_pay, schedule);
    let ni = ni_liability(gross_salary, NiCategory::Employee, schedule);

    let income_tax = round_money(it.tax());
    let employee_ni = round_money(ni.contribution);
    let deduction = round_money(deduction);
    let total_deductions = income_tax + employee_ni + deduction;
    let output = PayeOutput {
        gross_salary: round_money(gross_salary),
        pension_deduction: deduction,
        taxable_pay: round_money(taxable_pay),
        personal_allowance: round_money(it.personal_allowance),
        income_tax,
        employee_ni,
        total_deductions,
        net_pay: round_money(gross_salary) - total_deductions,
    };
    tracing::debug!(gross_salary = %gross_salary, net_pay = %output.net_pay, "computed PAYE");

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "PAYE: income tax on salary less pension deduction, Class 1 NI on gross salary",
        &serde_json::json!({
            "gross_salary": gross_salary.to_string(),
            "pension_deduction": pension_deduction.to_string(),
            "tax_year": schedule.label(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> TaxYearSchedule {
        TaxYearSchedule::uk_2025_26()
    }

    #[test]
    fn test_zero_income() {
        let out = compute_income_tax(Decimal::ZERO, &schedule()).unwrap().result;
        assert_eq!(out.income_tax, Decimal::ZERO);
        assert_eq!(out.effective_rate, Decimal::ZERO);
        assert!(out.breakdown.is_empty());
    }

    #[test]
    fn test_at_personal_allowance_is_zero() {
        let out = compute_income_tax(dec!(12_570), &schedule()).unwrap().result;
        assert_eq!(out.income_tax, Decimal::ZERO);
    }

    #[test]
    fn test_one_pound_over_allowance() {
        let out = compute_income_tax(dec!(12_571), &schedule()).unwrap().result;
        assert_eq!(out.income_tax, dec!(0.20));
        assert_eq!(out.marginal_rate, dec!(0.20));
    }

    #[test]
    fn test_basic_rate_taxpayer() {
        // (30,000 - 12,570) * 20% = 3,486
        let out = compute_income_tax(dec!(30_000), &schedule()).unwrap().result;
        assert_eq!(out.taxable_income, dec!(17_430));
        assert_eq!(out.income_tax, dec!(3_486));
    }

    #[test]
    fn test_higher_rate_taxpayer() {
        // basic 37,700 @ 20% = 7,540; higher (62,430 - 37,700) @ 40% = 9,892
        let out = compute_income_tax(dec!(75_000), &schedule()).unwrap().result;
        assert_eq!(out.income_tax, dec!(17_432));
        assert_eq!(out.marginal_rate, dec!(0.40));
    }

    #[test]
    fn test_taper_at_110k() {
        // allowance = 12,570 - 5,000 = 7,570; taxable 102,430
        // 7,540 + (102,430 - 37,700) * 40% = 7,540 + 25,892 = 33,432
        let out = compute_income_tax(dec!(110_000), &schedule()).unwrap();
        assert_eq!(out.result.personal_allowance, dec!(7_570));
        assert_eq!(out.result.income_tax, dec!(33_432));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_allowance_fully_tapered_at_125140() {
        let out = compute_income_tax(dec!(125_140), &schedule()).unwrap().result;
        assert_eq!(out.personal_allowance, Decimal::ZERO);
        // 7,540 + 87,440 * 40% = 42,516
        assert_eq!(out.income_tax, dec!(42_516));
        assert!(out.breakdown.iter().all(|s| s.label != ADDITIONAL_BAND));
    }

    #[test]
    fn test_additional_rate_taxpayer() {
        // 42,516 + (180,000 - 125,140) * 45% = 42,516 + 24,687 = 67,203
        let out = compute_income_tax(dec!(180_000), &schedule()).unwrap().result;
        assert_eq!(out.income_tax, dec!(67_203));
        assert_eq!(out.marginal_rate, dec!(0.45));
    }

    #[test]
    fn test_negative_income_rejected() {
        let err = compute_income_tax(dec!(-0.01), &schedule()).unwrap_err();
        assert_eq!(err.field(), Some("gross_income"));
    }

    #[test]
    fn test_allowance_used_below_allowance() {
        let out = compute_income_tax(dec!(8_000), &schedule()).unwrap().result;
        assert_eq!(out.personal_allowance, dec!(12_570));
        assert_eq!(out.allowance_used, dec!(8_000));
    }

    #[test]
    fn test_paye_with_pension_deduction() {
        // taxable 35,000 -> (35,000 - 12,570) * 20% = 4,486
        // NI on 40,000: 27,430 * 8% = 2,194.40
        let out = compute_paye(dec!(40_000), dec!(5_000), &schedule()).unwrap().result;
        assert_eq!(out.taxable_pay, dec!(35_000));
        assert_eq!(out.income_tax, dec!(4_486));
        assert_eq!(out.employee_ni, dec!(2_194.40));
        assert_eq!(out.net_pay, dec!(28_319.60));
    }

    #[test]
    fn test_paye_pension_capped_at_salary() {
        let out = compute_paye(dec!(10_000), dec!(15_000), &schedule()).unwrap();
        assert_eq!(out.result.pension_deduction, dec!(10_000));
        assert_eq!(out.result.net_pay, Decimal::ZERO);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_paye_negative_pension_rejected() {
        let err = compute_paye(dec!(10_000), dec!(-1), &schedule()).unwrap_err();
        assert_eq!(err.field(), Some("pension_deduction"));
    }
}
