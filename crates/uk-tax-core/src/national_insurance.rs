use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::schedule::TaxYearSchedule;
use crate::types::{ensure_non_negative, round_money, with_metadata, ComputationOutput, Money, Rate};
use crate::TaxResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NiCategory {
    /// Class 1 primary, deducted from salary
    Employee,
    /// Class 1 secondary, paid by the company on top of salary
    Employer,
    /// Class 4, charged on self-employed profits
    SelfEmployed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NationalInsuranceInput {
    pub gross_income: Money,
    #[serde(default)]
    pub is_employer: bool,
    #[serde(default)]
    pub self_employed: bool,
    #[serde(default)]
    pub schedule: TaxYearSchedule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NationalInsuranceOutput {
    pub income: Money,
    pub category: NiCategory,
    pub threshold: Money,
    /// Earnings charged at the main rate
    pub main_band_earnings: Money,
    /// Earnings above the upper earnings limit (always zero for employers)
    pub upper_band_earnings: Money,
    pub contribution: Money,
}

#[derive(Debug, Clone)]
pub(crate) struct NiComputation {
    pub threshold: Money,
    pub main_band_earnings: Money,
    pub upper_band_earnings: Money,
    pub contribution: Money,
}

fn two_tier(income: Money, threshold: Money, uel: Money, main_rate: Rate, upper_rate: Rate) -> NiComputation {
    let main_band_earnings = (income.min(uel) - threshold).max(Decimal::ZERO);
    let upper_band_earnings = (income - uel).max(Decimal::ZERO);
    NiComputation {
        threshold,
        main_band_earnings,
        upper_band_earnings,
        contribution: main_band_earnings * main_rate + upper_band_earnings * upper_rate,
    }
}

pub(crate) fn ni_liability(income: Money, category: NiCategory, schedule: &TaxYearSchedule) -> NiComputation {
    let ni = schedule.national_insurance();
    match category {
        NiCategory::Employee => two_tier(
            income,
            ni.primary_threshold,
            ni.upper_earnings_limit,
            ni.employee_main_rate,
            ni.employee_upper_rate,
        ),
        NiCategory::SelfEmployed => two_tier(
            income,
            ni.primary_threshold,
            ni.upper_earnings_limit,
            ni.class4_main_rate,
            ni.class4_upper_rate,
        ),
        NiCategory::Employer => {
            let liable = (income - ni.secondary_threshold).max(Decimal::ZERO);
            NiComputation {
                threshold: ni.secondary_threshold,
                main_band_earnings: liable,
                upper_band_earnings: Decimal::ZERO,
                contribution: liable * ni.employer_rate,
            }
        }
    }
}

/// Class 1 National Insurance on a salary, for the employee or the employer.
pub fn compute_national_insurance(
    gross_income: Money,
    schedule: &TaxYearSchedule,
    is_employer: bool,
) -> TaxResult<ComputationOutput<NationalInsuranceOutput>> {
    let category = if is_employer {
        NiCategory::Employer
    } else {
        NiCategory::Employee
    };
    compute_for_category(gross_income, schedule, category)
}

/// Class 4 National Insurance on self-employed trading profit.
pub fn compute_self_employed_ni(
    profit: Money,
    schedule: &TaxYearSchedule,
) -> TaxResult<ComputationOutput<NationalInsuranceOutput>> {
    compute_for_category(profit, schedule, NiCategory::SelfEmployed)
}

fn compute_for_category(
    income: Money,
    schedule: &TaxYearSchedule,
    category: NiCategory,
) -> TaxResult<ComputationOutput<NationalInsuranceOutput>> {
    let start = Instant::now();
    ensure_non_negative("gross_income", income)?;

    let calc = ni_liability(income, category, schedule);
    let output = NationalInsuranceOutput {
        income: round_money(income),
        category,
        threshold: calc.threshold,
        main_band_earnings: round_money(calc.main_band_earnings),
        upper_band_earnings: round_money(calc.upper_band_earnings),
        contribution: round_money(calc.contribution),
    };
    tracing::debug!(?category, contribution = %output.contribution, "computed national insurance");

    let ni = schedule.national_insurance();
    let methodology = match category {
        NiCategory::Employee => "Class 1 primary NI: main rate to the UEL, reduced rate above",
        NiCategory::Employer => "Class 1 secondary NI: flat rate above the secondary threshold",
        NiCategory::SelfEmployed => "Class 4 NI: main rate to the UEL, reduced rate above",
    };
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        methodology,
        &serde_json::json!({
            "income": income.to_string(),
            "category": category,
            "tax_year": schedule.label(),
            "primary_threshold": ni.primary_threshold.to_string(),
            "upper_earnings_limit": ni.upper_earnings_limit.to_string(),
            "secondary_threshold": ni.secondary_threshold.to_string(),
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
    fn test_employee_below_threshold_is_zero() {
        let s = TaxYearSchedule::uk_2025_26();
        let out = compute_national_insurance(dec!(12_000), &s, false).unwrap().result;
        assert_eq!(out.contribution, Decimal::ZERO);
        assert_eq!(out.main_band_earnings, Decimal::ZERO);
    }

    #[test]
    fn test_employee_main_band() {
        // (30,000 - 12,570) * 8% = 1,394.40
        let s = TaxYearSchedule::uk_2025_26();
        let out = compute_national_insurance(dec!(30_000), &s, false).unwrap().result;
        assert_eq!(out.contribution, dec!(1_394.40));
        assert_eq!(out.category, NiCategory::Employee);
    }

    #[test]
    fn test_employee_above_uel() {
        // 37,700 * 8% = 3,016; 29,730 * 2% = 594.60
        let s = TaxYearSchedule::uk_2025_26();
        let out = compute_national_insurance(dec!(80_000), &s, false).unwrap().result;
        assert_eq!(out.upper_band_earnings, dec!(29_730));
        assert_eq!(out.contribution, dec!(3_610.60));
    }

    #[test]
    fn test_employer_2024_25() {
        // (30,000 - 9,100) * 13.8% = 2,884.20
        let s = TaxYearSchedule::uk_2024_25();
        let out = compute_national_insurance(dec!(30_000), &s, true).unwrap().result;
        assert_eq!(out.contribution, dec!(2_884.20));
        assert_eq!(out.upper_band_earnings, Decimal::ZERO);
    }

    #[test]
    fn test_employer_2025_26() {
        // (12,570 - 5,000) * 15% = 1,135.50
        let s = TaxYearSchedule::uk_2025_26();
        let out = compute_national_insurance(dec!(12_570), &s, true).unwrap().result;
        assert_eq!(out.contribution, dec!(1_135.50));
    }

    #[test]
    fn test_class4() {
        // (40,000 - 12,570) * 6% = 1,645.80
        let s = TaxYearSchedule::uk_2025_26();
        let out = compute_self_employed_ni(dec!(40_000), &s).unwrap().result;
        assert_eq!(out.contribution, dec!(1_645.80));
        assert_eq!(out.category, NiCategory::SelfEmployed);
    }

    #[test]
    fn test_negative_rejected() {
        let s = TaxYearSchedule::uk_2025_26();
        assert!(compute_national_insurance(dec!(-5), &s, true).is_err());
    }
}
