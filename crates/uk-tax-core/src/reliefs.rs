//! Relief calculators: the flat trading and property allowances, pension
//! tax relief, the SME R&D enhanced deduction and the Annual Investment
//! Allowance.
//!
//! Each calculator scores a relief in isolation. Choosing between a flat
//! allowance and itemised expenses is left to the caller (see the optimizer).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::corporation_tax;
use crate::income_tax::marginal_income_tax_rate;
use crate::schedule::TaxYearSchedule;
use crate::types::{ensure_non_negative, round_money, with_metadata, ComputationOutput, Money, Rate};
use crate::TaxResult;

// ---------------------------------------------------------------------------
// Trading / property allowance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowanceKind {
    Trading,
    Property,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowanceInput {
    pub income: Money,
    #[serde(default)]
    pub expenses: Money,
    #[serde(default)]
    pub schedule: TaxYearSchedule,
}

/// Both methods scored side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowanceComparison {
    pub kind: AllowanceKind,
    pub income: Money,
    pub expenses: Money,
    pub allowance_limit: Money,
    pub allowance_used: Money,
    pub taxable_with_allowance: Money,
    pub taxable_with_expenses: Money,
}

pub(crate) fn score_allowance(
    kind: AllowanceKind,
    income: Money,
    expenses: Money,
    schedule: &TaxYearSchedule,
) -> AllowanceComparison {
    let allowance_limit = match kind {
        AllowanceKind::Trading => schedule.allowances().trading_allowance,
        AllowanceKind::Property => schedule.allowances().property_allowance,
    };
    let allowance_used = income.min(allowance_limit);
    AllowanceComparison {
        kind,
        income,
        expenses,
        allowance_limit,
        allowance_used,
        taxable_with_allowance: income - allowance_used,
        taxable_with_expenses: (income - expenses).max(Decimal::ZERO),
    }
}

fn compute_allowance(
    kind: AllowanceKind,
    income: Money,
    expenses: Money,
    schedule: &TaxYearSchedule,
) -> TaxResult<ComputationOutput<AllowanceComparison>> {
    let start = Instant::now();
    ensure_non_negative("income", income)?;
    ensure_non_negative("expenses", expenses)?;

    let scored = score_allowance(kind, income, expenses, schedule);
    let output = AllowanceComparison {
        income: round_money(scored.income),
        expenses: round_money(scored.expenses),
        allowance_used: round_money(scored.allowance_used),
        taxable_with_allowance: round_money(scored.taxable_with_allowance),
        taxable_with_expenses: round_money(scored.taxable_with_expenses),
        ..scored
    };
    tracing::debug!(?kind, income = %income, "scored allowance");

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Flat allowance (min of income and limit) scored against itemised expenses",
        &serde_json::json!({
            "kind": kind,
            "income": income.to_string(),
            "expenses": expenses.to_string(),
            "tax_year": schedule.label(),
        }),
        Vec::new(),
        elapsed,
        output,
    ))
}

pub fn compute_trading_allowance(
    income: Money,
    expenses: Money,
    schedule: &TaxYearSchedule,
) -> TaxResult<ComputationOutput<AllowanceComparison>> {
    compute_allowance(AllowanceKind::Trading, income, expenses, schedule)
}

pub fn compute_property_allowance(
    income: Money,
    expenses: Money,
    schedule: &TaxYearSchedule,
) -> TaxResult<ComputationOutput<AllowanceComparison>> {
    compute_allowance(AllowanceKind::Property, income, expenses, schedule)
}

// ---------------------------------------------------------------------------
// Pension relief
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PensionReliefInput {
    pub contribution: Money,
    pub income: Money,
    #[serde(default)]
    pub schedule: TaxYearSchedule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PensionReliefOutput {
    pub contribution: Money,
    pub annual_allowance: Money,
    pub eligible_contribution: Money,
    pub excess_over_allowance: Money,
    pub marginal_rate: Rate,
    pub relief: Money,
}

/// Relief on a pension contribution at the contributor's marginal income tax
/// rate. The rate comes from the income tax band table.
pub fn compute_pension_relief(
    contribution: Money,
    income: Money,
    schedule: &TaxYearSchedule,
) -> TaxResult<ComputationOutput<PensionReliefOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    ensure_non_negative("contribution", contribution)?;
    ensure_non_negative("income", income)?;

    let annual_allowance = schedule.allowances().pension_annual_allowance;
    let eligible = contribution.min(annual_allowance);
    let excess = contribution - eligible;
    if excess > Decimal::ZERO {
        let msg = format!(
            "Contribution exceeds the annual allowance of {annual_allowance} by {}; the excess gets no relief and may face an annual allowance charge.",
            round_money(excess)
        );
        tracing::warn!("{msg}");
        warnings.push(msg);
    }
    let marginal_rate = marginal_income_tax_rate(income, schedule);

    let output = PensionReliefOutput {
        contribution: round_money(contribution),
        annual_allowance,
        eligible_contribution: round_money(eligible),
        excess_over_allowance: round_money(excess),
        marginal_rate,
        relief: round_money(eligible * marginal_rate),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Pension relief: contribution capped at the annual allowance, relieved at the marginal band rate",
        &serde_json::json!({
            "contribution": contribution.to_string(),
            "income": income.to_string(),
            "tax_year": schedule.label(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// R&D relief
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RdReliefInput {
    pub expenditure: Money,
    pub company_profit: Money,
    #[serde(default)]
    pub schedule: TaxYearSchedule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RdReliefOutput {
    pub expenditure: Money,
    pub enhancement_rate: Rate,
    pub enhanced_deduction: Money,
    /// Deduction on top of the spend itself
    pub additional_deduction: Money,
    pub applicable_rate: Rate,
    pub relief: Money,
}

pub(crate) fn rd_additional_deduction(expenditure: Money, schedule: &TaxYearSchedule) -> Money {
    expenditure * schedule.allowances().rd_enhancement_rate
}

pub fn compute_rd_relief(
    expenditure: Money,
    company_profit: Money,
    schedule: &TaxYearSchedule,
) -> TaxResult<ComputationOutput<RdReliefOutput>> {
    let start = Instant::now();
    ensure_non_negative("expenditure", expenditure)?;
    ensure_non_negative("company_profit", company_profit)?;

    let enhancement_rate = schedule.allowances().rd_enhancement_rate;
    let enhanced = expenditure * (Decimal::ONE + enhancement_rate);
    let applicable_rate = corporation_tax::marginal_rate(company_profit, schedule);

    let output = RdReliefOutput {
        expenditure: round_money(expenditure),
        enhancement_rate,
        enhanced_deduction: round_money(enhanced),
        additional_deduction: round_money(rd_additional_deduction(expenditure, schedule)),
        applicable_rate,
        relief: round_money(enhanced * applicable_rate),
    };
    tracing::debug!(expenditure = %expenditure, relief = %output.relief, "computed R&D relief");

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "SME R&D relief: enhanced deduction at the company's marginal corporation tax rate",
        &serde_json::json!({
            "expenditure": expenditure.to_string(),
            "company_profit": company_profit.to_string(),
            "tax_year": schedule.label(),
        }),
        Vec::new(),
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Capital allowances
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalAllowancesInput {
    pub spend: Money,
    pub company_profit: Money,
    #[serde(default)]
    pub schedule: TaxYearSchedule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalAllowancesOutput {
    pub spend: Money,
    pub aia_limit: Money,
    pub aia_claimed: Money,
    /// Spend above the AIA limit, left for writing-down allowances
    pub excess_spend: Money,
    pub applicable_rate: Rate,
    pub relief: Money,
}

pub(crate) fn aia_claim(spend: Money, schedule: &TaxYearSchedule) -> Money {
    spend.min(schedule.allowances().annual_investment_allowance)
}

pub fn compute_capital_allowances(
    spend: Money,
    company_profit: Money,
    schedule: &TaxYearSchedule,
) -> TaxResult<ComputationOutput<CapitalAllowancesOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    ensure_non_negative("spend", spend)?;
    ensure_non_negative("company_profit", company_profit)?;

    let claimed = aia_claim(spend, schedule);
    let excess = spend - claimed;
    if excess > Decimal::ZERO {
        warnings.push(format!(
            "{} of spend exceeds the Annual Investment Allowance and falls to writing-down allowances.",
            round_money(excess)
        ));
    }
    let applicable_rate = corporation_tax::marginal_rate(company_profit, schedule);

    let output = CapitalAllowancesOutput {
        spend: round_money(spend),
        aia_limit: schedule.allowances().annual_investment_allowance,
        aia_claimed: round_money(claimed),
        excess_spend: round_money(excess),
        applicable_rate,
        relief: round_money(claimed * applicable_rate),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Annual Investment Allowance: 100% first-year relief up to the limit",
        &serde_json::json!({
            "spend": spend.to_string(),
            "company_profit": company_profit.to_string(),
            "tax_year": schedule.label(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Finance cost restriction
// ---------------------------------------------------------------------------

/// Basic-rate tax reduction for residential mortgage interest. Callers cap
/// it at the income tax otherwise due.
pub fn finance_cost_credit(mortgage_interest: Money, schedule: &TaxYearSchedule) -> Money {
    mortgage_interest.max(Decimal::ZERO) * schedule.income_tax().basic_rate
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn schedule() -> TaxYearSchedule {
        TaxYearSchedule::uk_2025_26()
    }

    #[test]
    fn test_trading_allowance_below_limit() {
        let out = compute_trading_allowance(dec!(800), Decimal::ZERO, &schedule()).unwrap().result;
        assert_eq!(out.allowance_used, dec!(800));
        assert_eq!(out.taxable_with_allowance, Decimal::ZERO);
        assert_eq!(out.taxable_with_expenses, dec!(800));
    }

    #[test]
    fn test_property_allowance_above_limit() {
        let out = compute_property_allowance(dec!(2_000), dec!(300), &schedule()).unwrap().result;
        assert_eq!(out.kind, AllowanceKind::Property);
        assert_eq!(out.taxable_with_allowance, dec!(1_000));
        assert_eq!(out.taxable_with_expenses, dec!(1_700));
    }

    #[test]
    fn test_expenses_above_income_floor_at_zero() {
        let out = compute_trading_allowance(dec!(500), dec!(900), &schedule()).unwrap().result;
        assert_eq!(out.taxable_with_expenses, Decimal::ZERO);
    }

    #[test]
    fn test_pension_relief_higher_rate() {
        let out = compute_pension_relief(dec!(10_000), dec!(80_000), &schedule()).unwrap();
        assert_eq!(out.result.marginal_rate, dec!(0.40));
        assert_eq!(out.result.relief, dec!(4_000));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_pension_relief_inside_allowance_is_zero() {
        let out = compute_pension_relief(dec!(2_000), dec!(10_000), &schedule()).unwrap().result;
        assert_eq!(out.marginal_rate, Decimal::ZERO);
        assert_eq!(out.relief, Decimal::ZERO);
    }

    #[test]
    fn test_pension_relief_capped_at_annual_allowance() {
        let out = compute_pension_relief(dec!(70_000), dec!(200_000), &schedule()).unwrap();
        assert_eq!(out.result.eligible_contribution, dec!(60_000));
        assert_eq!(out.result.excess_over_allowance, dec!(10_000));
        assert_eq!(out.result.relief, dec!(27_000));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_rd_relief_small_company() {
        // enhanced 10,000 * 1.86 = 18,600; at 19% = 3,534
        let out = compute_rd_relief(dec!(10_000), dec!(40_000), &schedule()).unwrap().result;
        assert_eq!(out.enhanced_deduction, dec!(18_600));
        assert_eq!(out.additional_deduction, dec!(8_600));
        assert_eq!(out.applicable_rate, dec!(0.19));
        assert_eq!(out.relief, dec!(3_534));
    }

    #[test]
    fn test_capital_allowances_over_limit() {
        let out = compute_capital_allowances(dec!(1_200_000), dec!(2_000_000), &schedule()).unwrap();
        assert_eq!(out.result.aia_claimed, dec!(1_000_000));
        assert_eq!(out.result.excess_spend, dec!(200_000));
        assert_eq!(out.result.relief, dec!(250_000));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_finance_cost_credit_at_basic_rate() {
        assert_eq!(finance_cost_credit(dec!(5_000), &schedule()), dec!(1_000));
    }

    #[test]
    fn test_negative_expenses_rejected() {
        let err = compute_trading_allowance(dec!(100), dec!(-1), &schedule()).unwrap_err();
        assert_eq!(err.field(), Some("expenses"));
    }
}
