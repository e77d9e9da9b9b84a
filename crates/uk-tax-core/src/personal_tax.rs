use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::dividend_tax::dividend_tax_liability;
use crate::income_tax::income_tax_liability;
use crate::national_insurance::{ni_liability, NiCategory};
use crate::schedule::TaxYearSchedule;
use crate::types::{ensure_non_negative, ratio_or_zero, round_money, with_metadata, ComputationOutput, Money, Rate};
use crate::TaxResult;

/// One person's income for a tax year, by source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeSources {
    /// Employment income, liable to Class 1 NI
    #[serde(default)]
    pub salary: Money,
    /// Trading profit, liable to Class 4 NI
    #[serde(default)]
    pub self_employment_profit: Money,
    /// Other non-savings income with no NI (e.g. rental profit)
    #[serde(default)]
    pub other_income: Money,
    #[serde(default)]
    pub dividends: Money,
    /// Personal pension contribution deducted before income tax
    #[serde(default)]
    pub pension_contribution: Money,
}

impl IncomeSources {
    pub(crate) fn validate(&self) -> TaxResult<()> {
        ensure_non_negative("salary", self.salary)?;
        ensure_non_negative("self_employment_profit", self.self_employment_profit)?;
        ensure_non_negative("other_income", self.other_income)?;
        ensure_non_negative("dividends", self.dividends)?;
        ensure_non_negative("pension_contribution", self.pension_contribution)?;
        Ok(())
    }

    fn non_dividend_income(&self) -> Money {
        self.salary + self.self_employment_profit + self.other_income
    }

    pub fn gross_income(&self) -> Money {
        self.non_dividend_income() + self.dividends
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalTaxInput {
    #[serde(flatten)]
    pub income: IncomeSources,
    #[serde(default)]
    pub schedule: TaxYearSchedule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalTaxOutput {
    pub gross_income: Money,
    pub pension_deduction: Money,
    pub non_savings_income: Money,
    pub personal_allowance: Money,
    pub income_tax: Money,
    pub class1_ni: Money,
    pub class4_ni: Money,
    pub national_insurance: Money,
    pub dividend_tax: Money,
    pub total_tax: Money,
    pub net_income: Money,
    pub effective_rate: Rate,
}

/// Unrounded personal liability, reused by the optimizer.
#[derive(Debug, Clone)]
pub(crate) struct PersonalLiability {
    pub pension_deduction: Money,
    pub non_savings_income: Money,
    pub personal_allowance: Money,
    pub income_tax: Money,
    pub class1_ni: Money,
    pub class4_ni: Money,
    pub dividend_tax: Money,
}

pub(crate) fn personal_liability(income: &IncomeSources, schedule: &TaxYearSchedule) -> PersonalLiability {
    let pension_deduction = income
        .pension_contribution
        .min(schedule.allowances().pension_annual_allowance)
        .min(income.non_dividend_income());
    let non_savings_income = income.non_dividend_income() - pension_deduction;

    let it = income_tax_liability(non_savings_income, schedule);
    let class1 = ni_liability(income.salary, NiCategory::Employee, schedule);
    let class4 = ni_liability(income.self_employment_profit, NiCategory::SelfEmployed, schedule);
    let dividends = dividend_tax_liability(income.dividends, non_savings_income, schedule);

    PersonalLiability {
        pension_deduction,
        non_savings_income,
        personal_allowance: it.personal_allowance,
        income_tax: it.tax(),
        class1_ni: class1.contribution,
        class4_ni: class4.contribution,
        dividend_tax: dividends.tax(),
    }
}

/// Self-assessment style total: income tax on non-savings income after a
/// pension deduction, Class 1 NI on salary, Class 4 NI on trading profit,
/// and dividend tax stacked on top.
pub fn compute_personal_tax(
    income: &IncomeSources,
    schedule: &TaxYearSchedule,
) -> TaxResult<ComputationOutput<PersonalTaxOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    income.validate()?;

    let calc = personal_liability(income, schedule);
    if calc.pension_deduction < income.pension_contribution {
        let msg = format!(
            "Pension contribution {} limited to {} for income tax purposes.",
            income.pension_contribution,
            round_money(calc.pension_deduction)
        );
        tracing::warn!("{msg}");
        warnings.push(msg);
    }

    let income_tax = round_money(calc.income_tax);
    let class1_ni = round_money(calc.class1_ni);
    let class4_ni = round_money(calc.class4_ni);
    let dividend_tax = round_money(calc.dividend_tax);
    let national_insurance = class1_ni + class4_ni;
    let total_tax = income_tax + national_insurance + dividend_tax;
    let gross_income = round_money(income.gross_income());

    let output = PersonalTaxOutput {
        gross_income,
        pension_deduction: round_money(calc.pension_deduction),
        non_savings_income: round_money(calc.non_savings_income),
        personal_allowance: round_money(calc.personal_allowance),
        income_tax,
        class1_ni,
        class4_ni,
        national_insurance,
        dividend_tax,
        total_tax,
        net_income: gross_income - total_tax,
        effective_rate: ratio_or_zero(total_tax, gross_income),
    };
    tracing::debug!(gross_income = %gross_income, total_tax = %total_tax, "computed personal tax");

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Personal liability: income tax, Class 1 and Class 4 NI, dividend tax",
        &serde_json::json!({
            "income": income,
            "tax_year": schedule.label(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
