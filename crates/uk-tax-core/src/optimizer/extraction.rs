use rust_decimal::Decimal;

use crate::corporation_tax::corporation_tax_liability;
use crate::national_insurance::{ni_liability, NiCategory};
use crate::personal_tax::{personal_liability, IncomeSources};
use crate::schedule::TaxYearSchedule;
use crate::types::{round_money, Money};

use super::position::TaxComponents;
use super::warn;

/// Liabilities when a company owner draws `salary` and `dividends` and the
/// company is charged on `company_profit`. Employer NI is returned apart
/// from the components.
pub(super) fn extraction_components(
    salary: Money,
    dividends: Money,
    company_profit: Money,
    schedule: &TaxYearSchedule,
) -> (TaxComponents, Money) {
    let personal = personal_liability(
        &IncomeSources {
            salary,
            dividends,
            ..Default::default()
        },
        schedule,
    );
    let ct = corporation_tax_liability(company_profit, schedule);
    let employer_ni = ni_liability(salary, NiCategory::Employer, schedule).contribution;
    let components = TaxComponents {
        income_tax: personal.income_tax,
        national_insurance: personal.class1_ni,
        dividend_tax: personal.dividend_tax,
        corporation_tax: ct.tax,
        tax_credits: Decimal::ZERO,
    };
    (components, employer_ni)
}

pub(super) struct OptimalExtraction {
    pub salary: Money,
    pub adjusted_profit: Money,
    pub dividend_pool: Money,
    pub components: TaxComponents,
    pub employer_ni: Money,
}

/// Salary pinned at the personal allowance. What is left of the profit after
/// that salary and `deductions` is charged to corporation tax, and the rest
/// is paid out as dividends.
pub(super) fn optimal_extraction(
    company_profit: Money,
    deductions: Money,
    schedule: &TaxYearSchedule,
    warnings: &mut Vec<String>,
) -> OptimalExtraction {
    let salary = schedule.income_tax().personal_allowance;
    let unfloored = company_profit - salary - deductions;
    if unfloored < Decimal::ZERO {
        warn(
            warnings,
            format!(
                "Salary and deductions exceed company profit by {}; adjusted profit floored at zero (losses are not carried forward).",
                round_money(-unfloored)
            ),
        );
    }
    let adjusted_profit = unfloored.max(Decimal::ZERO);
    let ct = corporation_tax_liability(adjusted_profit, schedule).tax;
    let dividend_pool = adjusted_profit - ct;
    let (components, employer_ni) = extraction_components(salary, dividend_pool, adjusted_profit, schedule);
    OptimalExtraction {
        salary,
        adjusted_profit,
        dividend_pool,
        components,
        employer_ni,
    }
}
