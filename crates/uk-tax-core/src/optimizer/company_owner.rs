use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::corporation_tax;
use crate::reliefs::{aia_claim, rd_additional_deduction};
use crate::schedule::TaxYearSchedule;
use crate::types::{round_money, Money};

use super::extraction::{extraction_components, optimal_extraction};
use super::facts::CompanyOwnerFacts;
use super::position::{AllocationCandidate, Priority, Recommendation, TaxPosition};
use super::{ArchetypeAnalysis, ArchetypeResult, OptimizerSettings};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyOwnerAnalysis {
    pub optimal_salary: Money,
    pub rd_additional_deduction: Money,
    pub aia_claimed: Money,
    pub adjusted_profit: Money,
    pub dividend_pool: Money,
    pub employer_ni_current: Money,
    pub employer_ni_optimal: Money,
}

pub(crate) fn optimize_company_owner(
    facts: &CompanyOwnerFacts,
    schedule: &TaxYearSchedule,
    settings: &OptimizerSettings,
    warnings: &mut Vec<String>,
) -> ArchetypeResult {
    let (current_components, employer_ni_current) =
        extraction_components(facts.salary, facts.dividends, facts.company_profit, schedule);
    let current = TaxPosition::new(
        AllocationCandidate {
            salary: facts.salary,
            dividends: facts.dividends,
            company_profit: facts.company_profit,
            ..AllocationCandidate::named("current")
        },
        current_components,
        facts.salary + facts.dividends,
    );

    let rd_deduction = rd_additional_deduction(facts.rd_expenditure, schedule);
    let aia = aia_claim(facts.capital_investment, schedule);
    let opt = optimal_extraction(facts.company_profit, rd_deduction + aia, schedule, warnings);
    let optimal = TaxPosition::new(
        AllocationCandidate {
            salary: opt.salary,
            dividends: opt.dividend_pool,
            company_profit: opt.adjusted_profit,
            rd_additional_deduction: rd_deduction,
            capital_allowances: aia,
            ..AllocationCandidate::named("reliefs_and_salary_at_personal_allowance")
        },
        opt.components,
        opt.salary + opt.dividend_pool,
    );
    tracing::debug!(
        rd_deduction = %rd_deduction,
        aia = %aia,
        adjusted_profit = %opt.adjusted_profit,
        "company owner candidate built"
    );

    let rate = corporation_tax::marginal_rate(facts.company_profit, schedule);
    let mut recommendations = Vec::new();
    if facts.rd_expenditure > Decimal::ZERO {
        recommendations.push(Recommendation::saving(
            Priority::High,
            "Claim R&D enhanced deduction",
            format!(
                "R&D spend of {} qualifies for an extra {} deduction under the SME scheme.",
                facts.rd_expenditure,
                round_money(rd_deduction)
            ),
            rd_deduction * rate,
        ));
    }
    if facts.capital_investment > Decimal::ZERO {
        recommendations.push(Recommendation::saving(
            Priority::High,
            "Claim the Annual Investment Allowance",
            format!(
                "{} of qualifying capital spend can be deducted in full this year.",
                round_money(aia)
            ),
            aia * rate,
        ));
    }
    if facts.salary > opt.salary {
        let employee_ni_saved = current.components.national_insurance - optimal.components.national_insurance;
        recommendations.push(Recommendation::saving(
            Priority::High,
            "Optimise salary/dividend ratio",
            format!(
                "Reduce salary to {} and extract the remaining profit as dividends to cut NI.",
                opt.salary
            ),
            employee_ni_saved + employer_ni_current - opt.employer_ni,
        ));
    }
    if facts.company_profit > schedule.corporation_tax().lower_limit {
        recommendations.push(Recommendation::saving(
            Priority::Medium,
            "Employer pension contributions",
            format!(
                "Contributions of {} would be deductible for corporation tax at {rate}.",
                settings.pension_target
            ),
            settings.pension_target * rate,
        ));
    }
    recommendations.push(Recommendation::qualitative(
        Priority::Low,
        "Timing of dividend payments",
        "Plan dividends across tax years to use each year's dividend allowance.",
        "allowance_usage",
    ));

    ArchetypeResult {
        current,
        optimal,
        analysis: ArchetypeAnalysis::CompanyOwner(CompanyOwnerAnalysis {
            optimal_salary: opt.salary,
            rd_additional_deduction: round_money(rd_deduction),
            aia_claimed: round_money(aia),
            adjusted_profit: round_money(opt.adjusted_profit),
            dividend_pool: round_money(opt.dividend_pool),
            employer_ni_current: round_money(employer_ni_current),
            employer_ni_optimal: round_money(opt.employer_ni),
        }),
        recommendations,
    }
}
