use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::corporation_tax;
use crate::schedule::TaxYearSchedule;
use crate::types::{round_money, Money};

use super::extraction::{extraction_components, optimal_extraction};
use super::facts::DirectorFacts;
use super::position::{AllocationCandidate, Priority, Recommendation, TaxPosition};
use super::{ArchetypeAnalysis, ArchetypeResult, OptimizerSettings};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectorAnalysis {
    pub optimal_salary: Money,
    /// Company profit after the optimal salary and employer pension
    pub adjusted_profit: Money,
    pub dividend_pool: Money,
    /// Employer NI is shown for information and is not part of total tax
    pub employer_ni_current: Money,
    pub employer_ni_optimal: Money,
}

pub(crate) fn optimize_director(
    facts: &DirectorFacts,
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
            pension_contribution: facts.pension_contribution,
            company_profit: facts.company_profit,
            ..AllocationCandidate::named("current")
        },
        current_components,
        facts.salary + facts.dividends,
    );

    let opt = optimal_extraction(facts.company_profit, facts.pension_contribution, schedule, warnings);
    let optimal = TaxPosition::new(
        AllocationCandidate {
            salary: opt.salary,
            dividends: opt.dividend_pool,
            pension_contribution: facts.pension_contribution,
            company_profit: opt.adjusted_profit,
            ..AllocationCandidate::named("salary_at_personal_allowance")
        },
        opt.components,
        opt.salary + opt.dividend_pool,
    );
    tracing::debug!(
        optimal_salary = %opt.salary,
        dividend_pool = %opt.dividend_pool,
        "director candidate built"
    );

    let mut recommendations = Vec::new();
    let saving = current.total_tax - optimal.total_tax;
    if facts.salary > opt.salary {
        recommendations.push(Recommendation::saving(
            Priority::High,
            "Optimise salary/dividend split",
            format!(
                "Reduce salary to {} (the personal allowance and NI primary threshold) and take the remaining profit as dividends.",
                opt.salary
            ),
            saving,
        ));
    }
    let ct = schedule.corporation_tax();
    if facts.pension_contribution < settings.pension_target && facts.company_profit > ct.lower_limit {
        let gap = settings.pension_target - facts.pension_contribution;
        let rate = corporation_tax::marginal_rate(facts.company_profit, schedule);
        recommendations.push(Recommendation::saving(
            Priority::Medium,
            "Increase employer pension contributions",
            format!(
                "Employer contributions of a further {gap} are deductible for corporation tax at {rate} and free of NI."
            ),
            gap * rate,
        ));
    }
    if facts.dividends > Decimal::ZERO {
        recommendations.push(Recommendation::qualitative(
            Priority::Low,
            "Dividend timing",
            "Spread dividends across tax years to use each year's dividend allowance and basic band.",
            "allowance_usage",
        ));
    }
    recommendations.push(Recommendation::qualitative(
        Priority::Medium,
        "Review company expenses",
        "Make sure every allowable business expense is claimed through the company.",
        "corporation_tax_reduction",
    ));

    ArchetypeResult {
        current,
        optimal,
        analysis: ArchetypeAnalysis::Director(DirectorAnalysis {
            optimal_salary: opt.salary,
            adjusted_profit: round_money(opt.adjusted_profit),
            dividend_pool: round_money(opt.dividend_pool),
            employer_ni_current: round_money(employer_ni_current),
            employer_ni_optimal: round_money(opt.employer_ni),
        }),
        recommendations,
    }
}
