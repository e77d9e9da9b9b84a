use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::income_tax::marginal_income_tax_rate;
use crate::personal_tax::{personal_liability, IncomeSources};
use crate::reliefs::{score_allowance, AllowanceComparison, AllowanceKind};
use crate::schedule::TaxYearSchedule;
use crate::types::{round_money, Money};

use super::facts::SoleTraderFacts;
use super::position::{AllocationCandidate, Priority, ProfitMethod, Recommendation, TaxComponents, TaxPosition};
use super::{warn, ArchetypeAnalysis, ArchetypeResult, OptimizerSettings};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoleTraderAnalysis {
    pub allowance: AllowanceComparison,
    pub taxable_profit_with_expenses: Money,
    pub taxable_profit_with_allowance: Money,
    pub selected_method: ProfitMethod,
    pub taxable_profit: Money,
    pub pension_deduction: Money,
}

fn trader_position(
    name: &str,
    facts: &SoleTraderFacts,
    profit: Money,
    method: ProfitMethod,
    cash_profit: Money,
    schedule: &TaxYearSchedule,
) -> (TaxPosition, Money) {
    let personal = personal_liability(
        &IncomeSources {
            self_employment_profit: profit,
            pension_contribution: facts.pension_contribution,
            ..Default::default()
        },
        schedule,
    );
    let position = TaxPosition::new(
        AllocationCandidate {
            trading_profit: profit,
            pension_contribution: facts.pension_contribution,
            capital_allowances: facts.capital_allowances,
            method: Some(method),
            ..AllocationCandidate::named(name)
        },
        TaxComponents {
            income_tax: personal.income_tax,
            national_insurance: personal.class4_ni,
            ..Default::default()
        },
        cash_profit,
    );
    (position, personal.pension_deduction)
}

/// The trading allowance replaces itemised expenses only when it gives a
/// lower profit, nothing else has been claimed, and income is within the
/// allowance.
pub(crate) fn uses_trading_allowance(facts: &SoleTraderFacts, scored: &AllowanceComparison, itemised: Money) -> bool {
    scored.taxable_with_allowance < itemised
        && facts.allowable_expenses + facts.capital_allowances == Decimal::ZERO
        && facts.trading_income <= scored.allowance_limit
}

pub(crate) fn optimize_sole_trader(
    facts: &SoleTraderFacts,
    schedule: &TaxYearSchedule,
    settings: &OptimizerSettings,
    warnings: &mut Vec<String>,
) -> ArchetypeResult {
    let scored = score_allowance(
        AllowanceKind::Trading,
        facts.trading_income,
        facts.allowable_expenses,
        schedule,
    );
    let itemised = (facts.trading_income - facts.allowable_expenses - facts.capital_allowances).max(Decimal::ZERO);
    let with_allowance = scored.taxable_with_allowance;
    let use_allowance = uses_trading_allowance(facts, &scored, itemised);

    let (current, pension_deduction) = trader_position(
        "current",
        facts,
        itemised,
        ProfitMethod::ItemisedExpenses,
        itemised,
        schedule,
    );
    let (optimal, _) = if use_allowance {
        trader_position(
            "trading_allowance",
            facts,
            with_allowance,
            ProfitMethod::TradingAllowance,
            itemised,
            schedule,
        )
    } else {
        trader_position(
            "itemised_expenses",
            facts,
            itemised,
            ProfitMethod::ItemisedExpenses,
            itemised,
            schedule,
        )
    };
    let selected_method = if use_allowance {
        ProfitMethod::TradingAllowance
    } else {
        ProfitMethod::ItemisedExpenses
    };
    tracing::debug!(?selected_method, itemised = %itemised, "sole trader method selected");

    if pension_deduction < facts.pension_contribution {
        warn(
            warnings,
            format!(
                "Pension contribution {} exceeds what can be relieved; only {} was deducted.",
                facts.pension_contribution,
                round_money(pension_deduction)
            ),
        );
    }

    let mut recommendations = Vec::new();
    if use_allowance {
        recommendations.push(Recommendation::saving(
            Priority::High,
            "Use the trading allowance",
            format!(
                "Income of {} is within the {} trading allowance; claim it instead of itemised expenses.",
                facts.trading_income, scored.allowance_limit
            ),
            current.total_tax - optimal.total_tax,
        ));
    }
    if facts.trading_income > Decimal::ZERO
        && facts.allowable_expenses < facts.trading_income * settings.expense_review_ratio
    {
        recommendations.push(Recommendation::qualitative(
            Priority::High,
            "Review allowable expenses",
            "Expenses look low for the turnover. Check use of home, travel, subscriptions, phone and internet.",
            "expense_review",
        ));
    }
    let personal_allowance = schedule.income_tax().personal_allowance;
    if facts.capital_allowances == Decimal::ZERO && itemised > personal_allowance {
        recommendations.push(Recommendation::qualitative(
            Priority::Medium,
            "Claim the Annual Investment Allowance",
            "Equipment and vehicles bought for the business qualify for 100% first-year relief.",
            "capital_allowances",
        ));
    }
    if facts.pension_contribution < settings.pension_target && itemised > personal_allowance {
        let gap = (settings.pension_target - facts.pension_contribution).min(itemised);
        let rate = marginal_income_tax_rate(itemised - pension_deduction, schedule);
        recommendations.push(Recommendation::saving(
            Priority::Medium,
            "Increase pension contributions",
            format!("A further {gap} of contributions is relieved at your marginal rate of {rate}."),
            gap * rate,
        ));
    }
    if itemised > schedule.corporation_tax().lower_limit {
        recommendations.push(Recommendation::qualitative(
            Priority::Medium,
            "Consider incorporation",
            "At this level of profit a limited company paying corporation tax may cost less overall.",
            "incorporation_review",
        ));
    }
    let vat_threshold = schedule.allowances().vat_registration_threshold;
    if facts.trading_income >= vat_threshold {
        recommendations.push(Recommendation::qualitative(
            Priority::High,
            "Register for VAT",
            "Turnover is at or above the VAT registration threshold.",
            "vat_registration",
        ));
    } else if facts.trading_income >= vat_threshold * settings.vat_warning_fraction {
        recommendations.push(Recommendation::qualitative(
            Priority::Low,
            "Monitor VAT threshold",
            "Turnover is approaching the VAT registration threshold; compare the flat rate scheme.",
            "vat_registration",
        ));
    }

    ArchetypeResult {
        analysis: ArchetypeAnalysis::SoleTrader(SoleTraderAnalysis {
            allowance: AllowanceComparison {
                allowance_used: round_money(scored.allowance_used),
                taxable_with_allowance: round_money(scored.taxable_with_allowance),
                taxable_with_expenses: round_money(scored.taxable_with_expenses),
                ..scored
            },
            taxable_profit_with_expenses: round_money(itemised),
            taxable_profit_with_allowance: round_money(with_allowance),
            selected_method,
            taxable_profit: optimal.candidate.trading_profit,
            pension_deduction: round_money(pension_deduction),
        }),
        current,
        optimal,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn facts(income: Money, expenses: Money) -> SoleTraderFacts {
        SoleTraderFacts {
            trading_income: income,
            allowable_expenses: expenses,
            capital_allowances: Decimal::ZERO,
            pension_contribution: Decimal::ZERO,
        }
    }

    fn analysis(r: &ArchetypeResult) -> &SoleTraderAnalysis {
        match &r.analysis {
            ArchetypeAnalysis::SoleTrader(a) => a,
            other => panic!("unexpected analysis {other:?}"),
        }
    }

    #[test]
    fn test_small_income_switches_to_allowance() {
        let s = TaxYearSchedule::uk_2025_26();
        let mut warnings = Vec::new();
        let r = optimize_sole_trader(&facts(dec!(800), Decimal::ZERO), &s, &OptimizerSettings::default(), &mut warnings);
        let a = analysis(&r);
        assert_eq!(a.selected_method, ProfitMethod::TradingAllowance);
        assert_eq!(a.taxable_profit, Decimal::ZERO);
        assert_eq!(r.optimal.candidate.method, Some(ProfitMethod::TradingAllowance));
    }

    #[test]
    fn test_claimed_expenses_keep_itemised_method() {
        let s = TaxYearSchedule::uk_2025_26();
        let mut warnings = Vec::new();
        let r = optimize_sole_trader(&facts(dec!(800), dec!(100)), &s, &OptimizerSettings::default(), &mut warnings);
        assert_eq!(analysis(&r).selected_method, ProfitMethod::ItemisedExpenses);
        assert_eq!(analysis(&r).taxable_profit, dec!(700));
    }

    #[test]
    fn test_income_above_allowance_keeps_itemised_method() {
        let s = TaxYearSchedule::uk_2025_26();
        let mut warnings = Vec::new();
        let r = optimize_sole_trader(&facts(dec!(5_000), Decimal::ZERO), &s, &OptimizerSettings::default(), &mut warnings);
        assert_eq!(analysis(&r).selected_method, ProfitMethod::ItemisedExpenses);
        assert_eq!(r.current.total_tax, r.optimal.total_tax);
    }

    #[test]
    fn test_class4_and_pension_in_both_positions() {
        // profit 40,000; pension 5,000 -> IT on 35,000 = 4,486; class 4 = 1,645.80
        let s = TaxYearSchedule::uk_2025_26();
        let mut warnings = Vec::new();
        let f = SoleTraderFacts {
            pension_contribution: dec!(5_000),
            ..facts(dec!(50_000), dec!(10_000))
        };
        let r = optimize_sole_trader(&f, &s, &OptimizerSettings::default(), &mut warnings);
        assert_eq!(r.current.components.income_tax, dec!(4_486));
        assert_eq!(r.current.components.national_insurance, dec!(1_645.80));
        assert_eq!(r.optimal.total_tax, r.current.total_tax);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_vat_recommendations() {
        let s = TaxYearSchedule::uk_2025_26();
        let mut warnings = Vec::new();
        let r = optimize_sole_trader(&facts(dec!(95_000), dec!(30_000)), &s, &OptimizerSettings::default(), &mut warnings);
        assert!(r.recommendations.iter().any(|rec| rec.strategy == "Register for VAT"));

        let r = optimize_sole_trader(&facts(dec!(80_000), dec!(30_000)), &s, &OptimizerSettings::default(), &mut warnings);
        assert!(r.recommendations.iter().any(|rec| rec.strategy == "Monitor VAT threshold"));
    }
}
