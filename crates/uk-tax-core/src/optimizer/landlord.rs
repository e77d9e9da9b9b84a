use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::corporation_tax::corporation_tax_liability;
use crate::income_tax::income_tax_liability;
use crate::reliefs::{finance_cost_credit, score_allowance, AllowanceComparison, AllowanceKind};
use crate::schedule::TaxYearSchedule;
use crate::types::{round_money, Money};

use super::facts::LandlordFacts;
use super::position::{AllocationCandidate, Priority, ProfitMethod, Recommendation, TaxComponents, TaxPosition};
use super::{warn, ArchetypeAnalysis, ArchetypeResult, OptimizerSettings};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncorporationScenario {
    /// Rent less expenses and mortgage interest, floored at zero
    pub company_profit: Money,
    pub corporation_tax: Money,
    /// Personal tax under the optimal method less corporation tax
    pub saving: Money,
    pub recommended: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandlordAnalysis {
    pub allowance: AllowanceComparison,
    pub use_property_allowance: bool,
    pub taxable_income: Money,
    pub finance_cost_credit: Money,
    pub incorporation: IncorporationScenario,
}

struct MethodOutcome {
    method: ProfitMethod,
    taxable: Money,
    rental_income_tax: Money,
    credit: Money,
}

impl MethodOutcome {
    fn tax(&self) -> Money {
        self.rental_income_tax - self.credit
    }
}

/// Income tax attributable to the rental profit: tax on other income plus
/// rent, less tax on other income alone.
fn rental_income_tax(other_income: Money, rental_taxable: Money, schedule: &TaxYearSchedule) -> Money {
    income_tax_liability(other_income + rental_taxable, schedule).tax() - income_tax_liability(other_income, schedule).tax()
}

fn position(name: &str, facts: &LandlordFacts, outcome: &MethodOutcome, cash_profit: Money) -> TaxPosition {
    TaxPosition::new(
        AllocationCandidate {
            rental_profit: outcome.taxable,
            other_income: facts.other_income,
            method: Some(outcome.method),
            ..AllocationCandidate::named(name)
        },
        TaxComponents {
            income_tax: outcome.rental_income_tax,
            tax_credits: outcome.credit,
            ..Default::default()
        },
        cash_profit,
    )
}

pub(crate) fn optimize_landlord(
    facts: &LandlordFacts,
    schedule: &TaxYearSchedule,
    settings: &OptimizerSettings,
    warnings: &mut Vec<String>,
) -> ArchetypeResult {
    let scored = score_allowance(
        AllowanceKind::Property,
        facts.rental_income,
        facts.other_expenses,
        schedule,
    );

    // Mortgage interest is not deductible; it earns a basic-rate credit
    // under the expense method only.
    let expense_tax = rental_income_tax(facts.other_income, scored.taxable_with_expenses, schedule);
    let expenses = MethodOutcome {
        method: ProfitMethod::ItemisedExpenses,
        taxable: scored.taxable_with_expenses,
        rental_income_tax: expense_tax,
        credit: finance_cost_credit(facts.mortgage_interest, schedule).min(expense_tax),
    };
    let allowance = MethodOutcome {
        method: ProfitMethod::PropertyAllowance,
        taxable: scored.taxable_with_allowance,
        rental_income_tax: rental_income_tax(facts.other_income, scored.taxable_with_allowance, schedule),
        credit: Decimal::ZERO,
    };

    let use_property_allowance = allowance.tax() < expenses.tax()
        || (allowance.tax() == expenses.tax() && allowance.taxable < expenses.taxable);
    let chosen = if use_property_allowance { &allowance } else { &expenses };
    tracing::debug!(
        use_property_allowance,
        expense_tax = %expenses.tax(),
        allowance_tax = %allowance.tax(),
        "landlord method selected"
    );

    let unfloored = facts.rental_income - facts.other_expenses - facts.mortgage_interest;
    if unfloored < Decimal::ZERO {
        warn(
            warnings,
            format!(
                "Expenses and mortgage interest exceed rent by {}; rental profit floored at zero (losses are not carried forward).",
                round_money(-unfloored)
            ),
        );
    }
    let cash_profit = unfloored.max(Decimal::ZERO);
    let current = position("current", facts, &expenses, cash_profit);
    let optimal = position(
        if use_property_allowance {
            "property_allowance"
        } else {
            "itemised_expenses"
        },
        facts,
        chosen,
        cash_profit,
    );

    let company_profit = cash_profit;
    let corporation_tax = round_money(corporation_tax_liability(company_profit, schedule).tax);
    let incorporation_saving = optimal.total_tax - corporation_tax;
    let incorporation = IncorporationScenario {
        company_profit: round_money(company_profit),
        corporation_tax,
        saving: incorporation_saving,
        recommended: incorporation_saving > settings.incorporation_saving_threshold
            && facts.number_of_properties >= settings.incorporation_min_properties,
    };

    let mut recommendations = Vec::new();
    if facts.mortgage_interest > Decimal::ZERO {
        recommendations.push(Recommendation::saving(
            Priority::High,
            "Finance cost tax credit",
            format!(
                "Claim the {} basic-rate reduction on mortgage interest of {}. It is a credit, not a deduction.",
                schedule.income_tax().basic_rate,
                facts.mortgage_interest
            ),
            expenses.credit,
        ));
    }
    if facts.is_furnished {
        recommendations.push(Recommendation::qualitative(
            Priority::High,
            "Replacement of domestic items relief",
            "Replacing furniture, appliances and furnishings in a furnished let is deductible.",
            "furnished_relief",
        ));
    }
    if use_property_allowance {
        recommendations.push(Recommendation::saving(
            Priority::Low,
            "Use the property allowance",
            format!(
                "The {} property allowance gives lower taxable income than itemised expenses.",
                scored.allowance_limit
            ),
            current.total_tax - optimal.total_tax,
        ));
    }
    if incorporation.recommended {
        recommendations.push(Recommendation::saving(
            Priority::Medium,
            "Consider incorporation",
            format!(
                "With {} properties, a property company would pay {} corporation tax with mortgage interest fully deductible.",
                facts.number_of_properties, corporation_tax
            ),
            incorporation_saving,
        ));
    }
    recommendations.push(Recommendation::qualitative(
        Priority::Medium,
        "Joint ownership with spouse",
        "Sharing ownership with a spouse on a lower band can reduce the overall tax on the rent.",
        "band_sharing",
    ));
    recommendations.push(Recommendation::qualitative(
        Priority::Low,
        "Maximise expense claims",
        "Claim repairs, insurance, agent, legal and accountancy fees.",
        "expense_review",
    ));

    ArchetypeResult {
        analysis: ArchetypeAnalysis::Landlord(LandlordAnalysis {
            allowance: AllowanceComparison {
                allowance_used: round_money(scored.allowance_used),
                taxable_with_allowance: round_money(scored.taxable_with_allowance),
                taxable_with_expenses: round_money(scored.taxable_with_expenses),
                ..scored
            },
            use_property_allowance,
            taxable_income: round_money(chosen.taxable),
            finance_cost_credit: round_money(expenses.credit),
            incorporation,
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

    fn facts() -> LandlordFacts {
        LandlordFacts {
            rental_income: dec!(2_000),
            mortgage_interest: Decimal::ZERO,
            other_expenses: Decimal::ZERO,
            is_furnished: false,
            number_of_properties: 1,
            other_income: Decimal::ZERO,
        }
    }

    fn analysis(r: &ArchetypeResult) -> &LandlordAnalysis {
        match &r.analysis {
            ArchetypeAnalysis::Landlord(a) => a,
            other => panic!("unexpected analysis {other:?}"),
        }
    }

    #[test]
    fn test_small_rent_uses_property_allowance() {
        let s = TaxYearSchedule::uk_2025_26();
        let r = optimize_landlord(&facts(), &s, &OptimizerSettings::default(), &mut Vec::new());
        assert!(analysis(&r).use_property_allowance);
        assert_eq!(analysis(&r).taxable_income, dec!(1_000));
    }

    #[test]
    fn test_rent_taxed_on_top_of_other_income() {
        // other 30,000: rent 10,000 less 2,000 expenses at 20% = 1,600
        // interest 5,000 -> credit 1,000
        let s = TaxYearSchedule::uk_2025_26();
        let f = LandlordFacts {
            rental_income: dec!(10_000),
            other_expenses: dec!(2_000),
            mortgage_interest: dec!(5_000),
            other_income: dec!(30_000),
            ..facts()
        };
        let r = optimize_landlord(&f, &s, &OptimizerSettings::default(), &mut Vec::new());
        assert_eq!(r.current.components.income_tax, dec!(1_600));
        assert_eq!(r.current.components.tax_credits, dec!(1_000));
        assert_eq!(r.current.total_tax, dec!(600));
        // allowance: 9,000 at 20% = 1,800, worse than 600
        assert!(!analysis(&r).use_property_allowance);
        assert_eq!(r.optimal.total_tax, dec!(600));
    }

    #[test]
    fn test_credit_capped_at_rental_tax() {
        let s = TaxYearSchedule::uk_2025_26();
        let f = LandlordFacts {
            rental_income: dec!(5_000),
            mortgage_interest: dec!(20_000),
            other_income: dec!(40_000),
            ..facts()
        };
        let mut warnings = Vec::new();
        let r = optimize_landlord(&f, &s, &OptimizerSettings::default(), &mut warnings);
        assert_eq!(r.current.components.tax_credits, r.current.components.income_tax);
        assert_eq!(r.current.total_tax, Decimal::ZERO);
        // 5,000 rent less 20,000 interest
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("15000"));
        assert_eq!(analysis(&r).incorporation.company_profit, Decimal::ZERO);
    }

    #[test]
    fn test_profitable_let_has_no_loss_warning() {
        let s = TaxYearSchedule::uk_2025_26();
        let mut warnings = Vec::new();
        optimize_landlord(&facts(), &s, &OptimizerSettings::default(), &mut warnings);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_incorporation_needs_enough_properties() {
        // higher-rate landlord with large rent: 60,000 at 40% on top of 60,000 other income
        let s = TaxYearSchedule::uk_2025_26();
        let f = LandlordFacts {
            rental_income: dec!(60_000),
            other_income: dec!(60_000),
            ..facts()
        };
        let r = optimize_landlord(&f, &s, &OptimizerSettings::default(), &mut Vec::new());
        assert!(analysis(&r).incorporation.saving > dec!(1_000));
        assert!(!analysis(&r).incorporation.recommended);

        let f = LandlordFacts {
            number_of_properties: 3,
            ..f
        };
        let r = optimize_landlord(&f, &s, &OptimizerSettings::default(), &mut Vec::new());
        assert!(analysis(&r).incorporation.recommended);
        assert!(r.recommendations.iter().any(|rec| rec.strategy == "Consider incorporation"));
    }
}
