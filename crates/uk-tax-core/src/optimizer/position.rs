use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::types::{ratio_or_zero, round_money, Money, Rate};

// ---------------------------------------------------------------------------
// Candidates and positions
// ---------------------------------------------------------------------------

/// How taxable business or property profit was arrived at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfitMethod {
    ItemisedExpenses,
    TradingAllowance,
    PropertyAllowance,
}

/// One hypothetical way of arranging the taxpayer's income.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationCandidate {
    pub name: String,
    pub salary: Money,
    pub dividends: Money,
    pub trading_profit: Money,
    pub rental_profit: Money,
    pub other_income: Money,
    pub pension_contribution: Money,
    /// Profit charged to corporation tax
    pub company_profit: Money,
    pub rd_additional_deduction: Money,
    pub capital_allowances: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<ProfitMethod>,
}

impl AllocationCandidate {
    pub(crate) fn named(name: &str) -> Self {
        AllocationCandidate {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxComponents {
    pub income_tax: Money,
    pub national_insurance: Money,
    pub dividend_tax: Money,
    pub corporation_tax: Money,
    /// Tax reductions set against the liabilities above
    pub tax_credits: Money,
}

impl TaxComponents {
    fn rounded(&self) -> TaxComponents {
        TaxComponents {
            income_tax: round_money(self.income_tax),
            national_insurance: round_money(self.national_insurance),
            dividend_tax: round_money(self.dividend_tax),
            corporation_tax: round_money(self.corporation_tax),
            tax_credits: round_money(self.tax_credits),
        }
    }

    fn total(&self) -> Money {
        self.income_tax + self.national_insurance + self.dividend_tax + self.corporation_tax - self.tax_credits
    }
}

/// Result of running one candidate through the engines. Built once and only
/// compared afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxPosition {
    pub candidate: AllocationCandidate,
    pub components: TaxComponents,
    pub total_tax: Money,
    pub gross_income: Money,
    /// Gross income less personal taxes. Corporation tax is borne by the
    /// company and already reflected in the dividend pool.
    pub net_income: Money,
    pub effective_rate: Rate,
}

impl TaxPosition {
    pub(crate) fn new(candidate: AllocationCandidate, components: TaxComponents, gross_income: Money) -> Self {
        let components = components.rounded();
        let total_tax = components.total();
        let gross_income = round_money(gross_income);
        TaxPosition {
            net_income: gross_income - (total_tax - components.corporation_tax),
            effective_rate: ratio_or_zero(total_tax, gross_income),
            candidate: AllocationCandidate {
                salary: round_money(candidate.salary),
                dividends: round_money(candidate.dividends),
                trading_profit: round_money(candidate.trading_profit),
                rental_profit: round_money(candidate.rental_profit),
                other_income: round_money(candidate.other_income),
                pension_contribution: round_money(candidate.pension_contribution),
                company_profit: round_money(candidate.company_profit),
                rd_additional_deduction: round_money(candidate.rd_additional_deduction),
                capital_allowances: round_money(candidate.capital_allowances),
                ..candidate
            },
            components,
            total_tax,
            gross_income,
        }
    }
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

/// Ordered most to least urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Benefit {
    Saving { amount: Money },
    Qualitative { tag: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub strategy: String,
    pub rationale: String,
    pub priority: Priority,
    pub benefit: Benefit,
}

impl Recommendation {
    pub(crate) fn saving(priority: Priority, strategy: &str, rationale: String, amount: Money) -> Self {
        Recommendation {
            strategy: strategy.to_string(),
            rationale,
            priority,
            benefit: Benefit::Saving {
                amount: round_money(amount.max(Decimal::ZERO)),
            },
        }
    }

    pub(crate) fn qualitative(priority: Priority, strategy: &str, rationale: &str, tag: &str) -> Self {
        Recommendation {
            strategy: strategy.to_string(),
            rationale: rationale.to_string(),
            priority,
            benefit: Benefit::Qualitative { tag: tag.to_string() },
        }
    }

    pub fn estimated_saving(&self) -> Money {
        match &self.benefit {
            Benefit::Saving { amount } => *amount,
            Benefit::Qualitative { .. } => Decimal::ZERO,
        }
    }
}

/// Priority first, then larger estimated saving first.
pub(crate) fn rank(recommendations: &mut [Recommendation]) {
    recommendations.sort_by(|a, b| match a.priority.cmp(&b.priority) {
        Ordering::Equal => b.estimated_saving().cmp(&a.estimated_saving()),
        other => other,
    });
}
