use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::schedule::TaxYearSchedule;
use crate::types::{ensure_non_negative, ratio_or_zero, round_money, with_metadata, ComputationOutput, Money, Rate};
use crate::TaxResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorporationTaxInput {
    pub profit: Money,
    #[serde(default)]
    pub schedule: TaxYearSchedule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorporationTaxRegime {
    SmallProfits,
    MarginalRelief,
    MainRate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorporationTaxOutput {
    pub profit: Money,
    pub regime: CorporationTaxRegime,
    pub tax: Money,
    /// Relief given against the main-rate charge (zero outside the relief band)
    pub marginal_relief: Money,
    pub effective_rate: Rate,
    pub profit_after_tax: Money,
}

#[derive(Debug, Clone)]
pub(crate) struct CorporationTaxComputation {
    pub regime: CorporationTaxRegime,
    pub tax: Money,
    pub marginal_relief: Money,
}

pub(crate) fn corporation_tax_liability(profit: Money, schedule: &TaxYearSchedule) -> CorporationTaxComputation {
    let ct = schedule.corporation_tax();
    let profit = profit.max(Decimal::ZERO);
    if profit <= ct.lower_limit {
        CorporationTaxComputation {
            regime: CorporationTaxRegime::SmallProfits,
            tax: profit * ct.small_profits_rate,
            marginal_relief: Decimal::ZERO,
        }
    } else if profit >= ct.upper_limit {
        CorporationTaxComputation {
            regime: CorporationTaxRegime::MainRate,
            tax: profit * ct.main_rate,
            marginal_relief: Decimal::ZERO,
        }
    } else {
        let marginal_relief = (ct.upper_limit - profit) * ct.marginal_relief_fraction;
        CorporationTaxComputation {
            regime: CorporationTaxRegime::MarginalRelief,
            tax: profit * ct.main_rate - marginal_relief,
            marginal_relief,
        }
    }
}

/// Rate on the next pound of profit. Inside the relief band the relief
/// shrinks as profit grows, so the marginal rate is `main + fraction`.
pub fn marginal_rate(profit: Money, schedule: &TaxYearSchedule) -> Rate {
    let ct = schedule.corporation_tax();
    if profit < ct.lower_limit {
        ct.small_profits_rate
    } else if profit >= ct.upper_limit {
        ct.main_rate
    } else {
        ct.main_rate + ct.marginal_relief_fraction
    }
}

pub fn compute_corporation_tax(
    profit: Money,
    schedule: &TaxYearSchedule,
) -> TaxResult<ComputationOutput<CorporationTaxOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    ensure_non_negative("profit", profit)?;

    let calc = corporation_tax_liability(profit, schedule);
    if calc.regime == CorporationTaxRegime::MarginalRelief && !schedule.marginal_relief_is_continuous() {
        let msg = format!(
            "Marginal relief fraction {} does not meet the small profits rate at the lower limit; the effective rate jumps at the boundary.",
            schedule.corporation_tax().marginal_relief_fraction
        );
        tracing::warn!("{msg}");
        warnings.push(msg);
    }

    let tax = round_money(calc.tax);
    let output = CorporationTaxOutput {
        profit: round_money(profit),
        regime: calc.regime,
        tax,
        marginal_relief: round_money(calc.marginal_relief),
        effective_rate: ratio_or_zero(calc.tax, profit),
        profit_after_tax: round_money(profit) - tax,
    };
    tracing::debug!(profit = %profit, regime = ?output.regime, tax = %output.tax, "computed corporation tax");

    let ct = schedule.corporation_tax();
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Corporation tax: small profits rate, main rate, or marginal relief between the limits",
        &serde_json::json!({
            "profit": profit.to_string(),
            "tax_year": schedule.label(),
            "small_profits_rate": ct.small_profits_rate.to_string(),
            "main_rate": ct.main_rate.to_string(),
            "lower_limit": ct.lower_limit.to_string(),
            "upper_limit": ct.upper_limit.to_string(),
            "marginal_relief_fraction": ct.marginal_relief_fraction.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
