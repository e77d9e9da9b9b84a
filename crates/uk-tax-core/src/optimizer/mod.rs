//! Allocation optimizer.
//!
//! For each taxpayer archetype there is one closed-form rule that builds an
//! "optimal" allocation at a known threshold point. Both the taxpayer's
//! current allocation and that candidate are run through the tax engines and
//! compared, and a ranked list of recommendations is produced.

pub mod company_owner;
pub mod director;
pub mod facts;
pub mod landlord;
pub mod position;
pub mod sole_trader;

mod extraction;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use crate::error::TaxError;
use crate::schedule::TaxYearSchedule;
use crate::types::{round_money, with_metadata, ComputationOutput, Money, Rate};
use crate::TaxResult;

pub use facts::{Archetype, CompanyOwnerFacts, DirectorFacts, LandlordFacts, SoleTraderFacts, TaxpayerFacts};
pub use position::{AllocationCandidate, Benefit, Priority, ProfitMethod, Recommendation, TaxComponents, TaxPosition};

/// Heuristic thresholds used when constructing recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    /// Minimum saving before incorporating a property portfolio is recommended
    pub incorporation_saving_threshold: Money,
    pub incorporation_min_properties: u32,
    /// Employer pension contribution a director is nudged towards
    pub pension_target: Money,
    /// Share of the VAT registration threshold at which a warning is raised
    pub vat_warning_fraction: Rate,
    /// Expenses below this share of income prompt an expense review
    pub expense_review_ratio: Rate,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        OptimizerSettings {
            incorporation_saving_threshold: dec!(1_000),
            incorporation_min_properties: 3,
            pension_target: dec!(10_000),
            vat_warning_fraction: dec!(0.85),
            expense_review_ratio: dec!(0.20),
        }
    }
}

impl OptimizerSettings {
    pub fn validate(&self) -> TaxResult<()> {
        if self.incorporation_saving_threshold < Decimal::ZERO {
            return Err(TaxError::invalid_input(
                "settings.incorporation_saving_threshold",
                "must be non-negative",
            ));
        }
        if self.incorporation_min_properties == 0 {
            return Err(TaxError::invalid_input(
                "settings.incorporation_min_properties",
                "must be a positive integer",
            ));
        }
        if self.pension_target < Decimal::ZERO {
            return Err(TaxError::invalid_input("settings.pension_target", "must be non-negative"));
        }
        for (field, ratio) in [
            ("settings.vat_warning_fraction", self.vat_warning_fraction),
            ("settings.expense_review_ratio", self.expense_review_ratio),
        ] {
            if ratio < Decimal::ZERO || ratio > Decimal::ONE {
                return Err(TaxError::invalid_input(field, "must be between 0 and 1"));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "archetype", rename_all = "snake_case")]
pub enum ArchetypeAnalysis {
    Director(director::DirectorAnalysis),
    SoleTrader(sole_trader::SoleTraderAnalysis),
    CompanyOwner(company_owner::CompanyOwnerAnalysis),
    Landlord(landlord::LandlordAnalysis),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationOutput {
    pub archetype: Archetype,
    pub current: TaxPosition,
    pub optimal: TaxPosition,
    /// `current.total_tax − optimal.total_tax`. Negative when the heuristic
    /// candidate is worse.
    pub saving: Money,
    pub analysis: ArchetypeAnalysis,
    pub recommendations: Vec<Recommendation>,
}

/// What an archetype rule hands back before the common wrapping.
pub(crate) struct ArchetypeResult {
    pub current: TaxPosition,
    pub optimal: TaxPosition,
    pub analysis: ArchetypeAnalysis,
    pub recommendations: Vec<Recommendation>,
}

/// JSON request shape: the facts (tagged by `archetype`), plus optional
/// schedule and settings.
#[derive(Debug, Clone)]
pub struct OptimizeRequest {
    pub facts: TaxpayerFacts,
    pub schedule: TaxYearSchedule,
    pub settings: OptimizerSettings,
}

impl OptimizeRequest {
    pub fn from_json(value: &Value) -> TaxResult<Self> {
        let archetype = value
            .get("archetype")
            .and_then(Value::as_str)
            .ok_or_else(|| TaxError::invalid_input("archetype", "required field is missing"))?;
        let facts_value = value.get("facts").unwrap_or(value);
        let facts = TaxpayerFacts::from_json(archetype, facts_value)?;
        let schedule = match value.get("schedule") {
            Some(v) if !v.is_null() => serde_json::from_value(v.clone())
                .map_err(|e| TaxError::invalid_schedule("schedule", e.to_string()))?,
            _ => TaxYearSchedule::default(),
        };
        let settings = match value.get("settings") {
            Some(v) if !v.is_null() => serde_json::from_value(v.clone())
                .map_err(|e| TaxError::invalid_input("settings", e.to_string()))?,
            _ => OptimizerSettings::default(),
        };
        Ok(OptimizeRequest {
            facts,
            schedule,
            settings,
        })
    }
}

/// Compare the taxpayer's current allocation with the archetype's optimal
/// candidate.
pub fn optimize(
    facts: &TaxpayerFacts,
    schedule: &TaxYearSchedule,
    settings: &OptimizerSettings,
) -> TaxResult<ComputationOutput<OptimizationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    facts.validate()?;
    settings.validate()?;

    let (methodology, result) = match facts {
        TaxpayerFacts::Director(f) => (
            "Director: salary at the personal allowance, remaining profit extracted as dividends after corporation tax",
            director::optimize_director(f, schedule, settings, &mut warnings),
        ),
        TaxpayerFacts::SoleTrader(f) => (
            "Sole trader: itemised expenses against the trading allowance, Class 4 NI on profit",
            sole_trader::optimize_sole_trader(f, schedule, settings, &mut warnings),
        ),
        TaxpayerFacts::CompanyOwner(f) => (
            "Company owner: R&D enhanced deduction and AIA against profit, salary at the personal allowance, dividends after corporation tax",
            company_owner::optimize_company_owner(f, schedule, settings, &mut warnings),
        ),
        TaxpayerFacts::Landlord(f) => (
            "Landlord: property allowance against expenses with the finance cost credit, plus an incorporation comparison",
            landlord::optimize_landlord(f, schedule, settings, &mut warnings),
        ),
    };

    let ArchetypeResult {
        current,
        optimal,
        analysis,
        mut recommendations,
    } = result;

    let saving = round_money(current.total_tax - optimal.total_tax);
    if saving < Decimal::ZERO {
        let msg = format!(
            "The suggested allocation costs {} more tax than the current one; keep the current allocation.",
            -saving
        );
        tracing::warn!("{msg}");
        warnings.push(msg);
    }
    position::rank(&mut recommendations);
    tracing::debug!(
        archetype = %facts.archetype(),
        current = %current.total_tax,
        optimal = %optimal.total_tax,
        saving = %saving,
        "allocation compared"
    );

    let output = OptimizationOutput {
        archetype: facts.archetype(),
        current,
        optimal,
        saving,
        analysis,
        recommendations,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        methodology,
        &serde_json::json!({
            "facts": facts,
            "tax_year": schedule.label(),
            "settings": settings,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Push a warning and mirror it to the log.
pub(crate) fn warn(warnings: &mut Vec<String>, msg: String) {
    tracing::warn!("{msg}");
    warnings.push(msg);
}
