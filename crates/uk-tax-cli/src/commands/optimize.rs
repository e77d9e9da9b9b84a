use clap::Args;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use uk_tax_core::optimizer::{self, OptimizeRequest, OptimizerSettings, TaxpayerFacts};
use uk_tax_core::TaxYearSchedule;

use crate::input;

/// Arguments for the allocation optimiser.
///
/// Only the flags that apply to the chosen archetype are read; the rest are
/// ignored. With `--input` the file holds `archetype`, the facts (inline or
/// under `facts`), and optionally `schedule` and `settings`.
#[derive(Args)]
pub struct OptimizeArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// director, sole_trader, company_owner or landlord
    #[arg(long)]
    pub archetype: Option<String>,

    #[arg(long)]
    pub salary: Option<Decimal>,
    #[arg(long)]
    pub dividends: Option<Decimal>,
    #[arg(long)]
    pub company_profit: Option<Decimal>,
    #[arg(long)]
    pub pension_contribution: Option<Decimal>,

    #[arg(long)]
    pub trading_income: Option<Decimal>,
    #[arg(long)]
    pub allowable_expenses: Option<Decimal>,
    #[arg(long)]
    pub capital_allowances: Option<Decimal>,

    #[arg(long)]
    pub rd_expenditure: Option<Decimal>,
    #[arg(long)]
    pub capital_investment: Option<Decimal>,

    #[arg(long)]
    pub rental_income: Option<Decimal>,
    #[arg(long)]
    pub mortgage_interest: Option<Decimal>,
    #[arg(long)]
    pub other_expenses: Option<Decimal>,
    /// Let is furnished (replacement of domestic items relief applies)
    #[arg(long)]
    pub furnished: bool,
    #[arg(long)]
    pub number_of_properties: Option<u32>,
    #[arg(long)]
    pub other_income: Option<Decimal>,
}

impl OptimizeArgs {
    fn facts_object(&self) -> Value {
        let mut map = Map::new();
        let money = [
            ("salary", self.salary),
            ("dividends", self.dividends),
            ("company_profit", self.company_profit),
            ("pension_contribution", self.pension_contribution),
            ("trading_income", self.trading_income),
            ("allowable_expenses", self.allowable_expenses),
            ("capital_allowances", self.capital_allowances),
            ("rd_expenditure", self.rd_expenditure),
            ("capital_investment", self.capital_investment),
            ("rental_income", self.rental_income),
            ("mortgage_interest", self.mortgage_interest),
            ("other_expenses", self.other_expenses),
            ("other_income", self.other_income),
        ];
        for (key, value) in money {
            if let Some(v) = value {
                map.insert(key.to_string(), Value::String(v.to_string()));
            }
        }
        if self.furnished {
            map.insert("is_furnished".to_string(), Value::Bool(true));
        }
        if let Some(n) = self.number_of_properties {
            map.insert("number_of_properties".to_string(), Value::from(n));
        }
        Value::Object(map)
    }
}

pub fn run_optimize(
    args: OptimizeArgs,
    schedule: &TaxYearSchedule,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request = match input::read_request(args.input.as_deref())? {
        Some(mut data) => {
            if let Value::Object(map) = &mut data {
                if let Some(archetype) = &args.archetype {
                    map.entry("archetype")
                        .or_insert_with(|| Value::String(archetype.clone()));
                }
                if !map.contains_key("schedule") {
                    map.insert("schedule".to_string(), serde_json::to_value(schedule)?);
                }
            }
            OptimizeRequest::from_json(&data)?
        }
        None => {
            let archetype = args
                .archetype
                .as_deref()
                .ok_or("--archetype is required (or provide --input)")?;
            OptimizeRequest {
                facts: TaxpayerFacts::from_json(archetype, &args.facts_object())?,
                schedule: schedule.clone(),
                settings: OptimizerSettings::default(),
            }
        }
    };

    tracing::debug!(archetype = %request.facts.archetype(), "running optimiser");
    let result = optimizer::optimize(&request.facts, &request.schedule, &request.settings)?;
    Ok(serde_json::to_value(result)?)
}
