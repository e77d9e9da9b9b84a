use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::TaxError;
use crate::types::{ensure_non_negative, Money};
use crate::TaxResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Director,
    SoleTrader,
    CompanyOwner,
    Landlord,
}

impl Archetype {
    pub const ALL: [Archetype; 4] = [
        Archetype::Director,
        Archetype::SoleTrader,
        Archetype::CompanyOwner,
        Archetype::Landlord,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Archetype::Director => "director",
            Archetype::SoleTrader => "sole_trader",
            Archetype::CompanyOwner => "company_owner",
            Archetype::Landlord => "landlord",
        }
    }

    fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Archetype::Director => &["salary", "dividends", "company_profit"],
            Archetype::SoleTrader => &["trading_income"],
            Archetype::CompanyOwner => &["company_profit", "salary", "dividends"],
            Archetype::Landlord => &["rental_income"],
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Archetype {
    type Err = TaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Archetype::ALL
            .into_iter()
            .find(|a| a.as_str() == normalised)
            .ok_or_else(|| {
                TaxError::invalid_input(
                    "archetype",
                    format!("unknown archetype '{s}' (expected director, sole_trader, company_owner or landlord)"),
                )
            })
    }
}

// ---------------------------------------------------------------------------
// Per-archetype facts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectorFacts {
    pub salary: Money,
    pub dividends: Money,
    /// Company profit before salary and corporation tax
    pub company_profit: Money,
    /// Employer pension contribution
    #[serde(default)]
    pub pension_contribution: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoleTraderFacts {
    pub trading_income: Money,
    #[serde(default, alias = "expenses")]
    pub allowable_expenses: Money,
    #[serde(default)]
    pub capital_allowances: Money,
    #[serde(default)]
    pub pension_contribution: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyOwnerFacts {
    pub company_profit: Money,
    pub salary: Money,
    pub dividends: Money,
    #[serde(default, alias = "r_and_d_expenditure")]
    pub rd_expenditure: Money,
    #[serde(default)]
    pub capital_investment: Money,
}

fn one_property() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandlordFacts {
    pub rental_income: Money,
    #[serde(default)]
    pub mortgage_interest: Money,
    #[serde(default)]
    pub other_expenses: Money,
    #[serde(default)]
    pub is_furnished: bool,
    #[serde(default = "one_property")]
    pub number_of_properties: u32,
    /// Non-rental income that has already used part of the bands
    #[serde(default)]
    pub other_income: Money,
}

/// Financial facts for one taxpayer, tagged by archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "archetype", rename_all = "snake_case")]
pub enum TaxpayerFacts {
    Director(DirectorFacts),
    SoleTrader(SoleTraderFacts),
    CompanyOwner(CompanyOwnerFacts),
    Landlord(LandlordFacts),
}

impl TaxpayerFacts {
    pub fn archetype(&self) -> Archetype {
        match self {
            TaxpayerFacts::Director(_) => Archetype::Director,
            TaxpayerFacts::SoleTrader(_) => Archetype::SoleTrader,
            TaxpayerFacts::CompanyOwner(_) => Archetype::CompanyOwner,
            TaxpayerFacts::Landlord(_) => Archetype::Landlord,
        }
    }

    /// Parse loosely-typed facts for `archetype`. Every failure names the
    /// offending field: unknown archetype, missing required field, wrong type
    /// or out-of-range value.
    pub fn from_json(archetype: &str, value: &Value) -> TaxResult<Self> {
        let archetype: Archetype = archetype.parse()?;
        let map = value
            .as_object()
            .ok_or_else(|| TaxError::invalid_input("facts", "must be a JSON object"))?;

        for field in archetype.required_fields() {
            if map.get(*field).map_or(true, Value::is_null) {
                return Err(TaxError::invalid_input(*field, "required field is missing"));
            }
        }
        if let Some(flag) = map.get("is_furnished") {
            if !flag.is_boolean() {
                return Err(TaxError::invalid_input("is_furnished", "must be a boolean"));
            }
        }
        if let Some(count) = map.get("number_of_properties") {
            match count.as_u64() {
                Some(n) if n >= 1 && n <= u64::from(u32::MAX) => {}
                _ => {
                    return Err(TaxError::invalid_input(
                        "number_of_properties",
                        "must be a positive integer",
                    ))
                }
            }
        }

        let facts = match archetype {
            Archetype::Director => TaxpayerFacts::Director(parse(value)?),
            Archetype::SoleTrader => TaxpayerFacts::SoleTrader(parse(value)?),
            Archetype::CompanyOwner => TaxpayerFacts::CompanyOwner(parse(value)?),
            Archetype::Landlord => TaxpayerFacts::Landlord(parse(value)?),
        };
        facts.validate()?;
        Ok(facts)
    }

    pub fn validate(&self) -> TaxResult<()> {
        match self {
            TaxpayerFacts::Director(f) => {
                ensure_non_negative("salary", f.salary)?;
                ensure_non_negative("dividends", f.dividends)?;
                ensure_non_negative("company_profit", f.company_profit)?;
                ensure_non_negative("pension_contribution", f.pension_contribution)
            }
            TaxpayerFacts::SoleTrader(f) => {
                ensure_non_negative("trading_income", f.trading_income)?;
                ensure_non_negative("allowable_expenses", f.allowable_expenses)?;
                ensure_non_negative("capital_allowances", f.capital_allowances)?;
                ensure_non_negative("pension_contribution", f.pension_contribution)
            }
            TaxpayerFacts::CompanyOwner(f) => {
                ensure_non_negative("company_profit", f.company_profit)?;
                ensure_non_negative("salary", f.salary)?;
                ensure_non_negative("dividends", f.dividends)?;
                ensure_non_negative("rd_expenditure", f.rd_expenditure)?;
                ensure_non_negative("capital_investment", f.capital_investment)
            }
            TaxpayerFacts::Landlord(f) => {
                ensure_non_negative("rental_income", f.rental_income)?;
                ensure_non_negative("mortgage_interest", f.mortgage_interest)?;
                ensure_non_negative("other_expenses", f.other_expenses)?;
                ensure_non_negative("other_income", f.other_income)?;
                if f.number_of_properties == 0 {
                    return Err(TaxError::invalid_input(
                        "number_of_properties",
                        "must be a positive integer",
                    ));
                }
                Ok(())
            }
        }
    }
}

fn parse<T: DeserializeOwned>(value: &Value) -> TaxResult<T> {
    serde_json::from_value(value.clone()).map_err(|e| TaxError::invalid_input("facts", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_director_defaults_pension() {
        let facts = TaxpayerFacts::from_json(
            "director",
            &json!({"salary": 30000, "dividends": 20000, "company_profit": 60000}),
        )
        .unwrap();
        match facts {
            TaxpayerFacts::Director(d) => {
                assert_eq!(d.salary, dec!(30000));
                assert_eq!(d.pension_contribution, dec!(0));
            }
            other => panic!("unexpected facts {other:?}"),
        }
    }

    #[test]
    fn test_unknown_archetype() {
        let err = TaxpayerFacts::from_json("pirate", &json!({})).unwrap_err();
        assert_eq!(err.field(), Some("archetype"));
    }

    #[test]
    fn test_archetype_parsing_is_lenient_on_separators() {
        assert_eq!("Sole-Trader".parse::<Archetype>().unwrap(), Archetype::SoleTrader);
        assert_eq!("company owner".parse::<Archetype>().unwrap(), Archetype::CompanyOwner);
    }

    #[test]
    fn test_missing_required_field_named() {
        let err = TaxpayerFacts::from_json("company_owner", &json!({"company_profit": 1, "salary": 1}))
            .unwrap_err();
        assert_eq!(err.field(), Some("dividends"));
    }

    #[test]
    fn test_landlord_defaults() {
        let facts = TaxpayerFacts::from_json("landlord", &json!({"rental_income": 2000})).unwrap();
        match facts {
            TaxpayerFacts::Landlord(l) => {
                assert_eq!(l.number_of_properties, 1);
                assert!(!l.is_furnished);
                assert_eq!(l.mortgage_interest, dec!(0));
            }
            other => panic!("unexpected facts {other:?}"),
        }
    }

    #[test]
    fn test_zero_properties_rejected() {
        let err = TaxpayerFacts::from_json("landlord", &json!({"rental_income": 2000, "number_of_properties": 0}))
            .unwrap_err();
        assert_eq!(err.field(), Some("number_of_properties"));
    }

    #[test]
    fn test_non_boolean_flag_rejected() {
        let err = TaxpayerFacts::from_json("landlord", &json!({"rental_income": 2000, "is_furnished": "yes"}))
            .unwrap_err();
        assert_eq!(err.field(), Some("is_furnished"));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let err = TaxpayerFacts::from_json("sole_trader", &json!({"trading_income": 5000, "expenses": -1}))
            .unwrap_err();
        assert_eq!(err.field(), Some("allowable_expenses"));
    }

    #[test]
    fn test_tagged_round_trip() {
        let facts: TaxpayerFacts =
            serde_json::from_value(json!({"archetype": "sole_trader", "trading_income": "800"})).unwrap();
        assert_eq!(facts.archetype(), Archetype::SoleTrader);
    }
}
