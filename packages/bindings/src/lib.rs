use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Serialize;

use uk_tax_core::capital_gains::{self, CapitalGainsInput};
use uk_tax_core::corporation_tax::{self, CorporationTaxInput};
use uk_tax_core::dividend_tax::{self, DividendTaxInput};
use uk_tax_core::income_tax::{self, IncomeTaxInput, PayeInput};
use uk_tax_core::national_insurance::{self, NationalInsuranceInput};
use uk_tax_core::optimizer::{self, OptimizeRequest};
use uk_tax_core::personal_tax::{self, PersonalTaxInput};
use uk_tax_core::reliefs::{
    self, AllowanceInput, CapitalAllowancesInput, PensionReliefInput, RdReliefInput,
};
use uk_tax_core::{TaxYear, TaxYearSchedule};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn to_json<T: Serialize>(output: &T) -> NapiResult<String> {
    serde_json::to_string(output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Personal taxes
// ---------------------------------------------------------------------------

#[napi]
pub fn income_tax(input_json: String) -> NapiResult<String> {
    let input: IncomeTaxInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = income_tax::compute_income_tax(input.gross_income, &input.schedule)
        .map_err(to_napi_error)?;
    to_json(&output)
}

#[napi]
pub fn paye(input_json: String) -> NapiResult<String> {
    let input: PayeInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = income_tax::compute_paye(input.gross_salary, input.pension_deduction, &input.schedule)
        .map_err(to_napi_error)?;
    to_json(&output)
}

#[napi]
pub fn national_insurance(input_json: String) -> NapiResult<String> {
    let input: NationalInsuranceInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    if input.is_employer && input.self_employed {
        return Err(to_napi_error("is_employer and self_employed cannot both be set"));
    }
    let output = if input.self_employed {
        national_insurance::compute_self_employed_ni(input.gross_income, &input.schedule)
    } else {
        national_insurance::compute_national_insurance(input.gross_income, &input.schedule, input.is_employer)
    }
    .map_err(to_napi_error)?;
    to_json(&output)
}

#[napi]
pub fn dividend_tax(input_json: String) -> NapiResult<String> {
    let input: DividendTaxInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = dividend_tax::compute_dividend_tax(input.dividends, input.other_income, &input.schedule)
        .map_err(to_napi_error)?;
    to_json(&output)
}

#[napi]
pub fn capital_gains_tax(input_json: String) -> NapiResult<String> {
    let input: CapitalGainsInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = capital_gains::compute_capital_gains_tax(
        input.gains,
        input.other_income,
        input.is_residential_property,
        &input.schedule,
    )
    .map_err(to_napi_error)?;
    to_json(&output)
}

#[napi]
pub fn personal_tax(input_json: String) -> NapiResult<String> {
    let input: PersonalTaxInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = personal_tax::compute_personal_tax(&input.income, &input.schedule)
        .map_err(to_napi_error)?;
    to_json(&output)
}

// ---------------------------------------------------------------------------
// Company
// ---------------------------------------------------------------------------

#[napi]
pub fn corporation_tax(input_json: String) -> NapiResult<String> {
    let input: CorporationTaxInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = corporation_tax::compute_corporation_tax(input.profit, &input.schedule)
        .map_err(to_napi_error)?;
    to_json(&output)
}

// ---------------------------------------------------------------------------
// Reliefs
// ---------------------------------------------------------------------------

#[napi]
pub fn trading_allowance(input_json: String) -> NapiResult<String> {
    let input: AllowanceInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = reliefs::compute_trading_allowance(input.income, input.expenses, &input.schedule)
        .map_err(to_napi_error)?;
    to_json(&output)
}

#[napi]
pub fn property_allowance(input_json: String) -> NapiResult<String> {
    let input: AllowanceInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = reliefs::compute_property_allowance(input.income, input.expenses, &input.schedule)
        .map_err(to_napi_error)?;
    to_json(&output)
}

#[napi]
pub fn pension_relief(input_json: String) -> NapiResult<String> {
    let input: PensionReliefInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = reliefs::compute_pension_relief(input.contribution, input.income, &input.schedule)
        .map_err(to_napi_error)?;
    to_json(&output)
}

#[napi]
pub fn rd_relief(input_json: String) -> NapiResult<String> {
    let input: RdReliefInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = reliefs::compute_rd_relief(input.expenditure, input.company_profit, &input.schedule)
        .map_err(to_napi_error)?;
    to_json(&output)
}

#[napi]
pub fn capital_allowances(input_json: String) -> NapiResult<String> {
    let input: CapitalAllowancesInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = reliefs::compute_capital_allowances(input.spend, input.company_profit, &input.schedule)
        .map_err(to_napi_error)?;
    to_json(&output)
}

// ---------------------------------------------------------------------------
// Optimiser and schedules
// ---------------------------------------------------------------------------

#[napi]
pub fn optimize(input_json: String) -> NapiResult<String> {
    let value: serde_json::Value = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let request = OptimizeRequest::from_json(&value).map_err(to_napi_error)?;
    let output = optimizer::optimize(&request.facts, &request.schedule, &request.settings)
        .map_err(to_napi_error)?;
    to_json(&output)
}

/// Built-in schedule for a tax year label such as `2025-26`.
#[napi]
pub fn tax_year_schedule(tax_year: String) -> NapiResult<String> {
    let year: TaxYear = tax_year.parse().map_err(to_napi_error)?;
    let schedule = TaxYearSchedule::for_tax_year(year).map_err(to_napi_error)?;
    to_json(&schedule)
}
