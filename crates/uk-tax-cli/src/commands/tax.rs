use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use uk_tax_core::capital_gains::{self, CapitalGainsInput};
use uk_tax_core::corporation_tax::{self, CorporationTaxInput};
use uk_tax_core::dividend_tax::{self, DividendTaxInput};
use uk_tax_core::income_tax::{self, IncomeTaxInput, PayeInput};
use uk_tax_core::national_insurance::{self, NationalInsuranceInput};
use uk_tax_core::personal_tax::{self, IncomeSources, PersonalTaxInput};
use uk_tax_core::TaxYearSchedule;

use crate::input;

type CmdResult = Result<Value, Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Income tax and PAYE
// ---------------------------------------------------------------------------

/// Arguments for income tax on non-savings income
#[derive(Args)]
pub struct IncomeTaxArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Gross income for the year
    #[arg(long)]
    pub gross_income: Option<Decimal>,
}

pub fn run_income_tax(args: IncomeTaxArgs, schedule: &TaxYearSchedule) -> CmdResult {
    let req: IncomeTaxInput = match input::read_request(args.input.as_deref())? {
        Some(data) => input::parse_request(data, schedule)?,
        None => IncomeTaxInput {
            gross_income: args
                .gross_income
                .ok_or("--gross-income is required (or provide --input)")?,
            schedule: schedule.clone(),
        },
    };
    let result = income_tax::compute_income_tax(req.gross_income, &req.schedule)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a PAYE payslip view of an annual salary
#[derive(Args)]
pub struct PayeArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Annual gross salary
    #[arg(long)]
    pub gross_salary: Option<Decimal>,

    /// Net-pay pension deduction taken before income tax
    #[arg(long, default_value = "0")]
    pub pension_deduction: Decimal,
}

pub fn run_paye(args: PayeArgs, schedule: &TaxYearSchedule) -> CmdResult {
    let req: PayeInput = match input::read_request(args.input.as_deref())? {
        Some(data) => input::parse_request(data, schedule)?,
        None => PayeInput {
            gross_salary: args
                .gross_salary
                .ok_or("--gross-salary is required (or provide --input)")?,
            pension_deduction: args.pension_deduction,
            schedule: schedule.clone(),
        },
    };
    let result = income_tax::compute_paye(req.gross_salary, req.pension_deduction, &req.schedule)?;
    Ok(serde_json::to_value(result)?)
}

// ---------------------------------------------------------------------------
// National Insurance
// ---------------------------------------------------------------------------

/// Arguments for Class 1 or Class 4 National Insurance
#[derive(Args)]
pub struct NationalInsuranceArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Salary, or trading profit with --self-employed
    #[arg(long)]
    pub gross_income: Option<Decimal>,

    /// Employer secondary contributions instead of the employee's
    #[arg(long, conflicts_with = "self_employed")]
    pub employer: bool,

    /// Class 4 contributions on trading profit
    #[arg(long)]
    pub self_employed: bool,
}

pub fn run_national_insurance(args: NationalInsuranceArgs, schedule: &TaxYearSchedule) -> CmdResult {
    let req: NationalInsuranceInput = match input::read_request(args.input.as_deref())? {
        Some(data) => input::parse_request(data, schedule)?,
        None => NationalInsuranceInput {
            gross_income: args
                .gross_income
                .ok_or("--gross-income is required (or provide --input)")?,
            is_employer: args.employer,
            self_employed: args.self_employed,
            schedule: schedule.clone(),
        },
    };
    if req.is_employer && req.self_employed {
        return Err("is_employer and self_employed cannot both be set".into());
    }
    let result = if req.self_employed {
        national_insurance::compute_self_employed_ni(req.gross_income, &req.schedule)?
    } else {
        national_insurance::compute_national_insurance(req.gross_income, &req.schedule, req.is_employer)?
    };
    Ok(serde_json::to_value(result)?)
}

// ---------------------------------------------------------------------------
// Dividends, corporation tax, capital gains
// ---------------------------------------------------------------------------

/// Arguments for dividend tax stacked on other income
#[derive(Args)]
pub struct DividendTaxArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Dividends received in the year
    #[arg(long)]
    pub dividends: Option<Decimal>,

    /// Non-dividend income taxed first
    #[arg(long, default_value = "0")]
    pub other_income: Decimal,
}

pub fn run_dividend_tax(args: DividendTaxArgs, schedule: &TaxYearSchedule) -> CmdResult {
    let req: DividendTaxInput = match input::read_request(args.input.as_deref())? {
        Some(data) => input::parse_request(data, schedule)?,
        None => DividendTaxInput {
            dividends: args
                .dividends
                .ok_or("--dividends is required (or provide --input)")?,
            other_income: args.other_income,
            schedule: schedule.clone(),
        },
    };
    let result = dividend_tax::compute_dividend_tax(req.dividends, req.other_income, &req.schedule)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for corporation tax on company profit
#[derive(Args)]
pub struct CorporationTaxArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Taxable company profit
    #[arg(long)]
    pub profit: Option<Decimal>,
}

pub fn run_corporation_tax(args: CorporationTaxArgs, schedule: &TaxYearSchedule) -> CmdResult {
    let req: CorporationTaxInput = match input::read_request(args.input.as_deref())? {
        Some(data) => input::parse_request(data, schedule)?,
        None => CorporationTaxInput {
            profit: args.profit.ok_or("--profit is required (or provide --input)")?,
            schedule: schedule.clone(),
        },
    };
    let result = corporation_tax::compute_corporation_tax(req.profit, &req.schedule)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for capital gains tax
#[derive(Args)]
pub struct CapitalGainsArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Total chargeable gains before the annual exempt amount
    #[arg(long)]
    pub gains: Option<Decimal>,

    /// Income that uses up the basic rate band first
    #[arg(long, default_value = "0")]
    pub other_income: Decimal,

    /// Gains arise on residential property
    #[arg(long)]
    pub residential: bool,
}

pub fn run_capital_gains(args: CapitalGainsArgs, schedule: &TaxYearSchedule) -> CmdResult {
    let req: CapitalGainsInput = match input::read_request(args.input.as_deref())? {
        Some(data) => input::parse_request(data, schedule)?,
        None => CapitalGainsInput {
            gains: args.gains.ok_or("--gains is required (or provide --input)")?,
            other_income: args.other_income,
            is_residential_property: args.residential,
            schedule: schedule.clone(),
        },
    };
    let result = capital_gains::compute_capital_gains_tax(
        req.gains,
        req.other_income,
        req.is_residential_property,
        &req.schedule,
    )?;
    Ok(serde_json::to_value(result)?)
}

// ---------------------------------------------------------------------------
// Personal total
// ---------------------------------------------------------------------------

/// Arguments for one person's total tax across income sources
#[derive(Args)]
pub struct PersonalTaxArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long, default_value = "0")]
    pub salary: Decimal,

    #[arg(long, default_value = "0")]
    pub self_employment_profit: Decimal,

    /// Other non-savings income with no NI, e.g. rental profit
    #[arg(long, default_value = "0")]
    pub other_income: Decimal,

    #[arg(long, default_value = "0")]
    pub dividends: Decimal,

    /// Personal pension contribution deducted before income tax
    #[arg(long, default_value = "0")]
    pub pension_contribution: Decimal,
}

pub fn run_personal_tax(args: PersonalTaxArgs, schedule: &TaxYearSchedule) -> CmdResult {
    let req: PersonalTaxInput = match input::read_request(args.input.as_deref())? {
        Some(data) => input::parse_request(data, schedule)?,
        None => PersonalTaxInput {
            income: IncomeSources {
                salary: args.salary,
                self_employment_profit: args.self_employment_profit,
                other_income: args.other_income,
                dividends: args.dividends,
                pension_contribution: args.pension_contribution,
            },
            schedule: schedule.clone(),
        },
    };
    let result = personal_tax::compute_personal_tax(&req.income, &req.schedule)?;
    Ok(serde_json::to_value(result)?)
}
