use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use uk_tax_core::reliefs::{
    self, AllowanceInput, CapitalAllowancesInput, PensionReliefInput, RdReliefInput,
};
use uk_tax_core::TaxYearSchedule;

use crate::input;

type CmdResult = Result<Value, Box<dyn std::error::Error>>;

/// Arguments for comparing the trading or property allowance with expenses
#[derive(Args)]
pub struct AllowanceArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Gross trading or rental receipts
    #[arg(long)]
    pub income: Option<Decimal>,

    /// Itemised allowable expenses
    #[arg(long, default_value = "0")]
    pub expenses: Decimal,
}

fn allowance_request(args: AllowanceArgs, schedule: &TaxYearSchedule) -> Result<AllowanceInput, Box<dyn std::error::Error>> {
    Ok(match input::read_request(args.input.as_deref())? {
        Some(data) => input::parse_request(data, schedule)?,
        None => AllowanceInput {
            income: args.income.ok_or("--income is required (or provide --input)")?,
            expenses: args.expenses,
            schedule: schedule.clone(),
        },
    })
}

pub fn run_trading_allowance(args: AllowanceArgs, schedule: &TaxYearSchedule) -> CmdResult {
    let req = allowance_request(args, schedule)?;
    let result = reliefs::compute_trading_allowance(req.income, req.expenses, &req.schedule)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_property_allowance(args: AllowanceArgs, schedule: &TaxYearSchedule) -> CmdResult {
    let req = allowance_request(args, schedule)?;
    let result = reliefs::compute_property_allowance(req.income, req.expenses, &req.schedule)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for relief on a personal pension contribution
#[derive(Args)]
pub struct PensionReliefArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub contribution: Option<Decimal>,

    /// Income that sets the marginal rate
    #[arg(long)]
    pub income: Option<Decimal>,
}

pub fn run_pension_relief(args: PensionReliefArgs, schedule: &TaxYearSchedule) -> CmdResult {
    let req: PensionReliefInput = match input::read_request(args.input.as_deref())? {
        Some(data) => input::parse_request(data, schedule)?,
        None => PensionReliefInput {
            contribution: args
                .contribution
                .ok_or("--contribution is required (or provide --input)")?,
            income: args.income.ok_or("--income is required (or provide --input)")?,
            schedule: schedule.clone(),
        },
    };
    let result = reliefs::compute_pension_relief(req.contribution, req.income, &req.schedule)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for SME R&D enhanced deduction
#[derive(Args)]
pub struct RdReliefArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Qualifying R&D expenditure
    #[arg(long)]
    pub expenditure: Option<Decimal>,

    /// Company profit, which sets the corporation tax rate applied
    #[arg(long)]
    pub company_profit: Option<Decimal>,
}

pub fn run_rd_relief(args: RdReliefArgs, schedule: &TaxYearSchedule) -> CmdResult {
    let req: RdReliefInput = match input::read_request(args.input.as_deref())? {
        Some(data) => input::parse_request(data, schedule)?,
        None => RdReliefInput {
            expenditure: args
                .expenditure
                .ok_or("--expenditure is required (or provide --input)")?,
            company_profit: args
                .company_profit
                .ok_or("--company-profit is required (or provide --input)")?,
            schedule: schedule.clone(),
        },
    };
    let result = reliefs::compute_rd_relief(req.expenditure, req.company_profit, &req.schedule)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the Annual Investment Allowance
#[derive(Args)]
pub struct CapitalAllowancesArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Qualifying plant and machinery spend
    #[arg(long)]
    pub spend: Option<Decimal>,

    /// Company profit, which sets the corporation tax rate applied
    #[arg(long)]
    pub company_profit: Option<Decimal>,
}

pub fn run_capital_allowances(args: CapitalAllowancesArgs, schedule: &TaxYearSchedule) -> CmdResult {
    let req: CapitalAllowancesInput = match input::read_request(args.input.as_deref())? {
        Some(data) => input::parse_request(data, schedule)?,
        None => CapitalAllowancesInput {
            spend: args.spend.ok_or("--spend is required (or provide --input)")?,
            company_profit: args
                .company_profit
                .ok_or("--company-profit is required (or provide --input)")?,
            schedule: schedule.clone(),
        },
    };
    let result = reliefs::compute_capital_allowances(req.spend, req.company_profit, &req.schedule)?;
    Ok(serde_json::to_value(result)?)
}
