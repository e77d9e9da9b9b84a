mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::optimize::OptimizeArgs;
use commands::reliefs::{AllowanceArgs, CapitalAllowancesArgs, PensionReliefArgs, RdReliefArgs};
use commands::tax::{
    CapitalGainsArgs, CorporationTaxArgs, DividendTaxArgs, IncomeTaxArgs, NationalInsuranceArgs,
    PayeArgs, PersonalTaxArgs,
};

/// UK tax liabilities and allocation planning
#[derive(Parser)]
#[command(
    name = "ukt",
    version,
    about = "UK tax liabilities and allocation planning",
    long_about = "Computes UK income tax, National Insurance, dividend, corporation \
                  and capital gains tax from a versioned tax-year schedule, and \
                  compares current and optimal income allocations for directors, \
                  sole traders, company owners and landlords."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Built-in schedule for a tax year, e.g. 2025-26
    #[arg(long, global = true)]
    tax_year: Option<String>,

    /// Schedule file (JSON or YAML); takes precedence over --tax-year
    #[arg(long, global = true)]
    schedule: Option<String>,

    /// Debug logging to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Income tax on non-savings income, with allowance taper
    IncomeTax(IncomeTaxArgs),
    /// Payroll view: income tax, employee NI and net pay
    Paye(PayeArgs),
    /// Class 1 (employee or employer) or Class 4 National Insurance
    NationalInsurance(NationalInsuranceArgs),
    /// Dividend tax stacked on other income
    DividendTax(DividendTaxArgs),
    /// Corporation tax with marginal relief
    CorporationTax(CorporationTaxArgs),
    /// Capital gains tax
    CapitalGains(CapitalGainsArgs),
    /// Total personal tax across income sources
    PersonalTax(PersonalTaxArgs),
    /// Trading allowance versus itemised expenses
    TradingAllowance(AllowanceArgs),
    /// Property allowance versus itemised expenses
    PropertyAllowance(AllowanceArgs),
    /// Relief on a personal pension contribution
    PensionRelief(PensionReliefArgs),
    /// SME R&D enhanced deduction
    RdRelief(RdReliefArgs),
    /// Annual Investment Allowance claim
    CapitalAllowances(CapitalAllowancesArgs),
    /// Compare current and optimal allocation for a taxpayer archetype
    Optimize(OptimizeArgs),
    /// Print the active tax-year schedule
    Schedule,
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    if let Commands::Version = cli.command {
        println!("ukt {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let schedule = match input::schedule::resolve_schedule(cli.tax_year.as_deref(), cli.schedule.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };
    tracing::debug!(tax_year = schedule.label(), "schedule resolved");

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::IncomeTax(args) => commands::tax::run_income_tax(args, &schedule),
        Commands::Paye(args) => commands::tax::run_paye(args, &schedule),
        Commands::NationalInsurance(args) => commands::tax::run_national_insurance(args, &schedule),
        Commands::DividendTax(args) => commands::tax::run_dividend_tax(args, &schedule),
        Commands::CorporationTax(args) => commands::tax::run_corporation_tax(args, &schedule),
        Commands::CapitalGains(args) => commands::tax::run_capital_gains(args, &schedule),
        Commands::PersonalTax(args) => commands::tax::run_personal_tax(args, &schedule),
        Commands::TradingAllowance(args) => commands::reliefs::run_trading_allowance(args, &schedule),
        Commands::PropertyAllowance(args) => commands::reliefs::run_property_allowance(args, &schedule),
        Commands::PensionRelief(args) => commands::reliefs::run_pension_relief(args, &schedule),
        Commands::RdRelief(args) => commands::reliefs::run_rd_relief(args, &schedule),
        Commands::CapitalAllowances(args) => commands::reliefs::run_capital_allowances(args, &schedule),
        Commands::Optimize(args) => commands::optimize::run_optimize(args, &schedule),
        Commands::Schedule => commands::schedule::run_schedule(&schedule),
        Commands::Version => return,
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
