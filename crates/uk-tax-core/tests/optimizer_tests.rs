use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use uk_tax_core::corporation_tax::compute_corporation_tax;
use uk_tax_core::dividend_tax::compute_dividend_tax;
use uk_tax_core::income_tax::compute_income_tax;
use uk_tax_core::national_insurance::compute_national_insurance;
use uk_tax_core::optimizer::{
    optimize, Archetype, ArchetypeAnalysis, OptimizeRequest, OptimizerSettings, Priority, ProfitMethod,
    TaxpayerFacts,
};
use uk_tax_core::{TaxError, TaxYearSchedule};

/// 2025/26 constants, except that the small profits rate covers profits up
/// to £100,000 (fraction chosen so the relief band stays continuous).
fn small_profits_schedule() -> TaxYearSchedule {
    let mut params = TaxYearSchedule::uk_2025_26().params().clone();
    params.corporation_tax.lower_limit = dec!(100_000);
    params.corporation_tax.marginal_relief_fraction = dec!(0.04);
    TaxYearSchedule::new(params).unwrap()
}

fn run(archetype: &str, facts: serde_json::Value, schedule: &TaxYearSchedule) -> uk_tax_core::ComputationOutput<uk_tax_core::optimizer::OptimizationOutput> {
    let facts = TaxpayerFacts::from_json(archetype, &facts).unwrap();
    optimize(&facts, schedule, &OptimizerSettings::default()).unwrap()
}

// ===========================================================================
// Scenario A: director
// ===========================================================================

#[test]
fn test_director_current_equals_sum_of_engines() {
    let s = small_profits_schedule();
    assert!(s.marginal_relief_is_continuous());
    let out = run(
        "director",
        json!({"salary": 30000, "dividends": 20000, "company_profit": 60000, "pension_contribution": 0}),
        &s,
    )
    .result;

    let it = compute_income_tax(dec!(30_000), &s).unwrap().result.income_tax;
    let ni = compute_national_insurance(dec!(30_000), &s, false).unwrap().result.contribution;
    let div = compute_dividend_tax(dec!(20_000), dec!(30_000), &s).unwrap().result.dividend_tax;
    let ct = compute_corporation_tax(dec!(60_000), &s).unwrap().result.tax;
    assert_eq!(ct, dec!(11_400));
    assert_eq!(out.current.total_tax, it + ni + div + ct);
    assert_eq!(out.current.total_tax, dec!(17_986.65));

    assert!(out.optimal.total_tax <= out.current.total_tax);
    assert_eq!(out.saving, out.current.total_tax - out.optimal.total_tax);
    assert_eq!(out.archetype, Archetype::Director);
}

#[test]
fn test_director_recommendations_ranked() {
    let out = run(
        "director",
        json!({"salary": 30000, "dividends": 20000, "company_profit": 60000}),
        &TaxYearSchedule::default(),
    )
    .result;
    let priorities: Vec<Priority> = out.recommendations.iter().map(|r| r.priority).collect();
    let mut sorted = priorities.clone();
    sorted.sort();
    assert_eq!(priorities, sorted);
    assert_eq!(out.recommendations[0].strategy, "Optimise salary/dividend split");
}

// ===========================================================================
// Scenario B: sole trader
// ===========================================================================

#[test]
fn test_sole_trader_small_income_uses_trading_allowance() {
    let out = run(
        "sole_trader",
        json!({"trading_income": 800, "expenses": 0}),
        &TaxYearSchedule::default(),
    )
    .result;
    match &out.analysis {
        ArchetypeAnalysis::SoleTrader(a) => {
            assert_eq!(a.selected_method, ProfitMethod::TradingAllowance);
            assert_eq!(a.taxable_profit, Decimal::ZERO);
        }
        other => panic!("unexpected analysis {other:?}"),
    }
    assert_eq!(out.optimal.candidate.trading_profit, Decimal::ZERO);
}

// ===========================================================================
// Scenario C: landlord
// ===========================================================================

#[test]
fn test_landlord_small_rent_uses_property_allowance() {
    let out = run(
        "landlord",
        json!({"rental_income": 2000, "mortgage_interest": 0, "other_expenses": 0}),
        &TaxYearSchedule::default(),
    )
    .result;
    match &out.analysis {
        ArchetypeAnalysis::Landlord(a) => {
            assert!(a.use_property_allowance);
            assert_eq!(a.taxable_income, dec!(1_000));
        }
        other => panic!("unexpected analysis {other:?}"),
    }
}

// ===========================================================================
// Company owner and validation
// ===========================================================================

#[test]
fn test_company_owner_negative_saving_is_reported() {
    // Extracting all profit as dividends costs more than the modest current draw.
    let out = run(
        "company_owner",
        json!({"company_profit": 200000, "salary": 12570, "dividends": 10000}),
        &TaxYearSchedule::default(),
    );
    assert!(out.result.saving < Decimal::ZERO);
    assert!(out.warnings.iter().any(|w| w.contains("more tax")));
}

#[test]
fn test_request_parsing_with_schedule_override() {
    let schedule = serde_json::to_value(TaxYearSchedule::uk_2024_25()).unwrap();
    let req = OptimizeRequest::from_json(&json!({
        "archetype": "director",
        "salary": 12570,
        "dividends": 0,
        "company_profit": 30000,
        "schedule": schedule
    }))
    .unwrap();
    assert_eq!(req.schedule.label(), "2024/25");
    let out = optimize(&req.facts, &req.schedule, &req.settings).unwrap();
    match out.result.analysis {
        ArchetypeAnalysis::Director(a) => {
            // (12,570 - 9,100) * 13.8% = 478.86
            assert_eq!(a.employer_ni_optimal, dec!(478.86));
        }
        other => panic!("unexpected analysis {other:?}"),
    }
}

#[test]
fn test_negative_facts_rejected_before_computation() {
    let err = TaxpayerFacts::from_json(
        "director",
        &json!({"salary": -1, "dividends": 0, "company_profit": 0}),
    )
    .unwrap_err();
    assert_eq!(
        err,
        TaxError::InvalidInput {
            field: "salary".into(),
            reason: "must be non-negative, got -1".into(),
        }
    );
}

#[test]
fn test_missing_required_field_rejected() {
    let err = TaxpayerFacts::from_json("director", &json!({"salary": 1, "dividends": 0})).unwrap_err();
    assert_eq!(err.field(), Some("company_profit"));
}

#[test]
fn test_optimize_is_repeatable() {
    let facts = TaxpayerFacts::from_json(
        "landlord",
        &json!({"rental_income": 25000, "mortgage_interest": 6000, "other_expenses": 3000, "number_of_properties": 4, "other_income": 45000}),
    )
    .unwrap();
    let s = TaxYearSchedule::default();
    let settings = OptimizerSettings::default();
    let a = optimize(&facts, &s, &settings).unwrap().result;
    let b = optimize(&facts, &s, &settings).unwrap().result;
    assert_eq!(a, b);
}
