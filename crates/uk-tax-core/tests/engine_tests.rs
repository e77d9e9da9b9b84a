use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uk_tax_core::bands::{compute_progressive_tax, TaxBand};
use uk_tax_core::corporation_tax::{compute_corporation_tax, CorporationTaxRegime};
use uk_tax_core::dividend_tax::compute_dividend_tax;
use uk_tax_core::income_tax::{compute_income_tax, compute_paye};
use uk_tax_core::national_insurance::{compute_national_insurance, compute_self_employed_ni};
use uk_tax_core::personal_tax::{compute_personal_tax, IncomeSources};
use uk_tax_core::schedule::ScheduleParams;
use uk_tax_core::{TaxError, TaxYear, TaxYearSchedule};

fn schedule() -> TaxYearSchedule {
    TaxYearSchedule::uk_2025_26()
}

// ===========================================================================
// Income tax
// ===========================================================================

#[test]
fn test_income_tax_boundaries() {
    let s = schedule();
    let pa = s.income_tax().personal_allowance;

    assert_eq!(compute_income_tax(Decimal::ZERO, &s).unwrap().result.income_tax, Decimal::ZERO);
    assert_eq!(compute_income_tax(pa, &s).unwrap().result.income_tax, Decimal::ZERO);
    assert_eq!(
        compute_income_tax(pa + Decimal::ONE, &s).unwrap().result.income_tax,
        s.income_tax().basic_rate
    );
}

#[test]
fn test_income_tax_at_taper_start() {
    // 7,540 + (87,430 - 37,700) * 40% = 27,432
    let out = compute_income_tax(dec!(100_000), &schedule()).unwrap();
    assert_eq!(out.result.personal_allowance, dec!(12_570));
    assert_eq!(out.result.income_tax, dec!(27_432));
    assert!(out.warnings.is_empty());
}

#[test]
fn test_income_tax_breakdown_sums() {
    let out = compute_income_tax(dec!(200_000), &schedule()).unwrap().result;
    let amounts: Decimal = out.breakdown.iter().map(|s| s.amount).sum();
    let taxes: Decimal = out.breakdown.iter().map(|s| s.tax).sum();
    assert_eq!(amounts, out.taxable_income);
    assert_eq!(taxes, out.income_tax);
}

#[test]
fn test_paye_net_pay_reconciles() {
    let out = compute_paye(dec!(55_000), dec!(3_000), &schedule()).unwrap().result;
    assert_eq!(
        out.net_pay + out.income_tax + out.employee_ni + out.pension_deduction,
        out.gross_salary
    );
}

// ===========================================================================
// National Insurance
// ===========================================================================

#[test]
fn test_ni_at_thresholds() {
    let s = schedule();
    let at_pt = compute_national_insurance(dec!(12_570), &s, false).unwrap().result;
    assert_eq!(at_pt.contribution, Decimal::ZERO);

    // 37,700 * 8% = 3,016
    let at_uel = compute_national_insurance(dec!(50_270), &s, false).unwrap().result;
    assert_eq!(at_uel.contribution, dec!(3_016));
    assert_eq!(at_uel.upper_band_earnings, Decimal::ZERO);
}

#[test]
fn test_class4_above_uel() {
    // 37,700 * 6% + 9,730 * 2% = 2,262 + 194.60
    let out = compute_self_employed_ni(dec!(60_000), &schedule()).unwrap().result;
    assert_eq!(out.contribution, dec!(2_456.60));
}

// ===========================================================================
// Dividend tax
// ===========================================================================

#[test]
fn test_dividends_spanning_all_bands() {
    // other 50,000 -> taxable 37,430; basic left 270
    // taxable dividends 99,500: 270 basic, 87,440 higher, 11,790 additional
    let out = compute_dividend_tax(dec!(100_000), dec!(50_000), &schedule()).unwrap().result;
    let b = &out.breakdown_by_band;
    assert_eq!(b.basic.amount, dec!(270));
    assert_eq!(b.higher.amount, dec!(87_440));
    assert_eq!(b.additional.amount, dec!(11_790));
    assert_eq!(b.basic.amount + b.higher.amount + b.additional.amount, out.taxable_dividends);
}

#[test]
fn test_dividends_with_tapered_other_income() {
    // other 110,000 -> allowance 7,570, taxable 102,430; all higher capacity left is 22,710
    let out = compute_dividend_tax(dec!(10_500), dec!(110_000), &schedule()).unwrap().result;
    assert_eq!(out.other_income_taxable, dec!(102_430));
    assert_eq!(out.breakdown_by_band.higher.amount, dec!(10_000));
    assert_eq!(out.dividend_tax, dec!(3_375));
}

// ===========================================================================
// Corporation tax
// ===========================================================================

#[test]
fn test_corporation_tax_regimes_at_limits() {
    let s = schedule();
    let lower = compute_corporation_tax(dec!(50_000), &s).unwrap().result;
    assert_eq!(lower.regime, CorporationTaxRegime::SmallProfits);
    assert_eq!(lower.tax, dec!(9_500));

    let upper = compute_corporation_tax(dec!(250_000), &s).unwrap().result;
    assert_eq!(upper.regime, CorporationTaxRegime::MainRate);
    assert_eq!(upper.tax, dec!(62_500));
}

#[test]
fn test_discontinuous_fraction_warns() {
    let mut params: ScheduleParams = schedule().params().clone();
    params.corporation_tax.marginal_relief_fraction = dec!(0.01);
    let s = TaxYearSchedule::new(params).unwrap();
    assert!(!s.marginal_relief_is_continuous());

    let out = compute_corporation_tax(dec!(100_000), &s).unwrap();
    assert_eq!(out.warnings.len(), 1);
    // 25,000 - 150,000 * 1% = 23,500
    assert_eq!(out.result.tax, dec!(23_500));
}

// ===========================================================================
// Progressive bands
// ===========================================================================

#[test]
fn test_custom_band_table() {
    let bands = vec![
        TaxBand::new("starter", Some(dec!(2_000)), dec!(0.10)),
        TaxBand::new("main", None, dec!(0.30)),
    ];
    let calc = compute_progressive_tax(dec!(10_000), dec!(1_000), &bands).unwrap();
    // 2,000 @ 10% + 7,000 @ 30%
    assert_eq!(calc.total_tax, dec!(2_300));
}

// ===========================================================================
// Personal liability and schedules
// ===========================================================================

#[test]
fn test_personal_tax_matches_engines() {
    let s = schedule();
    let income = IncomeSources {
        salary: dec!(45_000),
        dividends: dec!(8_000),
        ..Default::default()
    };
    let total = compute_personal_tax(&income, &s).unwrap().result;
    let it = compute_income_tax(dec!(45_000), &s).unwrap().result;
    let ni = compute_national_insurance(dec!(45_000), &s, false).unwrap().result;
    let div = compute_dividend_tax(dec!(8_000), dec!(45_000), &s).unwrap().result;
    assert_eq!(total.total_tax, it.income_tax + ni.contribution + div.dividend_tax);
}

#[test]
fn test_schedules_differ_between_years() {
    let older = TaxYearSchedule::for_tax_year(TaxYear(2025)).unwrap();
    let newer = TaxYearSchedule::for_tax_year(TaxYear(2026)).unwrap();
    let a = compute_national_insurance(dec!(40_000), &older, true).unwrap().result;
    let b = compute_national_insurance(dec!(40_000), &newer, true).unwrap().result;
    // (40,000 - 9,100) * 13.8% = 4,264.20; (40,000 - 5,000) * 15% = 5,250
    assert_eq!(a.contribution, dec!(4_264.20));
    assert_eq!(b.contribution, dec!(5_250));
}

#[test]
fn test_schedule_loaded_from_json_is_validated() {
    let mut value = serde_json::to_value(schedule()).unwrap();
    value["corporation_tax"]["lower_limit"] = serde_json::json!("300000");
    let err = serde_json::from_value::<TaxYearSchedule>(value).unwrap_err();
    assert!(err.to_string().contains("corporation_tax"));
}

#[test]
fn test_negative_inputs_rejected_everywhere() {
    let s = schedule();
    let neg = dec!(-0.01);
    let errors: Vec<TaxError> = vec![
        compute_income_tax(neg, &s).unwrap_err(),
        compute_national_insurance(neg, &s, false).unwrap_err(),
        compute_dividend_tax(neg, Decimal::ZERO, &s).unwrap_err(),
        compute_corporation_tax(neg, &s).unwrap_err(),
        compute_paye(neg, Decimal::ZERO, &s).unwrap_err(),
    ];
    for err in errors {
        assert!(matches!(err, TaxError::InvalidInput { .. }), "unexpected {err:?}");
    }
}
