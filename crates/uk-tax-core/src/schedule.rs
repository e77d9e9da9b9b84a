//! Tax-year constants.
//!
//! A [`TaxYearSchedule`] is an immutable, validated snapshot of every
//! threshold and rate the engines read. It can only be obtained through a
//! validating path (`new`, a preset, or deserialisation), so engines never
//! see a schedule with non-monotonic thresholds or out-of-range rates.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TaxError;
use crate::types::{Money, Rate};
use crate::TaxResult;

// ---------------------------------------------------------------------------
// Tax year
// ---------------------------------------------------------------------------

/// UK tax year, identified by the calendar year in which it ends
/// (`TaxYear(2026)` is 2025/26, running 6 April 2025 to 5 April 2026).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaxYear(pub i32);

impl TaxYear {
    /// Tax year containing `date`. Years turn over on 6 April.
    pub fn from_date(date: NaiveDate) -> Self {
        let year = date.year();
        if (date.month(), date.day()) >= (4, 6) {
            TaxYear(year + 1)
        } else {
            TaxYear(year)
        }
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.0 - 1, 4, 6)
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.0, 4, 5)
    }
}

impl fmt::Display for TaxYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:02}", self.0 - 1, self.0.rem_euclid(100))
    }
}

impl FromStr for TaxYear {
    type Err = TaxError;

    /// Accepts `2025/26`, `2025-26` or the bare ending year `2026`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            TaxError::invalid_input(
                "tax_year",
                format!("'{s}' is not a tax year (expected e.g. 2025-26)"),
            )
        };
        let trimmed = s.trim();
        match trimmed.split_once(['/', '-']) {
            Some((start, end)) => {
                let start: i32 = start.parse().map_err(|_| invalid())?;
                let end: i32 = end.parse().map_err(|_| invalid())?;
                if (start + 1).rem_euclid(100) != end.rem_euclid(100) {
                    return Err(invalid());
                }
                Ok(TaxYear(start + 1))
            }
            None => trimmed.parse().map(TaxYear).map_err(|_| invalid()),
        }
    }
}

// ---------------------------------------------------------------------------
// Parameter groups
// ---------------------------------------------------------------------------

/// Income tax allowance, thresholds and rates.
///
/// Thresholds are expressed on gross income assuming the full personal
/// allowance, as HMRC publishes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeTaxRates {
    pub personal_allowance: Money,
    /// Income above which the allowance tapers by £1 per £2.
    pub taper_threshold: Money,
    pub basic_rate_threshold: Money,
    pub additional_rate_threshold: Money,
    pub basic_rate: Rate,
    pub higher_rate: Rate,
    pub additional_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NationalInsuranceRates {
    pub primary_threshold: Money,
    pub upper_earnings_limit: Money,
    /// Class 1 employee rate between the primary threshold and the UEL
    pub employee_main_rate: Rate,
    /// Class 1 employee rate above the UEL
    pub employee_upper_rate: Rate,
    pub secondary_threshold: Money,
    pub employer_rate: Rate,
    /// Class 4 (self-employed) rate between the primary threshold and the UEL
    pub class4_main_rate: Rate,
    pub class4_upper_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendRates {
    pub allowance: Money,
    pub basic_rate: Rate,
    pub higher_rate: Rate,
    pub additional_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorporationTaxRates {
    pub small_profits_rate: Rate,
    pub main_rate: Rate,
    pub lower_limit: Money,
    pub upper_limit: Money,
    /// Standard fraction for marginal relief (3/200 for FY2023 onwards)
    pub marginal_relief_fraction: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliefAllowances {
    pub trading_allowance: Money,
    pub property_allowance: Money,
    pub pension_annual_allowance: Money,
    pub annual_investment_allowance: Money,
    /// Extra deduction on qualifying SME R&D spend (0.86 = 186% total)
    pub rd_enhancement_rate: Rate,
    pub vat_registration_threshold: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalGainsRates {
    pub annual_exempt_amount: Money,
    pub basic_rate: Rate,
    pub higher_rate: Rate,
    pub residential_basic_rate: Rate,
    pub residential_higher_rate: Rate,
}

/// Raw, unvalidated schedule data. Turn into a [`TaxYearSchedule`] with
/// [`TaxYearSchedule::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleParams {
    /// Display label, e.g. "2025/26"
    pub tax_year: String,
    pub income_tax: IncomeTaxRates,
    pub national_insurance: NationalInsuranceRates,
    pub dividends: DividendRates,
    pub corporation_tax: CorporationTaxRates,
    pub allowances: ReliefAllowances,
    pub capital_gains: CapitalGainsRates,
}

// ---------------------------------------------------------------------------
// Validated schedule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScheduleParams", into = "ScheduleParams")]
pub struct TaxYearSchedule {
    params: ScheduleParams,
}

impl TaxYearSchedule {
    /// Validate `params` and freeze them into a schedule.
    pub fn new(params: ScheduleParams) -> TaxResult<Self> {
        validate_params(&params)?;
        Ok(TaxYearSchedule { params })
    }

    /// Preset for the tax year ending in `year`.
    pub fn for_tax_year(year: TaxYear) -> TaxResult<Self> {
        match year.0 {
            2025 => Ok(Self::uk_2024_25()),
            2026 => Ok(Self::uk_2025_26()),
            _ => Err(TaxError::invalid_input(
                "tax_year",
                format!("no built-in schedule for {year} (supported: 2024/25, 2025/26)"),
            )),
        }
    }

    /// 2024/25: employer NI 13.8% above £9,100; CGT 10%/20% on
    /// non-residential gains.
    pub fn uk_2024_25() -> Self {
        TaxYearSchedule {
            params: ScheduleParams {
                tax_year: "2024/25".into(),
                national_insurance: NationalInsuranceRates {
                    secondary_threshold: dec!(9_100),
                    employer_rate: dec!(0.138),
                    ..base_national_insurance()
                },
                capital_gains: CapitalGainsRates {
                    annual_exempt_amount: dec!(3_000),
                    basic_rate: dec!(0.10),
                    higher_rate: dec!(0.20),
                    residential_basic_rate: dec!(0.18),
                    residential_higher_rate: dec!(0.24),
                },
                ..base_params()
            },
        }
    }

    /// 2025/26: employer NI 15% above £5,000; CGT 18%/24% on all gains.
    pub fn uk_2025_26() -> Self {
        TaxYearSchedule {
            params: base_params(),
        }
    }

    pub fn label(&self) -> &str {
        &self.params.tax_year
    }

    pub fn income_tax(&self) -> &IncomeTaxRates {
        &self.params.income_tax
    }

    pub fn national_insurance(&self) -> &NationalInsuranceRates {
        &self.params.national_insurance
    }

    pub fn dividends(&self) -> &DividendRates {
        &self.params.dividends
    }

    pub fn corporation_tax(&self) -> &CorporationTaxRates {
        &self.params.corporation_tax
    }

    pub fn allowances(&self) -> &ReliefAllowances {
        &self.params.allowances
    }

    pub fn capital_gains(&self) -> &CapitalGainsRates {
        &self.params.capital_gains
    }

    pub fn params(&self) -> &ScheduleParams {
        &self.params
    }

    /// Whether the configured marginal relief fraction makes the corporation
    /// tax charge meet `lower_limit × small_profits_rate` exactly at the lower
    /// limit (within a penny).
    pub fn marginal_relief_is_continuous(&self) -> bool {
        let ct = &self.params.corporation_tax;
        let at_small_rate = ct.lower_limit * ct.small_profits_rate;
        let at_marginal = ct.lower_limit * ct.main_rate
            - (ct.upper_limit - ct.lower_limit) * ct.marginal_relief_fraction;
        (at_small_rate - at_marginal).abs() < dec!(0.01)
    }
}

impl Default for TaxYearSchedule {
    fn default() -> Self {
        Self::uk_2025_26()
    }
}

impl TryFrom<ScheduleParams> for TaxYearSchedule {
    type Error = TaxError;

    fn try_from(params: ScheduleParams) -> Result<Self, Self::Error> {
        TaxYearSchedule::new(params)
    }
}

impl From<TaxYearSchedule> for ScheduleParams {
    fn from(schedule: TaxYearSchedule) -> Self {
        schedule.params
    }
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

fn base_national_insurance() -> NationalInsuranceRates {
    NationalInsuranceRates {
        primary_threshold: dec!(12_570),
        upper_earnings_limit: dec!(50_270),
        employee_main_rate: dec!(0.08),
        employee_upper_rate: dec!(0.02),
        secondary_threshold: dec!(5_000),
        employer_rate: dec!(0.15),
        class4_main_rate: dec!(0.06),
        class4_upper_rate: dec!(0.02),
    }
}

fn base_params() -> ScheduleParams {
    ScheduleParams {
        tax_year: "2025/26".into(),
        income_tax: IncomeTaxRates {
            personal_allowance: dec!(12_570),
            taper_threshold: dec!(100_000),
            basic_rate_threshold: dec!(50_270),
            additional_rate_threshold: dec!(125_140),
            basic_rate: dec!(0.20),
            higher_rate: dec!(0.40),
            additional_rate: dec!(0.45),
        },
        national_insurance: base_national_insurance(),
        dividends: DividendRates {
            allowance: dec!(500),
            basic_rate: dec!(0.0875),
            higher_rate: dec!(0.3375),
            additional_rate: dec!(0.3935),
        },
        corporation_tax: CorporationTaxRates {
            small_profits_rate: dec!(0.19),
            main_rate: dec!(0.25),
            lower_limit: dec!(50_000),
            upper_limit: dec!(250_000),
            marginal_relief_fraction: dec!(0.015),
        },
        allowances: ReliefAllowances {
            trading_allowance: dec!(1_000),
            property_allowance: dec!(1_000),
            pension_annual_allowance: dec!(60_000),
            annual_investment_allowance: dec!(1_000_000),
            rd_enhancement_rate: dec!(0.86),
            vat_registration_threshold: dec!(90_000),
        },
        capital_gains: CapitalGainsRates {
            annual_exempt_amount: dec!(3_000),
            basic_rate: dec!(0.18),
            higher_rate: dec!(0.24),
            residential_basic_rate: dec!(0.18),
            residential_higher_rate: dec!(0.24),
        },
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_params(p: &ScheduleParams) -> TaxResult<()> {
    let it = &p.income_tax;
    let ni = &p.national_insurance;
    let dv = &p.dividends;
    let ct = &p.corporation_tax;
    let al = &p.allowances;
    let cg = &p.capital_gains;

    let amounts = [
        ("income_tax.personal_allowance", it.personal_allowance),
        ("income_tax.taper_threshold", it.taper_threshold),
        ("national_insurance.primary_threshold", ni.primary_threshold),
        ("national_insurance.secondary_threshold", ni.secondary_threshold),
        ("dividends.allowance", dv.allowance),
        ("corporation_tax.lower_limit", ct.lower_limit),
        ("allowances.trading_allowance", al.trading_allowance),
        ("allowances.property_allowance", al.property_allowance),
        ("allowances.pension_annual_allowance", al.pension_annual_allowance),
        ("allowances.annual_investment_allowance", al.annual_investment_allowance),
        ("allowances.rd_enhancement_rate", al.rd_enhancement_rate),
        ("allowances.vat_registration_threshold", al.vat_registration_threshold),
        ("capital_gains.annual_exempt_amount", cg.annual_exempt_amount),
    ];
    for (field, value) in amounts {
        if value < Decimal::ZERO {
            return Err(TaxError::invalid_schedule(field, "cannot be negative"));
        }
    }

    let rates = [
        ("income_tax.basic_rate", it.basic_rate),
        ("income_tax.higher_rate", it.higher_rate),
        ("income_tax.additional_rate", it.additional_rate),
        ("national_insurance.employee_main_rate", ni.employee_main_rate),
        ("national_insurance.employee_upper_rate", ni.employee_upper_rate),
        ("national_insurance.employer_rate", ni.employer_rate),
        ("national_insurance.class4_main_rate", ni.class4_main_rate),
        ("national_insurance.class4_upper_rate", ni.class4_upper_rate),
        ("dividends.basic_rate", dv.basic_rate),
        ("dividends.higher_rate", dv.higher_rate),
        ("dividends.additional_rate", dv.additional_rate),
        ("corporation_tax.small_profits_rate", ct.small_profits_rate),
        ("corporation_tax.main_rate", ct.main_rate),
        ("corporation_tax.marginal_relief_fraction", ct.marginal_relief_fraction),
        ("capital_gains.basic_rate", cg.basic_rate),
        ("capital_gains.higher_rate", cg.higher_rate),
        ("capital_gains.residential_basic_rate", cg.residential_basic_rate),
        ("capital_gains.residential_higher_rate", cg.residential_higher_rate),
    ];
    for (field, rate) in rates {
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(TaxError::invalid_schedule(
                field,
                format!("rate must be between 0 and 1, got {rate}"),
            ));
        }
    }

    if it.basic_rate_threshold <= it.personal_allowance {
        return Err(TaxError::invalid_schedule(
            "income_tax.basic_rate_threshold",
            "must exceed the personal allowance",
        ));
    }
    if it.additional_rate_threshold <= it.basic_rate_threshold {
        return Err(TaxError::invalid_schedule(
            "income_tax.additional_rate_threshold",
            "must exceed the basic rate threshold",
        ));
    }
    if ni.upper_earnings_limit <= ni.primary_threshold {
        return Err(TaxError::invalid_schedule(
            "national_insurance.upper_earnings_limit",
            "must exceed the primary threshold",
        ));
    }
    if ct.upper_limit <= ct.lower_limit {
        return Err(TaxError::invalid_schedule(
            "corporation_tax.upper_limit",
            "must exceed the lower limit",
        ));
    }
    if ct.main_rate < ct.small_profits_rate {
        return Err(TaxError::invalid_schedule(
            "corporation_tax.main_rate",
            "must not be below the small profits rate",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(TaxYearSchedule::new(TaxYearSchedule::uk_2024_25().params).is_ok());
        assert!(TaxYearSchedule::new(TaxYearSchedule::uk_2025_26().params).is_ok());
    }

    #[test]
    fn test_presets_meet_marginal_relief_continuously() {
        assert!(TaxYearSchedule::uk_2024_25().marginal_relief_is_continuous());
        assert!(TaxYearSchedule::uk_2025_26().marginal_relief_is_continuous());
    }

    #[test]
    fn test_non_monotonic_thresholds_rejected() {
        let mut params = base_params();
        params.income_tax.additional_rate_threshold = dec!(40_000);
        let err = TaxYearSchedule::new(params).unwrap_err();
        assert!(matches!(err, TaxError::InvalidSchedule { .. }));
        assert_eq!(err.field(), Some("income_tax.additional_rate_threshold"));
    }

    #[test]
    fn test_inverted_corporation_limits_rejected() {
        let mut params = base_params();
        params.corporation_tax.lower_limit = dec!(300_000);
        let err = TaxYearSchedule::new(params).unwrap_err();
        assert_eq!(err.field(), Some("corporation_tax.upper_limit"));
    }

    #[test]
    fn test_rate_out_of_range_rejected() {
        let mut params = base_params();
        params.dividends.higher_rate = dec!(33.75);
        let err = TaxYearSchedule::new(params).unwrap_err();
        assert_eq!(err.field(), Some("dividends.higher_rate"));
    }

    #[test]
    fn test_deserialisation_validates() {
        let mut params = base_params();
        params.national_insurance.upper_earnings_limit = dec!(1_000);
        let json = serde_json::to_string(&params).unwrap();
        let parsed: Result<TaxYearSchedule, _> = serde_json::from_str(&json);
        assert!(parsed.is_err());

        let json = serde_json::to_string(&TaxYearSchedule::uk_2024_25()).unwrap();
        let parsed: TaxYearSchedule = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, TaxYearSchedule::uk_2024_25());
    }

    #[test]
    fn test_tax_year_from_date_turns_over_on_6_april() {
        let before = NaiveDate::from_ymd_opt(2025, 4, 5).unwrap();
        let on = NaiveDate::from_ymd_opt(2025, 4, 6).unwrap();
        assert_eq!(TaxYear::from_date(before), TaxYear(2025));
        assert_eq!(TaxYear::from_date(on), TaxYear(2026));
        assert_eq!(TaxYear(2026).to_string(), "2025/26");
    }

    #[test]
    fn test_tax_year_parsing() {
        assert_eq!("2025-26".parse::<TaxYear>().unwrap(), TaxYear(2026));
        assert_eq!("2024/25".parse::<TaxYear>().unwrap(), TaxYear(2025));
        assert_eq!("2026".parse::<TaxYear>().unwrap(), TaxYear(2026));
        assert!("2024-27".parse::<TaxYear>().is_err());
        assert!("next year".parse::<TaxYear>().is_err());
    }

    #[test]
    fn test_for_tax_year_unknown_year() {
        let err = TaxYearSchedule::for_tax_year(TaxYear(2019)).unwrap_err();
        assert_eq!(err.field(), Some("tax_year"));
        assert_eq!(
            TaxYearSchedule::for_tax_year(TaxYear(2025)).unwrap().label(),
            "2024/25"
        );
    }
}
