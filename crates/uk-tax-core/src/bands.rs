use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TaxError;
use crate::types::{ensure_non_negative, round_money, Money, Rate};
use crate::TaxResult;

/// One rate band. `ceiling` is cumulative on the taxable scale (after the
/// exemption). The final band is always treated as unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBand {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ceiling: Option<Money>,
    pub rate: Rate,
}

impl TaxBand {
    pub fn new(label: &str, ceiling: Option<Money>, rate: Rate) -> Self {
        TaxBand {
            label: label.to_string(),
            ceiling,
            rate,
        }
    }
}

/// Portion of the taxable base that fell into one band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandSlice {
    pub label: String,
    pub rate: Rate,
    pub amount: Money,
    pub tax: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandCalculation {
    pub taxable_base: Money,
    pub total_tax: Money,
    pub breakdown: Vec<BandSlice>,
}

impl BandCalculation {
    /// Tax charged in the band named `label`, zero if nothing fell in it.
    pub fn tax_in(&self, label: &str) -> Money {
        self.breakdown
            .iter()
            .filter(|s| s.label == label)
            .map(|s| s.tax)
            .sum()
    }

    /// Amount taxed in the band named `label`.
    pub fn amount_in(&self, label: &str) -> Money {
        self.breakdown
            .iter()
            .filter(|s| s.label == label)
            .map(|s| s.amount)
            .sum()
    }

    /// Round to pence. Each slice is rounded on its own and the last slice
    /// takes the remainder, so slices still sum to `taxable_base` and
    /// `total_tax` after rounding.
    pub(crate) fn rounded(&self) -> BandCalculation {
        let taxable_base = round_money(self.taxable_base);
        let total_tax = round_money(self.total_tax);
        let mut breakdown: Vec<BandSlice> = self
            .breakdown
            .iter()
            .map(|s| BandSlice {
                label: s.label.clone(),
                rate: s.rate,
                amount: round_money(s.amount),
                tax: round_money(s.tax),
            })
            .collect();
        if let Some((last, earlier)) = breakdown.split_last_mut() {
            last.amount = taxable_base - earlier.iter().map(|s| s.amount).sum::<Decimal>();
            last.tax = total_tax - earlier.iter().map(|s| s.tax).sum::<Decimal>();
        }
        BandCalculation {
            taxable_base,
            total_tax,
            breakdown,
        }
    }
}

/// Progressive tax on `base_amount` over `bands`, after removing `exemption`.
///
/// Validates inputs, then delegates to the unchecked band walk. Results are
/// rounded to pence.
pub fn compute_progressive_tax(
    base_amount: Money,
    exemption: Money,
    bands: &[TaxBand],
) -> TaxResult<BandCalculation> {
    ensure_non_negative("base_amount", base_amount)?;
    ensure_non_negative("exemption", exemption)?;
    validate_bands(bands)?;
    Ok(apply_bands(base_amount, exemption, bands).rounded())
}

/// Walk the bands in order, taking `min(remaining, band width)` from each.
///
/// Callers guarantee the band table is ordered; engines build theirs from a
/// validated schedule.
pub(crate) fn apply_bands(base_amount: Money, exemption: Money, bands: &[TaxBand]) -> BandCalculation {
    let taxable_base = (base_amount - exemption).max(Decimal::ZERO);
    stack_on_bands(Decimal::ZERO, taxable_base, bands)
}

/// Tax `amount` as if the first `already_used` of the taxable scale were
/// occupied by other income. Only the unused part of each band is available.
pub(crate) fn stack_on_bands(already_used: Money, amount: Money, bands: &[TaxBand]) -> BandCalculation {
    let mut remaining = amount.max(Decimal::ZERO);
    let mut position = already_used.max(Decimal::ZERO);
    let mut floor = Decimal::ZERO;
    let mut total_tax = Decimal::ZERO;
    let mut breakdown = Vec::new();

    let last = bands.len().saturating_sub(1);
    for (i, band) in bands.iter().enumerate() {
        if remaining <= Decimal::ZERO {
            break;
        }
        let taken = match band.ceiling {
            Some(ceiling) if i < last => remaining.min((ceiling - floor.max(position)).max(Decimal::ZERO)),
            _ => remaining,
        };
        if taken > Decimal::ZERO {
            let tax = taken * band.rate;
            total_tax += tax;
            remaining -= taken;
            position = floor.max(position) + taken;
            breakdown.push(BandSlice {
                label: band.label.clone(),
                rate: band.rate,
                amount: taken,
                tax,
            });
        }
        if let Some(ceiling) = band.ceiling {
            floor = ceiling;
        }
    }

    BandCalculation {
        taxable_base: amount.max(Decimal::ZERO),
        total_tax,
        breakdown,
    }
}

/// Rate that applies to the next pound above `taxable` (0 inside the exemption).
pub(crate) fn marginal_rate(taxable: Money, bands: &[TaxBand]) -> Rate {
    if taxable <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    bands
        .iter()
        .find(|b| b.ceiling.map_or(true, |c| taxable < c))
        .or_else(|| bands.last())
        .map(|b| b.rate)
        .unwrap_or(Decimal::ZERO)
}

pub(crate) fn validate_bands(bands: &[TaxBand]) -> TaxResult<()> {
    if bands.is_empty() {
        return Err(TaxError::invalid_input("bands", "at least one band is required"));
    }
    let mut previous: Option<Money> = None;
    for (i, band) in bands.iter().enumerate() {
        let field = format!("bands[{i}]");
        if band.rate < Decimal::ZERO || band.rate > Decimal::ONE {
            return Err(TaxError::invalid_input(
                field,
                format!("rate must be between 0 and 1, got {}", band.rate),
            ));
        }
        match band.ceiling {
            Some(ceiling) => {
                if ceiling <= previous.unwrap_or(Decimal::ZERO) {
                    return Err(TaxError::invalid_input(
                        field,
                        "ceilings must be positive and strictly increasing",
                    ));
                }
                previous = Some(ceiling);
            }
            None if i + 1 != bands.len() => {
                return Err(TaxError::invalid_input(
                    field,
                    "only the final band may be unbounded",
                ));
            }
            None => {}
        }
    }
    Ok(())
}
