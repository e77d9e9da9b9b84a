use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::TaxError;
use crate::TaxResult;

/// All monetary values, in pounds sterling. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.20 = 20%). Never as percentages.
pub type Rate = Decimal;

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Round a monetary amount to pence. Applied once, at the public boundary.
pub fn round_money(amount: Money) -> Money {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `numerator / denominator`, or zero when the denominator is not positive.
pub(crate) fn ratio_or_zero(numerator: Decimal, denominator: Decimal) -> Rate {
    if denominator > Decimal::ZERO {
        numerator / denominator
    } else {
        Decimal::ZERO
    }
}

/// Reject a negative monetary input, naming the field.
pub(crate) fn ensure_non_negative(field: &str, amount: Money) -> TaxResult<()> {
    if amount < Decimal::ZERO {
        return Err(TaxError::invalid_input(
            field,
            format!("must be non-negative, got {amount}"),
        ));
    }
    Ok(())
}
