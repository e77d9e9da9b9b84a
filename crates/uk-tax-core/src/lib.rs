pub mod bands;
pub mod corporation_tax;
pub mod dividend_tax;
pub mod error;
pub mod income_tax;
pub mod national_insurance;
pub mod personal_tax;
pub mod schedule;
pub mod types;

#[cfg(feature = "reliefs")]
pub mod reliefs;

#[cfg(feature = "capital_gains")]
pub mod capital_gains;

#[cfg(feature = "optimizer")]
pub mod optimizer;

pub use error::TaxError;
pub use schedule::{TaxYear, TaxYearSchedule};
pub use types::*;

/// Standard result type for all tax engine operations
pub type TaxResult<T> = Result<T, TaxError>;
