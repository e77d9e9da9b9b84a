use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaxError {
    /// Caller-supplied facts are malformed or out of range.
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// A tax-year schedule failed its consistency checks at construction.
    #[error("Invalid tax schedule: {field}: {reason}")]
    InvalidSchedule { field: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl TaxError {
    pub(crate) fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        TaxError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_schedule(field: impl Into<String>, reason: impl Into<String>) -> Self {
        TaxError::InvalidSchedule {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending field, when the error identifies one.
    pub fn field(&self) -> Option<&str> {
        match self {
            TaxError::InvalidInput { field, .. } | TaxError::InvalidSchedule { field, .. } => {
                Some(field)
            }
            TaxError::SerializationError(_) => None,
        }
    }
}

impl From<serde_json::Error> for TaxError {
    fn from(e: serde_json::Error) -> Self {
        TaxError::SerializationError(e.to_string())
    }
}
