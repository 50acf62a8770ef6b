use thiserror::Error;

/// Malformed input rejected at the form boundary or by a model constructor.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("invalid price '{0}': expected a non-negative decimal")]
    InvalidPrice(String),

    #[error("invalid date '{0}'")]
    InvalidDate(String),

    #[error("rating {0} is out of range (1-5)")]
    RatingOutOfRange(i64),

    #[error("latitude {0} is out of range (-90 to 90)")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is out of range (-180 to 180)")]
    LongitudeOutOfRange(f64),

    #[error("invalid social handle '{0}'")]
    InvalidHandle(String),

    #[error("unknown {kind} '{value}'")]
    UnknownCode { kind: &'static str, value: String },
}

impl ValidationError {
    pub(crate) fn unknown(
        kind: &'static str,
        value: &str,
    ) -> Self {
        Self::UnknownCode {
            kind,
            value: value.to_string(),
        }
    }
}
