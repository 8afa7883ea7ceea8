use thiserror::Error;

/// Errors raised while decoding calibration tables or folding spectra.
///
/// Every variant is terminal for the operation that produced it: they signal
/// malformed calibration data or caller misuse, never a transient condition.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResponseError {
    /// None of the accepted extension names exist in the file.
    #[error("missing extension: none of {tried:?} found")]
    MissingExtension { tried: Vec<String> },

    /// A located extension lacks a required column.
    #[error("extension '{extension}' has no column '{column}'")]
    MissingColumn { extension: String, column: String },

    /// A required header keyword is absent or not of the expected type.
    #[error("extension '{extension}': keyword '{keyword}' missing or not {expected}")]
    MissingKeyword {
        extension: String,
        keyword: String,
        expected: &'static str,
    },

    /// Channel-offset keyword missing, ambiguous or not an integer.
    #[error("malformed header: {0}")]
    MalformedHeader(String),

    /// Flattened group/channel/matrix arrays disagree in length.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A vector does not match the bin or channel count of the operation.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A channel group would fall outside `[0, channels)`.
    #[error(
        "channel group {group} (start {start}, width {width}) outside detector range 0..{channels}"
    )]
    OutOfRangeChannel {
        group: usize,
        start: i64,
        width: usize,
        channels: usize,
    },

    /// Unit string is not one of the recognised energy/wavelength units.
    #[error("unsupported unit '{0}' (expected keV or angs)")]
    UnsupportedUnit(String),

    /// Flux model parameters or evaluation grid are unusable.
    #[error("invalid model: {0}")]
    InvalidModel(String),
}

impl ResponseError {
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    pub fn shape_mismatch(message: impl Into<String>) -> Self {
        Self::ShapeMismatch(message.into())
    }

    pub fn missing_column(extension: &str, column: &str) -> Self {
        Self::MissingColumn {
            extension: extension.to_string(),
            column: column.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ResponseError>;
