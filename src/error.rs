//! Error types for the scan_assay library

use thiserror::Error;

/// Result type alias for scan_assay operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Error types for measurement and calibration operations
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// A region with no pixels reached the sampler
    #[error("Degenerate region: {reason}")]
    DegenerateGeometry { reason: String },

    /// Not enough usable calibration levels for the requested operation
    #[error("Insufficient data for {context}: need at least {required}, found {found}")]
    InsufficientData {
        context: String,
        required: usize,
        found: usize,
    },

    /// Unknown fit model tag
    #[error("Fit model not implemented: {model}")]
    FitNotImplemented { model: String },

    /// Region growing exceeded the caller's visit budget
    #[error("Region growing aborted after visiting {limit} pixels")]
    RegionLimitExceeded { limit: usize },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },

    /// Image file could not be loaded or decoded
    #[error("Failed to load image: {message}")]
    ImageLoadError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// JSON (de)serialization of configuration or profiles failed
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// CSV report could not be written
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Filesystem access failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// Create an image load error with context
    pub fn image_load<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ImageLoadError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a degenerate-geometry error
    pub fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            reason: reason.into(),
        }
    }

    /// Create an insufficient-data error
    pub fn insufficient(context: impl Into<String>, required: usize, found: usize) -> Self {
        Self::InsufficientData {
            context: context.into(),
            required,
            found,
        }
    }

    /// Create an invalid parameter error
    pub fn invalid(parameter: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }

    /// Check if this error indicates a recoverable condition
    ///
    /// Recoverable errors go away once the user adds more data or retries
    /// with a larger budget; the caller should suppress the chart or limit
    /// computation rather than abort.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AnalysisError::InsufficientData { .. } | AnalysisError::RegionLimitExceeded { .. }
        )
    }

    /// Get user-friendly error description for application display
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::DegenerateGeometry { .. } => {
                "The selected region contains no pixels. Draw a larger region.".to_string()
            }
            AnalysisError::InsufficientData { required, context, .. } => {
                format!("Need at least {} usable levels for {}.", required, context)
            }
            AnalysisError::FitNotImplemented { model } => {
                format!("Model '{}' is not available.", model)
            }
            AnalysisError::RegionLimitExceeded { .. } => {
                "The selection grew too large. Try a lower tolerance.".to_string()
            }
            AnalysisError::ImageLoadError { .. } => {
                "Could not load the image. Please check the file format and try again.".to_string()
            }
            _ => "Calibration failed. Please check the input data.".to_string(),
        }
    }
}
