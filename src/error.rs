use thiserror::Error;

/// Everything that can go wrong while deriving features from a tracking table.
/// Failures are all-or-nothing: no partially augmented table is ever returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    #[error("missing field \"{field}\" in tracking table")]
    MissingField { field: String },

    #[error("shape mismatch in {context}: expected {expected}, found {found}")]
    ShapeMismatch {
        context: String,
        expected: usize,
        found: usize,
    },

    #[error("zero-length vector at frame {index}; angle is undefined")]
    DegenerateVector { index: usize },

    #[error("at least 2 frames are needed for a gradient, found {found}")]
    InsufficientFrames { found: usize },

    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

impl FeatureError {
    pub fn missing(field: &str) -> Self {
        FeatureError::MissingField {
            field: String::from(field),
        }
    }

    pub fn shape(context: &str, expected: usize, found: usize) -> Self {
        FeatureError::ShapeMismatch {
            context: String::from(context),
            expected,
            found,
        }
    }
}
