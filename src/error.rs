// Veritext Error Types

use thiserror::Error;

/// Errors raised by the detection core and its adapters.
///
/// Configuration variants are rejected before any classifier call; adapter
/// variants abort the whole request rather than producing a partial verdict.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("invalid temperature {0}: temperature must be greater than zero")]
    InvalidTemperature(f64),

    #[error("invalid window size: window size must be greater than zero")]
    InvalidWindowSize,

    #[error("invalid window config: overlap {overlap} must be less than window size {window_size}")]
    InvalidWindowConfig { window_size: usize, overlap: usize },

    #[error("window size {requested} exceeds the model input limit {limit}")]
    WindowTooLarge { requested: usize, limit: usize },

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("classifier error: {0}")]
    Classifier(String),

    #[error("no windows survived planning for a non-empty document")]
    EmptyWindowPlan,
}

impl DetectError {
    /// True for errors the caller can fix by changing request parameters.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DetectError::InvalidTemperature(_)
                | DetectError::InvalidWindowSize
                | DetectError::InvalidWindowConfig { .. }
                | DetectError::WindowTooLarge { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DetectError>;
