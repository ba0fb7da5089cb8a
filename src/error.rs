use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Error: product_id is missing.")]
    InvalidInput,

    #[error("Product not found!")]
    NotFound { product_id: String },

    #[error("Detector call failed: {reason}")]
    Detector { reason: String },

    #[error("Failed to persist analysis: {reason}")]
    Persistence { reason: String },

    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

impl AnalysisError {
    pub fn not_found(product_id: impl Into<String>) -> Self {
        Self::NotFound {
            product_id: product_id.into(),
        }
    }

    pub fn detector(reason: impl Into<String>) -> Self {
        Self::Detector {
            reason: reason.into(),
        }
    }

    pub fn persistence(reason: impl Into<String>) -> Self {
        Self::Persistence {
            reason: reason.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
