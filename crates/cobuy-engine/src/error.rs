use std::error::Error;
use std::fmt;
use std::path::PathBuf;

/// Failures surfaced by the recommendation engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Dataset missing, unreadable or malformed. Training is abandoned and the
    /// previously trained model (if any) keeps serving.
    DataLoad { path: PathBuf, reason: String },
    /// Caller supplied input the engine refuses to look at.
    Validation(String),
    /// Unexpected internal failure while vectorizing, fitting or predicting.
    Prediction(String),
}

impl EngineError {
    pub fn data_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        EngineError::DataLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error was caused by the caller rather than the engine.
    pub fn is_client_error(&self) -> bool {
        matches!(self, EngineError::Validation(_))
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EngineError::DataLoad { path, reason } => {
                write!(f, "Failed to load dataset {}: {}", path.display(), reason)
            }
            EngineError::Validation(msg) => write!(f, "Invalid input: {}", msg),
            EngineError::Prediction(msg) => write!(f, "Prediction failed: {}", msg),
        }
    }
}

impl Error for EngineError {}

pub type Result<T> = std::result::Result<T, EngineError>;
