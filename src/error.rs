use thiserror::Error;

pub use anyhow::Context;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unsupported granularity `{0}`")]
    UnknownGranularity(String),
    #[error("granularity step must be a positive number of seconds, got {0}")]
    InvalidGranularity(i64),
    #[error("max batch size must be at least 1")]
    InvalidBatchSize,
    #[error("candle count must be between 1 and 5000, got {0}")]
    InvalidCount(u32),
    #[error("unsupported period `{0}`")]
    UnknownPeriod(String),
    #[error("failed to parse date `{input}` (expected YYYY-MM-DD)")]
    DateParse {
        input: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("remote request failed for {context}: {cause:#}")]
    RemoteRequest {
        context: String,
        #[source]
        cause: anyhow::Error,
    },
    #[error("provider returned no candles for {instrument} in {window}")]
    EmptyBatch { instrument: String, window: String },
    #[error("environment variable {0} is not set")]
    MissingCredential(&'static str),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn message<T: Into<String>>(msg: T) -> Self {
        AppError::Message(msg.into())
    }

    pub fn remote<C: Into<String>>(context: C, cause: anyhow::Error) -> Self {
        AppError::RemoteRequest {
            context: context.into(),
            cause,
        }
    }

    /// True for transport, status and payload failures raised by a provider call.
    pub fn is_remote(&self) -> bool {
        matches!(self, AppError::RemoteRequest { .. })
    }

    pub fn is_empty_batch(&self) -> bool {
        matches!(self, AppError::EmptyBatch { .. })
    }
}
