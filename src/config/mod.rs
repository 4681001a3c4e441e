pub mod credentials;
pub mod query;
pub mod validator;

pub use credentials::{OandaCredentials, OandaEnvironment};
pub use query::{HistoricQuery, RecentQuery, DEFAULT_MAX_BATCH_SIZE, MAX_CANDLES_PER_REQUEST};
pub use validator::{validate_historic_query, validate_recent_query};
