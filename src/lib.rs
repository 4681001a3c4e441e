pub mod candle;
pub mod config;
pub mod error;
pub mod fetch;
pub mod granularity;
pub mod records;
pub mod services;
pub mod utils;
pub mod window;

pub use candle::{Candle, Instrument, Ohlc, PriceDetail};
pub use error::{AppError, Result};
pub use granularity::{duration_seconds, Granularity};
pub use records::ResultTable;
pub use window::{plan, Window, WindowPlan};
