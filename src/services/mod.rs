pub mod history;

pub use history::{fetch_table, HistoricAggregator};
