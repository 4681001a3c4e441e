use crate::candle::Instrument;
use crate::error::{AppError, Result};

use super::{HistoricQuery, RecentQuery, MAX_CANDLES_PER_REQUEST};

/// Check a historic query before any request goes out.
pub fn validate_historic_query(query: &HistoricQuery) -> Result<()> {
    if query.max_batch_size == 0 {
        return Err(AppError::InvalidBatchSize);
    }

    let mut issues = Vec::new();
    validate_instrument(&query.instrument, &mut issues);

    if query.max_batch_size > MAX_CANDLES_PER_REQUEST {
        issues.push(format!(
            "max_batch_size {} exceeds the provider limit of {}",
            query.max_batch_size, MAX_CANDLES_PER_REQUEST
        ));
    }

    into_result("historic query", issues)
}

pub fn validate_recent_query(query: &RecentQuery) -> Result<()> {
    if query.count == 0 || query.count > MAX_CANDLES_PER_REQUEST {
        return Err(AppError::InvalidCount(query.count));
    }

    let mut issues = Vec::new();
    validate_instrument(&query.instrument, &mut issues);
    into_result("recent query", issues)
}

fn validate_instrument(instrument: &Instrument, issues: &mut Vec<String>) {
    if instrument.base.is_empty() {
        issues.push("base currency must not be empty".to_string());
    }
    if instrument.quote.is_empty() {
        issues.push("quote currency must not be empty".to_string());
    }
    if !instrument.base.is_empty() && instrument.base == instrument.quote {
        issues.push(format!(
            "base and quote currency are both `{}`",
            instrument.base
        ));
    }
}

fn into_result(label: &str, issues: Vec<String>) -> Result<()> {
    if issues.is_empty() {
        Ok(())
    } else {
        Err(AppError::message(format!(
            "{label} invalid:\n  - {}",
            issues.join("\n  - ")
        )))
    }
}
