use chrono::Duration;

use crate::candle::Candle;
use crate::config::{validate_historic_query, HistoricQuery};
use crate::error::{AppError, Result};
use crate::fetch::CandleSource;
use crate::records::ResultTable;
use crate::utils::time::{date_to_epoch, end_epoch_or_now};
use crate::window;

/// Walks a date range window by window and assembles one ordered candle table.
pub struct HistoricAggregator<S> {
    source: S,
    query: HistoricQuery,
}

impl<S: CandleSource> HistoricAggregator<S> {
    pub fn new(source: S, query: HistoricQuery) -> Self {
        Self { source, query }
    }

    pub fn query(&self) -> &HistoricQuery {
        &self.query
    }

    /// Read `[start_date, end_date)` where both are `YYYY-MM-DD` at UTC midnight.
    ///
    /// Without an end date the read runs up to the current time. Any failing window aborts the
    /// whole read; windows the provider reports as empty are logged and skipped.
    pub fn aggregate(&self, start_date: &str, end_date: Option<&str>) -> Result<ResultTable> {
        let start = date_to_epoch(start_date)?;
        let end = end_epoch_or_now(end_date)?;
        self.aggregate_epochs(start, end)
    }

    pub fn aggregate_epochs(&self, start_epoch: i64, end_epoch: i64) -> Result<ResultTable> {
        validate_historic_query(&self.query)?;

        let query = &self.query;
        let step = query.granularity.duration_seconds();
        let plan = window::plan(start_epoch, end_epoch, step, query.max_batch_size)?;

        let mut candles: Vec<Candle> = Vec::new();
        let mut empty_windows = 0usize;

        for window in plan {
            log::debug!(
                "Requesting {} {} candles for {}",
                query.instrument,
                query.granularity,
                window
            );

            match self
                .source
                .fetch(&query.instrument, query.granularity, window, query.price_detail)
            {
                Ok(batch) => {
                    if let (Some(first), Some(last)) = (batch.first(), batch.last()) {
                        log::debug!("Read {} to {}", first.time, last.time);
                    }
                    // The time index must stay strictly increasing across windows.
                    let before = candles.len();
                    let previous_last = candles.last().map(|candle| candle.time);
                    let received = batch.len();
                    candles.extend(
                        batch
                            .into_iter()
                            .filter(|candle| previous_last.map_or(true, |last| candle.time > last)),
                    );
                    let overlapping = received - (candles.len() - before);
                    if overlapping > 0 {
                        log::warn!(
                            "Dropped {overlapping} candles for {window} at or before the previous window's last candle"
                        );
                    }
                }
                Err(err @ AppError::EmptyBatch { .. }) => {
                    empty_windows += 1;
                    log::warn!("{err}");
                }
                Err(err) => return Err(err),
            }
        }

        let table = ResultTable::from_candles(candles, query.complete_only);
        let gaps = table.gaps(Duration::seconds(step));
        for gap in &gaps {
            log::debug!(
                "Gap of {}s between {} and {}",
                gap.delta.num_seconds(),
                gap.after,
                gap.before
            );
        }

        log::info!(
            "Read {} {} candles for {} ({} gaps, {} empty windows)",
            table.len(),
            query.granularity,
            query.instrument,
            gaps.len(),
            empty_windows
        );

        Ok(table)
    }
}

/// One-call historic read without keeping the aggregator around.
pub fn fetch_table<S: CandleSource>(
    source: S,
    query: HistoricQuery,
    start_date: &str,
    end_date: Option<&str>,
) -> Result<ResultTable> {
    HistoricAggregator::new(source, query).aggregate(start_date, end_date)
}
