use std::io;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};

use crate::candle::{Candle, Ohlc};
use crate::error::{Context, Result};

/// One table row: the candle plus its distance from the previous row.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub candle: Candle,
    pub index_diff: Option<Duration>,
}

/// A spacing between consecutive rows wider than the expected bucket length.
#[derive(Debug, Clone, PartialEq)]
pub struct Gap {
    pub after: DateTime<Utc>,
    pub before: DateTime<Utc>,
    pub delta: Duration,
}

/// Time-ordered candle series with a derived index-diff column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    rows: Vec<TableRow>,
}

impl ResultTable {
    /// Build a table from candles already in chronological order.
    pub fn from_candles(candles: Vec<Candle>, complete_only: bool) -> Self {
        let mut previous: Option<DateTime<Utc>> = None;
        let rows = candles
            .into_iter()
            .filter(|candle| !complete_only || candle.complete)
            .map(|candle| {
                let index_diff = previous.map(|prev| candle.time - prev);
                previous = Some(candle.time);
                TableRow { candle, index_diff }
            })
            .collect();

        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableRow> {
        self.rows.iter()
    }

    pub fn candles(&self) -> impl Iterator<Item = &Candle> {
        self.rows.iter().map(|row| &row.candle)
    }

    pub fn first_time(&self) -> Option<DateTime<Utc>> {
        self.rows.first().map(|row| row.candle.time)
    }

    pub fn last_time(&self) -> Option<DateTime<Utc>> {
        self.rows.last().map(|row| row.candle.time)
    }

    pub fn into_candles(self) -> Vec<Candle> {
        self.rows.into_iter().map(|row| row.candle).collect()
    }

    /// Rows whose diff exceeds `expected`, i.e. buckets the provider did not return.
    pub fn gaps(&self, expected: Duration) -> Vec<Gap> {
        self.rows
            .windows(2)
            .filter_map(|pair| {
                let delta = pair[1].index_diff?;
                (delta > expected).then(|| Gap {
                    after: pair[0].candle.time,
                    before: pair[1].candle.time,
                    delta,
                })
            })
            .collect()
    }

    fn has_bid_ask(&self) -> bool {
        self.rows
            .iter()
            .any(|row| row.candle.bid.is_some() || row.candle.ask.is_some())
    }

    /// Write the table as CSV. Bid/ask columns appear only when some row carries them.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let extended = self.has_bid_ask();
        let mut writer = csv::Writer::from_writer(writer);

        let mut header = vec!["time", "open", "high", "low", "close"];
        if extended {
            header.extend([
                "open_bid", "high_bid", "low_bid", "close_bid", "open_ask", "high_ask", "low_ask",
                "close_ask",
            ]);
        }
        header.extend(["volume", "complete", "index_diff_secs"]);
        writer.write_record(&header)?;

        for row in &self.rows {
            let candle = &row.candle;
            let mut record = vec![candle.time.to_rfc3339()];
            push_ohlc(&mut record, Some(&candle.mid));
            if extended {
                push_ohlc(&mut record, candle.bid.as_ref());
                push_ohlc(&mut record, candle.ask.as_ref());
            }
            record.push(candle.volume.to_string());
            record.push(candle.complete.to_string());
            record.push(
                row.index_diff
                    .map(|diff| diff.num_seconds().to_string())
                    .unwrap_or_default(),
            );
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Persist the table to a CSV file at `file_path`.
    pub fn save_to_csv<P: AsRef<Path>>(&self, file_path: P) -> Result<()> {
        let path = file_path.as_ref();
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create CSV file {}", path.display()))?;
        self.write_csv(file)
    }
}

fn push_ohlc(record: &mut Vec<String>, quote: Option<&Ohlc>) {
    match quote {
        Some(q) => record.extend([
            q.open.to_string(),
            q.high.to_string(),
            q.low.to_string(),
            q.close.to_string(),
        ]),
        None => record.extend(std::iter::repeat(String::new()).take(4)),
    }
}
