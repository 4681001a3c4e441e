use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail};
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Url;
use serde::Deserialize;

use crate::candle::{Candle, Ohlc};
use crate::error::{AppError, Context, Result};
use crate::records::ResultTable;
use crate::utils::time::{date_to_epoch, end_epoch_or_now};

use super::FetchResult;

const CHART_BASE_URL: &str = "https://query1.finance.yahoo.com";
const CHART_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const CHART_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Bar sizes accepted by the chart endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YahooInterval {
    M1,
    M2,
    M5,
    M15,
    M30,
    M60,
    M90,
    H1,
    D1,
    D5,
    Wk1,
    Mo1,
    Mo3,
}

impl YahooInterval {
    pub const ALL: [YahooInterval; 13] = [
        YahooInterval::M1,
        YahooInterval::M2,
        YahooInterval::M5,
        YahooInterval::M15,
        YahooInterval::M30,
        YahooInterval::M60,
        YahooInterval::M90,
        YahooInterval::H1,
        YahooInterval::D1,
        YahooInterval::D5,
        YahooInterval::Wk1,
        YahooInterval::Mo1,
        YahooInterval::Mo3,
    ];

    pub fn label(self) -> &'static str {
        match self {
            YahooInterval::M1 => "1m",
            YahooInterval::M2 => "2m",
            YahooInterval::M5 => "5m",
            YahooInterval::M15 => "15m",
            YahooInterval::M30 => "30m",
            YahooInterval::M60 => "60m",
            YahooInterval::M90 => "90m",
            YahooInterval::H1 => "1h",
            YahooInterval::D1 => "1d",
            YahooInterval::D5 => "5d",
            YahooInterval::Wk1 => "1wk",
            YahooInterval::Mo1 => "1mo",
            YahooInterval::Mo3 => "3mo",
        }
    }

    /// Nominal bar length; months count as 30 days.
    pub fn duration_seconds(self) -> i64 {
        match self {
            YahooInterval::M1 => 60,
            YahooInterval::M2 => 120,
            YahooInterval::M5 => 300,
            YahooInterval::M15 => 900,
            YahooInterval::M30 => 1_800,
            YahooInterval::M60 | YahooInterval::H1 => 3_600,
            YahooInterval::M90 => 5_400,
            YahooInterval::D1 => 86_400,
            YahooInterval::D5 => 432_000,
            YahooInterval::Wk1 => 604_800,
            YahooInterval::Mo1 => 2_592_000,
            YahooInterval::Mo3 => 7_776_000,
        }
    }
}

impl FromStr for YahooInterval {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|interval| interval.label() == s)
            .ok_or_else(|| AppError::UnknownGranularity(s.to_string()))
    }
}

impl fmt::Display for YahooInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Named look-back ranges accepted instead of explicit dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YahooPeriod {
    D1,
    D5,
    Mo1,
    Mo3,
    Mo6,
    Y1,
    Y2,
    Y5,
    Y10,
    Ytd,
    Max,
}

impl YahooPeriod {
    pub const ALL: [YahooPeriod; 11] = [
        YahooPeriod::D1,
        YahooPeriod::D5,
        YahooPeriod::Mo1,
        YahooPeriod::Mo3,
        YahooPeriod::Mo6,
        YahooPeriod::Y1,
        YahooPeriod::Y2,
        YahooPeriod::Y5,
        YahooPeriod::Y10,
        YahooPeriod::Ytd,
        YahooPeriod::Max,
    ];

    pub fn label(self) -> &'static str {
        match self {
            YahooPeriod::D1 => "1d",
            YahooPeriod::D5 => "5d",
            YahooPeriod::Mo1 => "1mo",
            YahooPeriod::Mo3 => "3mo",
            YahooPeriod::Mo6 => "6mo",
            YahooPeriod::Y1 => "1y",
            YahooPeriod::Y2 => "2y",
            YahooPeriod::Y5 => "5y",
            YahooPeriod::Y10 => "10y",
            YahooPeriod::Ytd => "ytd",
            YahooPeriod::Max => "max",
        }
    }
}

impl FromStr for YahooPeriod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|period| period.label() == s)
            .ok_or_else(|| AppError::UnknownPeriod(s.to_string()))
    }
}

impl fmt::Display for YahooPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize, Default)]
struct QuoteSeries {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Blocking reader for the public chart endpoint.
pub struct YahooClient {
    client: Client,
    base_url: String,
}

impl YahooClient {
    pub fn new() -> FetchResult<Self> {
        Self::with_base_url(CHART_BASE_URL)
    }

    pub fn with_base_url<U: Into<String>>(base_url: U) -> FetchResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to construct chart HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Bars between two `YYYY-MM-DD` dates; the end defaults to now.
    pub fn history_range(
        &self,
        ticker: &str,
        start_date: &str,
        end_date: Option<&str>,
        interval: YahooInterval,
    ) -> FetchResult<ResultTable> {
        let start = date_to_epoch(start_date)?;
        let end = end_epoch_or_now(end_date)?;

        self.request_chart(
            ticker,
            &[
                ("period1", start.to_string()),
                ("period2", end.to_string()),
                ("interval", interval.label().to_string()),
            ],
            interval,
        )
    }

    /// Bars covering a named look-back period such as `6mo` or `ytd`.
    pub fn history_period(
        &self,
        ticker: &str,
        period: YahooPeriod,
        interval: YahooInterval,
    ) -> FetchResult<ResultTable> {
        self.request_chart(
            ticker,
            &[
                ("range", period.label().to_string()),
                ("interval", interval.label().to_string()),
            ],
            interval,
        )
    }

    fn request_chart(
        &self,
        ticker: &str,
        query: &[(&str, String)],
        interval: YahooInterval,
    ) -> FetchResult<ResultTable> {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(AppError::message("Ticker must not be empty"));
        }

        let candles = self
            .send(ticker, query)
            .and_then(|body| parse_chart(&body, interval, Utc::now()))
            .map_err(|cause| AppError::remote(format!("{ticker} chart"), cause))?;

        if candles.is_empty() {
            return Err(AppError::EmptyBatch {
                instrument: ticker.to_string(),
                window: query
                    .iter()
                    .map(|(key, value)| format!("{key}={value}"))
                    .collect::<Vec<_>>()
                    .join("&"),
            });
        }

        log::info!("Read {} {} bars for {}", candles.len(), interval, ticker);
        Ok(ResultTable::from_candles(candles, false))
    }

    fn send(&self, ticker: &str, query: &[(&str, String)]) -> anyhow::Result<String> {
        let mut url = Url::parse(&self.base_url).context("Invalid chart base URL")?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Chart base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", ticker]);

        let response = self
            .client
            .get(url)
            .query(query)
            .header(USER_AGENT, CHART_USER_AGENT)
            .header(ACCEPT_LANGUAGE, CHART_ACCEPT_LANGUAGE)
            .header(ACCEPT, "application/json")
            .send()
            .with_context(|| format!("Chart request failed for {}", ticker))?;

        let status = response.status();
        let body = response
            .text()
            .with_context(|| format!("Failed to read chart body for {}", ticker))?;

        if !status.is_success() {
            // The endpoint reports unknown symbols through the chart error object.
            let detail = serde_json::from_str::<ChartEnvelope>(&body)
                .ok()
                .and_then(|envelope| envelope.chart.error)
                .map(|error| format!("{}: {}", error.code, error.description))
                .unwrap_or_else(|| body.trim().chars().take(200).collect());
            bail!("chart endpoint answered {status}: {detail}");
        }

        Ok(body)
    }
}

fn parse_chart(
    body: &str,
    interval: YahooInterval,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<Candle>> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).context("Failed to parse chart JSON")?;

    if let Some(error) = envelope.chart.error {
        bail!("{}: {}", error.code, error.description);
    }

    let Some(result) = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
    else {
        return Ok(Vec::new());
    };

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let bucket = interval.duration_seconds();
    let now_epoch = now.timestamp();

    let mut candles = Vec::with_capacity(result.timestamp.len());
    for (idx, &epoch) in result.timestamp.iter().enumerate() {
        let value = |series: &[Option<f64>]| series.get(idx).copied().flatten();

        let (Some(open), Some(high), Some(low), Some(close)) = (
            value(&quote.open),
            value(&quote.high),
            value(&quote.low),
            value(&quote.close),
        ) else {
            continue;
        };

        let Some(time) = DateTime::from_timestamp(epoch, 0) else {
            continue;
        };

        candles.push(Candle {
            time,
            mid: Ohlc {
                open,
                high,
                low,
                close,
            },
            bid: None,
            ask: None,
            volume: value(&quote.volume).unwrap_or(0.0),
            complete: epoch.saturating_add(bucket) <= now_epoch,
        });
    }

    candles.sort_by(|a, b| a.time.cmp(&b.time));
    candles.dedup_by(|a, b| a.time == b.time);

    Ok(candles)
}
