use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::candle::{Candle, Ohlc, PriceDetail};

#[derive(Debug, Deserialize)]
pub struct CandlesResponse {
    #[serde(default)]
    pub candles: Vec<RawCandle>,
}

#[derive(Debug, Deserialize)]
pub struct RawCandle {
    pub time: String,
    #[serde(default)]
    pub volume: Value,
    #[serde(default)]
    pub complete: bool,
    pub mid: Option<RawQuote>,
    pub bid: Option<RawQuote>,
    pub ask: Option<RawQuote>,
}

#[derive(Debug, Deserialize)]
pub struct RawQuote {
    pub o: Value,
    pub h: Value,
    pub l: Value,
    pub c: Value,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "errorMessage")]
    pub error_message: Option<String>,
}

/// Pull the broker's `errorMessage` out of a failed response, falling back to the raw body.
pub fn error_detail(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error_message)
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}

pub fn parse_candles(body: &str, price_detail: PriceDetail) -> anyhow::Result<Vec<Candle>> {
    let payload: CandlesResponse =
        serde_json::from_str(body).context("Failed to parse candles payload")?;

    payload
        .candles
        .iter()
        .map(|raw| map_candle(raw, price_detail))
        .collect()
}

/// Map one broker record: mid prices always, bid and ask only for extended detail.
pub fn map_candle(raw: &RawCandle, price_detail: PriceDetail) -> anyhow::Result<Candle> {
    let time = parse_time(&raw.time)?;
    let mid = quote_to_ohlc(raw.mid.as_ref(), "mid", &raw.time)?;

    let (bid, ask) = if price_detail.includes_bid_ask() {
        (
            Some(quote_to_ohlc(raw.bid.as_ref(), "bid", &raw.time)?),
            Some(quote_to_ohlc(raw.ask.as_ref(), "ask", &raw.time)?),
        )
    } else {
        (None, None)
    };

    let volume = json_number_to_f64(&raw.volume)
        .with_context(|| format!("Invalid volume in candle at {}", raw.time))?
        .unwrap_or(0.0);

    Ok(Candle {
        time,
        mid,
        bid,
        ask,
        volume,
        complete: raw.complete,
    })
}

fn quote_to_ohlc(quote: Option<&RawQuote>, side: &str, time: &str) -> anyhow::Result<Ohlc> {
    let quote = quote.ok_or_else(|| anyhow!("Candle at {time} is missing `{side}` prices"))?;

    let field = |value: &Value, name: &str| -> anyhow::Result<f64> {
        json_number_to_f64(value)
            .with_context(|| format!("Invalid {side}.{name} in candle at {time}"))?
            .ok_or_else(|| anyhow!("Missing {side}.{name} in candle at {time}"))
    };

    Ok(Ohlc {
        open: field(&quote.o, "o")?,
        high: field(&quote.h, "h")?,
        low: field(&quote.l, "l")?,
        close: field(&quote.c, "c")?,
    })
}

/// Accept RFC 3339 (the default wire format) or fractional UNIX seconds.
pub fn parse_time(value: &str) -> anyhow::Result<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    let seconds = trimmed
        .parse::<f64>()
        .with_context(|| format!("Unrecognised candle timestamp '{trimmed}'"))?;
    if !seconds.is_finite() {
        bail!("Candle timestamp '{trimmed}' is not a finite number");
    }
    // Millisecond resolution.
    DateTime::from_timestamp_millis((seconds * 1_000.0).round() as i64)
        .ok_or_else(|| anyhow!("Candle timestamp '{trimmed}' is out of range"))
}

pub fn json_number_to_f64(value: &Value) -> anyhow::Result<Option<f64>> {
    match value {
        Value::Number(num) => num
            .as_f64()
            .ok_or_else(|| anyhow!("Numeric value out of range"))
            .map(Some),
        Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .with_context(|| format!("Failed to parse '{}' as float", trimmed))
                .map(Some)
        }
        Value::Null => Ok(None),
        _ => bail!("Unexpected non-numeric value in candle payload"),
    }
}
