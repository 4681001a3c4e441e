use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::utils::normalize_code;

/// Open/high/low/close quartet for one quote side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ohlc {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// One price observation over a fixed time bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub mid: Ohlc,
    pub bid: Option<Ohlc>,
    pub ask: Option<Ohlc>,
    pub volume: f64,
    /// Whether the bucket had fully elapsed when the provider answered.
    pub complete: bool,
}

/// Which quote sides the broker should return for each candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceDetail {
    #[default]
    Mid,
    MidBidAsk,
}

impl PriceDetail {
    pub fn from_flag(bid_ask: bool) -> Self {
        if bid_ask {
            PriceDetail::MidBidAsk
        } else {
            PriceDetail::Mid
        }
    }

    pub fn wire_value(self) -> &'static str {
        match self {
            PriceDetail::Mid => "M",
            PriceDetail::MidBidAsk => "MBA",
        }
    }

    pub fn includes_bid_ask(self) -> bool {
        matches!(self, PriceDetail::MidBidAsk)
    }
}

/// Currency pair. The broker symbol is quote first: base `USD`, quote `EUR` is `EUR_USD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instrument {
    pub base: String,
    pub quote: String,
}

impl Instrument {
    pub fn new(base: &str, quote: &str) -> Self {
        Self {
            base: normalize_code(base),
            quote: normalize_code(quote),
        }
    }

    pub fn symbol(&self) -> String {
        format!("{}_{}", self.quote, self.base)
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.quote, self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_puts_quote_currency_first() {
        let instrument = Instrument::new("usd", "eur");
        assert_eq!(instrument.symbol(), "EUR_USD");
        assert_eq!(instrument.to_string(), "EUR_USD");
    }

    #[test]
    fn price_detail_wire_values() {
        assert_eq!(PriceDetail::from_flag(false).wire_value(), "M");
        assert_eq!(PriceDetail::from_flag(true).wire_value(), "MBA");
        assert!(!PriceDetail::default().includes_bid_ask());
    }
}
