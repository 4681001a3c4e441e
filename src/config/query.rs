use crate::candle::{Instrument, PriceDetail};
use crate::granularity::Granularity;

/// Candles requested per historic window unless overridden.
pub const DEFAULT_MAX_BATCH_SIZE: u32 = 999;

/// Broker-side cap on candles returned by a single request.
pub const MAX_CANDLES_PER_REQUEST: u32 = 5000;

/// Options recognised by the paginated historic read.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricQuery {
    pub instrument: Instrument,
    pub granularity: Granularity,
    pub price_detail: PriceDetail,
    pub complete_only: bool,
    pub max_batch_size: u32,
}

impl HistoricQuery {
    pub fn new(instrument: Instrument, granularity: Granularity) -> Self {
        Self {
            instrument,
            granularity,
            price_detail: PriceDetail::Mid,
            complete_only: true,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }

    pub fn with_price_detail(mut self, price_detail: PriceDetail) -> Self {
        self.price_detail = price_detail;
        self
    }

    pub fn with_complete_only(mut self, complete_only: bool) -> Self {
        self.complete_only = complete_only;
        self
    }

    pub fn with_max_batch_size(mut self, max_batch_size: u32) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }
}

/// Options for the single-shot "last N candles" read.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentQuery {
    pub instrument: Instrument,
    pub granularity: Granularity,
    pub price_detail: PriceDetail,
    pub count: u32,
    pub complete_only: bool,
}

impl RecentQuery {
    pub fn new(instrument: Instrument, granularity: Granularity, count: u32) -> Self {
        Self {
            instrument,
            granularity,
            price_detail: PriceDetail::Mid,
            count,
            complete_only: true,
        }
    }

    pub fn with_price_detail(mut self, price_detail: PriceDetail) -> Self {
        self.price_detail = price_detail;
        self
    }

    pub fn with_complete_only(mut self, complete_only: bool) -> Self {
        self.complete_only = complete_only;
        self
    }
}
