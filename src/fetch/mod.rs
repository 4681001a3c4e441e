use crate::candle::{Candle, Instrument, PriceDetail};
use crate::error::Result;
use crate::granularity::Granularity;
use crate::window::Window;

pub mod decode;
pub mod oanda;
pub mod request;
pub mod yahoo;

pub use oanda::OandaClient;
pub use yahoo::{YahooClient, YahooInterval, YahooPeriod};

pub type FetchResult<T> = Result<T>;

/// Anything able to return the candles of one window in a single call.
pub trait CandleSource {
    /// Fetch the candles of `window` in chronological order.
    ///
    /// Fails with `AppError::RemoteRequest` for transport, status or payload problems and with
    /// `AppError::EmptyBatch` when the provider answered but had nothing for the window.
    fn fetch(
        &self,
        instrument: &Instrument,
        granularity: Granularity,
        window: Window,
        price_detail: PriceDetail,
    ) -> FetchResult<Vec<Candle>>;
}

impl<T: CandleSource + ?Sized> CandleSource for &T {
    fn fetch(
        &self,
        instrument: &Instrument,
        granularity: Granularity,
        window: Window,
        price_detail: PriceDetail,
    ) -> FetchResult<Vec<Candle>> {
        (**self).fetch(instrument, granularity, window, price_detail)
    }
}
