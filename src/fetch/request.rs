use chrono::SecondsFormat;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};

use crate::candle::{Instrument, PriceDetail};
use crate::error::{AppError, Context};
use crate::granularity::Granularity;
use crate::utils::time::epoch_to_datetime;
use crate::window::Window;

use super::FetchResult;

/// Fully resolved candles request: endpoint, headers and query string.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub url: String,
    pub headers: HeaderMap,
    pub query: Vec<(&'static str, String)>,
}

/// How the candles request is bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandleRange {
    Window(Window),
    Count(u32),
}

pub struct RequestContext<'a> {
    pub base_url: &'a str,
    pub api_key: &'a str,
    pub instrument: &'a Instrument,
    pub granularity: Granularity,
    pub price_detail: PriceDetail,
}

pub fn prepare_candles_request(
    context: RequestContext<'_>,
    range: CandleRange,
) -> FetchResult<PreparedRequest> {
    let url = format!(
        "{}/v3/instruments/{}/candles",
        context.base_url.trim_end_matches('/'),
        context.instrument.symbol()
    );

    let mut query = vec![
        ("price", context.price_detail.wire_value().to_string()),
        ("granularity", context.granularity.label().to_string()),
        ("alignmentTimezone", "UTC".to_string()),
        ("dailyAlignment", "0".to_string()),
    ];

    match range {
        CandleRange::Window(window) => {
            query.push(("from", format_epoch(window.from)?));
            query.push(("to", format_epoch(window.to)?));
        }
        CandleRange::Count(count) => query.push(("count", count.to_string())),
    }

    let headers = build_headers(context.api_key)?;

    Ok(PreparedRequest {
        url,
        headers,
        query,
    })
}

fn format_epoch(epoch: i64) -> FetchResult<String> {
    epoch_to_datetime(epoch)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .ok_or_else(|| AppError::message(format!("Epoch second {epoch} is out of range")))
}

fn build_headers(api_key: &str) -> FetchResult<HeaderMap> {
    let mut map = HeaderMap::new();
    let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
        .context("API key contains characters not allowed in a header")?;
    map.insert(AUTHORIZATION, bearer);
    map.insert(ACCEPT, HeaderValue::from_static("application/json"));
    map.insert(
        "accept-datetime-format",
        HeaderValue::from_static("RFC3339"),
    );
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context<'a>(instrument: &'a Instrument, detail: PriceDetail) -> RequestContext<'a> {
        RequestContext {
            base_url: "https://example.test/",
            api_key: "token",
            instrument,
            granularity: Granularity::H4,
            price_detail: detail,
        }
    }

    #[test]
    fn window_request_carries_rfc3339_bounds() {
        let instrument = Instrument::new("USD", "EUR");
        let prepared = prepare_candles_request(
            context(&instrument, PriceDetail::MidBidAsk),
            CandleRange::Window(Window {
                from: 1_672_531_200,
                to: 1_672_617_600,
            }),
        )
        .unwrap();

        assert_eq!(
            prepared.url,
            "https://example.test/v3/instruments/EUR_USD/candles"
        );
        assert!(prepared.query.contains(&("price", "MBA".to_string())));
        assert!(prepared.query.contains(&("granularity", "H4".to_string())));
        assert!(prepared
            .query
            .contains(&("from", "2023-01-01T00:00:00Z".to_string())));
        assert!(prepared
            .query
            .contains(&("to", "2023-01-02T00:00:00Z".to_string())));
        assert_eq!(
            prepared.headers.get(AUTHORIZATION).unwrap(),
            "Bearer token"
        );
    }

    #[test]
    fn count_request_has_no_bounds() {
        let instrument = Instrument::new("JPY", "USD");
        let prepared =
            prepare_candles_request(context(&instrument, PriceDetail::Mid), CandleRange::Count(50))
                .unwrap();

        assert!(prepared.query.contains(&("count", "50".to_string())));
        assert!(prepared.query.iter().all(|(key, _)| *key != "from"));
    }

    #[test]
    fn rejects_api_key_with_newline() {
        let instrument = Instrument::new("USD", "EUR");
        let mut ctx = context(&instrument, PriceDetail::Mid);
        ctx.api_key = "bad\nkey";
        assert!(prepare_candles_request(ctx, CandleRange::Count(1)).is_err());
    }
}
