use std::time::Duration;

use anyhow::bail;
use reqwest::blocking::Client;

use crate::candle::{Candle, Instrument, PriceDetail};
use crate::config::{validate_recent_query, OandaCredentials, RecentQuery};
use crate::error::{AppError, Context};
use crate::granularity::Granularity;
use crate::records::ResultTable;
use crate::window::Window;

use super::decode::{error_detail, parse_candles};
use super::request::{prepare_candles_request, CandleRange, PreparedRequest, RequestContext};
use super::{CandleSource, FetchResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking client for the broker's instrument candles endpoint.
pub struct OandaClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OandaClient {
    pub fn new(credentials: &OandaCredentials) -> FetchResult<Self> {
        Self::with_base_url(credentials, credentials.environment.base_url())
    }

    pub fn with_base_url<U: Into<String>>(
        credentials: &OandaCredentials,
        base_url: U,
    ) -> FetchResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to construct broker HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: credentials.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Single-shot read of the latest `count` candles.
    pub fn recent_candles(&self, query: &RecentQuery) -> FetchResult<ResultTable> {
        validate_recent_query(query)?;

        let prepared = prepare_candles_request(
            self.context(&query.instrument, query.granularity, query.price_detail),
            CandleRange::Count(query.count),
        )?;
        let label = format!("latest {} candles", query.count);

        let candles = self.execute(&prepared, query.price_detail, &query.instrument, &label)?;
        log::info!(
            "Read {} {} candles for {}",
            candles.len(),
            query.granularity,
            query.instrument
        );

        Ok(ResultTable::from_candles(candles, query.complete_only))
    }

    fn context<'a>(
        &'a self,
        instrument: &'a Instrument,
        granularity: Granularity,
        price_detail: PriceDetail,
    ) -> RequestContext<'a> {
        RequestContext {
            base_url: &self.base_url,
            api_key: &self.api_key,
            instrument,
            granularity,
            price_detail,
        }
    }

    // One HTTP call; every failure past this point is a remote failure for `label`.
    fn execute(
        &self,
        prepared: &PreparedRequest,
        price_detail: PriceDetail,
        instrument: &Instrument,
        label: &str,
    ) -> FetchResult<Vec<Candle>> {
        let candles = self
            .send(prepared, price_detail)
            .map_err(|cause| AppError::remote(format!("{instrument} {label}"), cause))?;

        if candles.is_empty() {
            return Err(AppError::EmptyBatch {
                instrument: instrument.to_string(),
                window: label.to_string(),
            });
        }

        Ok(candles)
    }

    fn send(
        &self,
        prepared: &PreparedRequest,
        price_detail: PriceDetail,
    ) -> anyhow::Result<Vec<Candle>> {
        let response = self
            .client
            .get(&prepared.url)
            .headers(prepared.headers.clone())
            .query(&prepared.query)
            .send()
            .context("Candles request could not be sent")?;

        let status = response.status();
        let body = response
            .text()
            .context("Failed to read candles response body")?;

        if !status.is_success() {
            bail!("provider answered {status}: {}", error_detail(&body));
        }

        parse_candles(&body, price_detail)
    }
}

impl CandleSource for OandaClient {
    fn fetch(
        &self,
        instrument: &Instrument,
        granularity: Granularity,
        window: Window,
        price_detail: PriceDetail,
    ) -> FetchResult<Vec<Candle>> {
        let prepared = prepare_candles_request(
            self.context(instrument, granularity, price_detail),
            CandleRange::Window(window),
        )?;
        self.execute(&prepared, price_detail, instrument, &window.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OandaEnvironment;
    use mockito::Matcher;

    const PATH: &str = "/v3/instruments/EUR_USD/candles";

    fn client(server: &mockito::Server) -> OandaClient {
        let credentials = OandaCredentials::new("test-key", OandaEnvironment::Practice);
        OandaClient::with_base_url(&credentials, server.url()).unwrap()
    }

    fn instrument() -> Instrument {
        Instrument::new("USD", "EUR")
    }

    fn window() -> Window {
        Window {
            from: 1_672_531_200,
            to: 1_672_617_600,
        }
    }

    #[test]
    fn fetches_one_window() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", PATH)
            .match_header("authorization", "Bearer test-key")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("granularity".into(), "H1".into()),
                Matcher::UrlEncoded("price".into(), "M".into()),
                Matcher::UrlEncoded("from".into(), "2023-01-01T00:00:00Z".into()),
                Matcher::UrlEncoded("to".into(), "2023-01-02T00:00:00Z".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"instrument":"EUR_USD","granularity":"H1","candles":[
                    {"complete":true,"volume":10,"time":"2023-01-01T00:00:00.000000000Z",
                     "mid":{"o":"1.0700","h":"1.0710","l":"1.0690","c":"1.0705"}},
                    {"complete":true,"volume":11,"time":"2023-01-01T01:00:00.000000000Z",
                     "mid":{"o":"1.0705","h":"1.0712","l":"1.0701","c":"1.0709"}}]}"#,
            )
            .expect(1)
            .create();

        let candles = client(&server)
            .fetch(&instrument(), Granularity::H1, window(), PriceDetail::Mid)
            .unwrap();

        mock.assert();
        assert_eq!(candles.len(), 2);
        assert!((candles[1].mid.close - 1.0709).abs() < 1e-9);
    }

    #[test]
    fn empty_batch_is_distinct_from_transport_failure() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"instrument":"EUR_USD","granularity":"H1","candles":[]}"#)
            .create();

        let err = client(&server)
            .fetch(&instrument(), Granularity::H1, window(), PriceDetail::Mid)
            .unwrap_err();
        assert!(err.is_empty_batch(), "unexpected error: {err}");
        assert!(!err.is_remote());
    }

    #[test]
    fn auth_failure_is_a_remote_error_with_provider_message() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", PATH)
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"errorMessage":"Insufficient authorization to perform request."}"#)
            .create();

        let err = client(&server)
            .fetch(&instrument(), Granularity::H1, window(), PriceDetail::Mid)
            .unwrap_err();
        assert!(err.is_remote());
        let message = err.to_string();
        assert!(message.contains("Insufficient authorization"), "{message}");
        assert!(message.contains("EUR_USD"), "{message}");
    }

    #[test]
    fn malformed_payload_is_a_remote_error() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("not json")
            .create();

        let err = client(&server)
            .fetch(&instrument(), Granularity::H1, window(), PriceDetail::Mid)
            .unwrap_err();
        assert!(err.is_remote());
    }

    #[test]
    fn recent_candles_filters_incomplete() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", PATH)
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("count".into(), "3".into()),
                Matcher::UrlEncoded("granularity".into(), "M5".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"candles":[
                    {"complete":true,"volume":1,"time":"2023-01-02T10:00:00Z","mid":{"o":"1","h":"2","l":"0.5","c":"1.5"}},
                    {"complete":true,"volume":1,"time":"2023-01-02T10:05:00Z","mid":{"o":"1.5","h":"2","l":"1","c":"1.8"}},
                    {"complete":false,"volume":1,"time":"2023-01-02T10:10:00Z","mid":{"o":"1.8","h":"1.9","l":"1.7","c":"1.75"}}]}"#,
            )
            .create();

        let query = RecentQuery::new(instrument(), Granularity::M5, 3);
        let table = client(&server).recent_candles(&query).unwrap();

        mock.assert();
        assert_eq!(table.len(), 2);
        assert!(table.candles().all(|candle| candle.complete));
    }

    #[test]
    fn recent_candles_rejects_bad_count_without_calling_out() {
        let mut server = mockito::Server::new();
        let mock = server.mock("GET", Matcher::Any).expect(0).create();

        let query = RecentQuery::new(instrument(), Granularity::M5, 0);
        let err = client(&server).recent_candles(&query).unwrap_err();

        mock.assert();
        assert!(matches!(err, AppError::InvalidCount(0)));
    }
}
