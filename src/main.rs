mod cli;

use std::io;

use anyhow::{Context, Result};
use clap::Parser;

use candle_read::candle::{Instrument, PriceDetail};
use candle_read::config::{HistoricQuery, OandaCredentials, RecentQuery};
use candle_read::fetch::{OandaClient, YahooClient, YahooInterval, YahooPeriod};
use candle_read::granularity::Granularity;
use candle_read::records::ResultTable;
use candle_read::services::HistoricAggregator;

use cli::{Cli, Commands, PairArgs};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let table = match &cli.command {
        Commands::History {
            pair,
            start,
            end,
            batch_size,
        } => read_history(pair, start, end.as_deref(), *batch_size)?,
        Commands::Recent { pair, count } => read_recent(pair, *count)?,
        Commands::Yahoo {
            ticker,
            interval,
            period,
            start,
            end,
        } => read_yahoo(
            ticker,
            interval,
            period.as_deref(),
            start.as_deref(),
            end.as_deref(),
        )?,
    };

    match &cli.output {
        Some(path) => {
            table.save_to_csv(path)?;
            log::info!("Wrote {} rows to {}", table.len(), path.display());
        }
        None => table.write_csv(io::stdout().lock())?,
    }

    Ok(())
}

fn read_history(
    pair: &PairArgs,
    start: &str,
    end: Option<&str>,
    batch_size: u32,
) -> Result<ResultTable> {
    let granularity = Granularity::from_label(&pair.granularity)?;
    let query = HistoricQuery::new(Instrument::new(&pair.base, &pair.quote), granularity)
        .with_price_detail(PriceDetail::from_flag(pair.bid_ask))
        .with_complete_only(!pair.include_incomplete)
        .with_max_batch_size(batch_size);

    let client = broker_client()?;
    let table = HistoricAggregator::new(&client, query).aggregate(start, end)?;
    Ok(table)
}

fn read_recent(pair: &PairArgs, count: u32) -> Result<ResultTable> {
    let granularity = Granularity::from_label(&pair.granularity)?;
    let query = RecentQuery::new(Instrument::new(&pair.base, &pair.quote), granularity, count)
        .with_price_detail(PriceDetail::from_flag(pair.bid_ask))
        .with_complete_only(!pair.include_incomplete);

    let client = broker_client()?;
    Ok(client.recent_candles(&query)?)
}

fn read_yahoo(
    ticker: &str,
    interval: &str,
    period: Option<&str>,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<ResultTable> {
    let interval: YahooInterval = interval.parse()?;
    let client = YahooClient::new()?;

    let table = match (period, start) {
        (Some(period), _) => {
            let period: YahooPeriod = period.parse()?;
            client.history_period(ticker, period, interval)?
        }
        (None, Some(start)) => client.history_range(ticker, start, end, interval)?,
        (None, None) => anyhow::bail!("either --period or --start is required"),
    };
    Ok(table)
}

fn broker_client() -> Result<OandaClient> {
    let credentials = OandaCredentials::from_env().context("Broker credentials unavailable")?;
    Ok(OandaClient::new(&credentials)?)
}
