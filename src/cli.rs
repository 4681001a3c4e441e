use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use candle_read::config::DEFAULT_MAX_BATCH_SIZE;

#[derive(Parser)]
#[command(name = "candle-read")]
#[command(about = "Fetch OHLC candles from a broker or market-data API and print them as CSV")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Write CSV to this file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct PairArgs {
    /// Base currency, e.g. USD
    #[arg(long)]
    pub base: String,

    /// Quote currency, e.g. EUR (symbol becomes QUOTE_BASE)
    #[arg(long)]
    pub quote: String,

    /// Candle granularity label: M, W, D, H1-H12, M1-M30, S5-S30
    #[arg(short, long, default_value = "H1")]
    pub granularity: String,

    /// Request bid and ask prices alongside mid
    #[arg(long)]
    pub bid_ask: bool,

    /// Keep candles whose bucket has not finished yet
    #[arg(long)]
    pub include_incomplete: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read a date range from the broker API in fixed-size batches
    History {
        #[command(flatten)]
        pair: PairArgs,

        /// First day to read (YYYY-MM-DD, UTC midnight)
        #[arg(long)]
        start: String,

        /// Day to stop at (YYYY-MM-DD); defaults to now
        #[arg(long)]
        end: Option<String>,

        /// Candles requested per window
        #[arg(long, default_value_t = DEFAULT_MAX_BATCH_SIZE)]
        batch_size: u32,
    },

    /// Read the most recent candles from the broker API
    Recent {
        #[command(flatten)]
        pair: PairArgs,

        /// Number of candles to request (1-5000)
        #[arg(short = 'n', long, default_value_t = 100)]
        count: u32,
    },

    /// Read bars from the Yahoo Finance chart endpoint
    Yahoo {
        /// Ticker symbol, e.g. AAPL or EURUSD=X
        ticker: String,

        /// Bar interval: 1m,2m,5m,15m,30m,60m,90m,1h,1d,5d,1wk,1mo,3mo
        #[arg(short, long, default_value = "1d")]
        interval: String,

        /// Named period (1d,5d,1mo,3mo,6mo,1y,2y,5y,10y,ytd,max); overrides dates
        #[arg(short, long, conflicts_with_all = ["start", "end"])]
        period: Option<String>,

        /// First day to read (YYYY-MM-DD)
        #[arg(long, required_unless_present = "period")]
        start: Option<String>,

        /// Day to stop at (YYYY-MM-DD); defaults to now
        #[arg(long)]
        end: Option<String>,
    },
}
