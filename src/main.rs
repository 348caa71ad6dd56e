use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pricemap::config::Config;

mod cmd;

#[derive(Parser)]
#[command(name = "pricemap")]
#[command(version, about = "UK house-price explorer - Land Registry data on postcode maps")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to pricemap.toml. Defaults to ./pricemap.toml when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Bypass the fetch cache entirely for this invocation
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Invalidate the cached fetches this command would read, then refetch
    #[arg(long, global = true)]
    pub refresh: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a choropleth dataset: mean price per outcode, joined onto
    /// postcode polygons
    Map {
        #[arg(short, long)]
        town: String,
        /// Transaction year to aggregate over
        #[arg(short, long)]
        year: i32,
        /// Only include outcodes starting with this prefix (e.g. "WV1")
        #[arg(short, long, default_value = "")]
        prefix: String,
        /// Write the enriched GeoJSON here
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Start of the fetched date range (ISO-8601)
        #[arg(long, default_value = "2000-01-01")]
        from: NaiveDate,
        /// End of the fetched date range; defaults to today
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Monthly mean price per dwelling type, plus the five-year sales mix
    Trends {
        #[arg(short, long)]
        town: String,
        #[arg(long, default_value = "2000-01-01")]
        from: NaiveDate,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Three-month key statistics with year-over-year change
    Stats {
        #[arg(short, long)]
        town: String,
        #[arg(long, default_value = "2000-01-01")]
        from: NaiveDate,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Inspect or clear the fetch cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// Show the effective configuration
    Config,
}

#[derive(Subcommand, Clone)]
pub enum CacheCommands {
    /// Report entry count and total size
    Status,
    /// Remove every cached fetch
    Clear,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("pricemap=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pricemap=warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref(), !cli.no_cache)?;

    match cli.command {
        Commands::Map {
            town,
            year,
            prefix,
            out,
            from,
            to,
        } => {
            let params = cmd::fetch_params(town, from, to, cli.refresh);
            cmd::cmd_map(&config, params, year, &prefix, out.as_deref()).await?;
        }
        Commands::Trends { town, from, to } => {
            let params = cmd::fetch_params(town, from, to, cli.refresh);
            cmd::cmd_trends(&config, params).await?;
        }
        Commands::Stats { town, from, to } => {
            let params = cmd::fetch_params(town, from, to, cli.refresh);
            cmd::cmd_stats(&config, params).await?;
        }
        Commands::Cache { command } => cmd::cmd_cache(&config, &command)?,
        Commands::Config => cmd::cmd_config(&config),
    }

    Ok(())
}
