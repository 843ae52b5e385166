//! Order Book Processor
//!
//! Applies an add/modify/delete order feed to per-symbol books and reports
//! every record that could not be applied.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use order_book_processor::config::parse_delimiter;
use order_book_processor::processor::open_input;
use order_book_processor::{Config, DumpFormat, LogFormat, OrderProcessor};

#[derive(Debug, Parser)]
#[command(name = "order-book-processor", version, about)]
struct Cli {
    /// Order feed, one record per line
    input: PathBuf,

    /// Dump every book once the feed is exhausted
    #[arg(long, value_enum)]
    dump: Option<DumpFormat>,

    /// Write Prometheus counters to this file when the run ends
    #[arg(long)]
    metrics_path: Option<PathBuf>,

    /// Field delimiter of the feed
    #[arg(long, value_parser = parse_delimiter)]
    delimiter: Option<char>,

    /// Report book errors without the book's depth view
    #[arg(long)]
    no_book_on_error: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(dump) = self.dump {
            config.dump_format = dump;
        }
        if let Some(path) = &self.metrics_path {
            config.metrics_path = Some(path.clone());
        }
        if let Some(delimiter) = self.delimiter {
            config.delimiter = delimiter;
        }
        if self.no_book_on_error {
            config.print_book_on_error = false;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load configuration")?;
    cli.apply(&mut config);

    // Logs go to stderr; stdout carries the reports
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = config.log_format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();

    info!(input = %cli.input.display(), "Starting order book processor");

    let reader = open_input(&cli.input)
        .await
        .with_context(|| format!("Can not open the file {}", cli.input.display()))?;

    let mut processor = OrderProcessor::new(config.clone())?;
    let mut stdout = tokio::io::stdout();
    processor.run(reader, &mut stdout).await?;

    if let Some(dump) = processor.render_dump(config.dump_format)? {
        stdout.write_all(dump.as_bytes()).await?;
        stdout.flush().await?;
    }

    if let Some(path) = &config.metrics_path {
        let metrics = processor.stats().encode()?;
        tokio::fs::write(path, metrics)
            .await
            .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
        info!(path = %path.display(), "Metrics written");
    }

    Ok(())
}
