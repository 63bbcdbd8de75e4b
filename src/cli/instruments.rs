//! CLI command for listing the instruments a sync would cover

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;
use std::str::FromStr;

use crate::dataset::AssetClass;
use crate::fetcher::catalog::BinanceCatalog;
use crate::fetcher::RemoteCatalog;
use crate::universe::select_instruments;

/// Arguments for `instruments`
#[derive(Debug, Args)]
pub struct InstrumentsArgs {
    /// Asset class: spot, um or cm
    #[arg(long, default_value = "spot")]
    pub asset_class: String,

    /// Comma-separated allow-list (default: every USDT symbol)
    #[arg(long, value_delimiter = ',')]
    pub tickers: Vec<String>,

    /// Comma-separated deny-list
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Show at most this many instruments
    #[arg(long)]
    pub max_instruments: Option<usize>,

    /// Output format
    #[arg(long, default_value = "human")]
    pub format: OutputFormat,
}

/// Output format for the instruments command
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

impl InstrumentsArgs {
    /// Execute the instruments command
    pub async fn execute(&self) -> Result<()> {
        let asset_class = AssetClass::from_str(&self.asset_class)?;
        let catalog = BinanceCatalog::new(asset_class);
        let all = catalog
            .list_instruments()
            .await
            .with_context(|| format!("Failed to list {asset_class} instruments"))?;
        let selected = self.select(&all);

        println!("{}", render(asset_class, all.len(), &selected, self.format)?);
        Ok(())
    }

    fn select(&self, all: &[String]) -> Vec<String> {
        let mut selected = select_instruments(all, &self.tickers, &self.exclude);
        if let Some(max) = self.max_instruments {
            selected.truncate(max);
        }
        selected
    }
}

fn render(
    asset_class: AssetClass,
    total: usize,
    selected: &[String],
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&json!({
            "asset_class": asset_class.as_str(),
            "total": total,
            "selected": selected,
        }))
        .context("Failed to serialize instruments to JSON"),
        OutputFormat::Human => {
            let mut out = format!(
                "{} of {} {} instruments selected:\n",
                selected.len(),
                total,
                asset_class
            );
            for symbol in selected {
                out.push_str(symbol);
                out.push('\n');
            }
            Ok(out.trim_end().to_string())
        }
    }
}
