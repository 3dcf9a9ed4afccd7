#![forbid(unsafe_code)]
//! Dataset overview and sample audit chain.

use auditchain::blockchain::verify;
use auditchain::cli::Dashboard;
use auditchain::config::{load_config, DEFAULT_CONFIG_FILE};
use auditchain::dashboard::{
    chain_table, display_fields, sample_table, summary_table, verification_line, Summary,
};
use clap::Parser;
use colored::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Dataset path; overrides dataset.path from the config
    #[arg(long)]
    dataset: Option<String>,
    /// Rows to show in the sample table
    #[arg(long, default_value_t = 5)]
    rows: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    if let Some(path) = cli.dataset {
        config.dataset.path = path;
    }
    let dashboard = Dashboard::new(config);

    println!("{}", "💳 Transaction Audit (ML + Hash Chain)".bright_magenta().bold());
    println!();

    let dataset = dashboard.load_dataset().map_err(|e| {
        eprintln!(
            "{}",
            format!("❌ Could not load {}: {}", dashboard.config.dataset.path, e).red().bold()
        );
        e
    })?;

    println!("{}", "Sample of loaded data".bright_cyan().bold());
    println!("{}", sample_table(dataset.head(cli.rows), &dataset.columns));
    println!();

    println!("{}", "Summary".bright_cyan().bold());
    let summary = Summary::from_dataset(&dataset, dashboard.label_column());
    println!("{}", summary_table(&summary));
    if summary.positives.is_none() {
        println!(
            "{}",
            format!(
                "⚠️  Column '{}' not found; fraud metrics unavailable.",
                dashboard.label_column()
            )
            .yellow()
        );
    }
    println!();

    println!("{}", "Sample hash chain (genesis and first blocks)".bright_cyan().bold());
    let schema = dashboard.schema()?;
    match dashboard.sample_chain(&dataset) {
        Ok(chain) => {
            println!("{}", chain_table(&chain, &display_fields(&schema), false));
            println!("{}", verification_line(&verify(&chain, &schema)));
        }
        Err(e) => println!("{}", format!("⚠️  {}", e).yellow()),
    }

    Ok(())
}
