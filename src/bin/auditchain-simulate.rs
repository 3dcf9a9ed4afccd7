#![forbid(unsafe_code)]
//! Classify a simulated transaction and record the result as an audit block.

use auditchain::cli::{check_form_limit, parse_override, Dashboard, EDITABLE_COLUMNS};
use auditchain::config::{load_config, DEFAULT_CONFIG_FILE};
use auditchain::dashboard::{chain_table, display_fields, prediction_banner, verification_line};
use auditchain::record::FieldValue;
use clap::Parser;
use colored::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Seconds since the first transaction (0 to 200000)
    #[arg(long, value_parser = parse_time)]
    time: Option<f64>,
    /// Transaction amount (0 to 2000)
    #[arg(long, value_parser = parse_amount)]
    amount: Option<f64>,
    #[arg(long)]
    v1: Option<f64>,
    #[arg(long)]
    v2: Option<f64>,
    #[arg(long)]
    v3: Option<f64>,
    /// Any other column, as COLUMN=VALUE (repeatable)
    #[arg(long = "set")]
    sets: Vec<String>,
}

fn parse_bounded(column: &str, raw: &str) -> Result<f64, String> {
    let value: f64 = raw.trim().parse().map_err(|_| format!("'{}' is not a number", raw))?;
    check_form_limit(column, &FieldValue::Float(value)).map_err(|e| e.to_string())?;
    Ok(value)
}

fn parse_time(raw: &str) -> Result<f64, String> {
    parse_bounded("Time", raw)
}

fn parse_amount(raw: &str) -> Result<f64, String> {
    parse_bounded("Amount", raw)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let dashboard = Dashboard::new(load_config(&cli.config)?);
    let dataset = dashboard.load_dataset()?;

    println!("{}", "🤖 Training classifier...".bright_cyan());
    let model = dashboard.model(&dataset)?;
    let ledger = dashboard.seeded_ledger(&dataset)?;

    let template = dashboard.template_transaction(&dataset)?;
    println!("{}", "Template transaction (editable fields):".bright_cyan().bold());
    for column in EDITABLE_COLUMNS {
        if let Some(value) = template.get(column) {
            println!("  {:<8} {}", column, value.to_string().bright_white());
        }
    }
    println!();

    let mut overrides = Vec::new();
    let named = [("Time", cli.time), ("Amount", cli.amount), ("V1", cli.v1), ("V2", cli.v2), ("V3", cli.v3)];
    for (column, value) in named {
        if let Some(v) = value {
            overrides.push((column.to_string(), FieldValue::Float(v)));
        }
    }
    for raw in &cli.sets {
        overrides.push(parse_override(raw)?);
    }

    let outcome = dashboard.simulate(&dataset, model.as_ref(), &overrides, &ledger)?;

    println!("{}", "Classification result".bright_cyan().bold());
    println!("{}", prediction_banner(&outcome.prediction));
    println!();

    let schema = ledger.schema().clone();
    println!("{}", "New audit block".bright_cyan().bold());
    println!("{}", chain_table(std::slice::from_ref(&outcome.block), &display_fields(&schema), true));
    println!(
        "{}",
        format!("Chain height: {} | tip: {}", ledger.len(), ledger.tip_hash()).dimmed()
    );
    println!("{}", verification_line(&ledger.verify()));
    println!(
        "{}",
        "The simulated transaction and its classification were recorded in the audit chain.".green()
    );

    Ok(())
}
