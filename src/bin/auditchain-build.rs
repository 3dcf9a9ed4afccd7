#![forbid(unsafe_code)]
//! Build a hash chain from a CSV file or URL and verify it.

use auditchain::blockchain::{build, verify};
use auditchain::dashboard::{chain_table, display_fields, verification_line};
use auditchain::dataset::{ColumnRenames, Dataset};
use auditchain::record::FieldValue;
use auditchain::schema::ChainSchema;
use clap::Parser;
use colored::*;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// CSV file or http(s) URL with a header row
    input: String,
    /// Schema preset: covid or transactions
    #[arg(long, default_value = "covid")]
    schema: String,
    /// Comma-separated field list; overrides --schema
    #[arg(long, value_delimiter = ',')]
    fields: Vec<String>,
    /// Separator for --fields
    #[arg(long, default_value_t = '-')]
    separator: char,
    /// Rename a header before building, as RAW=CANONICAL (repeatable)
    #[arg(long = "rename")]
    renames: Vec<String>,
    /// Only chain the first N rows
    #[arg(long)]
    limit: Option<usize>,
    /// Print blocks as JSON instead of a table
    #[arg(long)]
    json: bool,
    /// Show full 64-character hashes
    #[arg(long)]
    full_hashes: bool,
    /// Corrupt the block at this index before verifying, to demonstrate tamper detection
    #[arg(long)]
    tamper: Option<usize>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let schema = if cli.fields.is_empty() {
        ChainSchema::preset(&cli.schema)?
    } else {
        ChainSchema::new("custom", cli.fields.clone(), cli.separator)?
    };

    let mut renames = ColumnRenames::new();
    for raw in &cli.renames {
        let (from, to) = raw
            .split_once('=')
            .ok_or_else(|| format!("--rename '{}' must look like RAW=CANONICAL", raw))?;
        renames.insert(from.trim().to_string(), to.trim().to_string());
    }

    let dataset = Dataset::load(&cli.input, &renames)?;
    let rows = match cli.limit {
        Some(n) => dataset.head(n),
        None => &dataset.records[..],
    };

    let mut chain = build(rows, &schema)?;

    if let Some(index) = cli.tamper {
        let block = chain
            .get_mut(index)
            .ok_or_else(|| format!("--tamper {} is past the end of a {}-block chain", index, rows.len()))?;
        let field = schema.fields[0].clone();
        let original = block.fields.get(&field).map(|v| v.to_string()).unwrap_or_default();
        block.fields.set(field.clone(), FieldValue::Text(format!("{}*", original)));
        eprintln!(
            "{}",
            format!("Tampered block {}: {} = {}*", index, field, original).yellow()
        );
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&chain)?);
    } else {
        println!(
            "{}",
            format!("⛓️  {} blocks ({} schema)", chain.len(), schema.name).bright_cyan().bold()
        );
        println!("{}", chain_table(&chain, &display_fields(&schema), cli.full_hashes));
    }

    let outcome = verify(&chain, &schema);
    eprintln!("{}", verification_line(&outcome));
    if !outcome.is_valid() {
        std::process::exit(1);
    }
    Ok(())
}
