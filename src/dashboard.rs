//! Terminal rendering of datasets, predictions and hash chains.

use crate::blockchain::{Block, Verification};
use crate::classifier::Prediction;
use crate::dataset::Dataset;
use crate::record::{FieldValue, Record};
use crate::schema::ChainSchema;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Color as TableColor;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};

/// Schemas wider than this are shown with a subset of their fields.
const MAX_CHAIN_FIELDS: usize = 6;

/// Headline numbers for a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub label_column: String,
    /// Rows labelled 1; `None` when the label column is absent.
    pub positives: Option<usize>,
}

impl Summary {
    pub fn from_dataset(dataset: &Dataset, label_column: &str) -> Self {
        let positives = dataset
            .has_column(label_column)
            .then(|| dataset.count_eq(label_column, &FieldValue::Integer(1)));
        Self {
            total: dataset.len(),
            label_column: label_column.to_string(),
            positives,
        }
    }

    pub fn positive_pct(&self) -> Option<f64> {
        match (self.positives, self.total) {
            (Some(_), 0) => Some(0.0),
            (Some(p), total) => Some(p as f64 / total as f64 * 100.0),
            (None, _) => None,
        }
    }
}

fn header(names: impl IntoIterator<Item = String>) -> Vec<Cell> {
    names
        .into_iter()
        .map(|n| Cell::new(n).fg(TableColor::Cyan).add_attribute(Attribute::Bold))
        .collect()
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn cell_text(record: &Record, column: &str) -> String {
    record.get(column).map(|v| v.to_string()).unwrap_or_default()
}

/// `abcdef12...90ffee` style abbreviation used in narrow tables.
pub fn shorten_hash(hash: &str) -> String {
    let chars: Vec<char> = hash.chars().collect();
    if chars.len() > 20 {
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 8..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        hash.to_string()
    }
}

/// Fields worth showing for a schema: all of them when narrow, otherwise the
/// first three and the last two.
pub fn display_fields(schema: &ChainSchema) -> Vec<String> {
    if schema.fields.len() <= MAX_CHAIN_FIELDS {
        return schema.fields.clone();
    }
    let n = schema.fields.len();
    schema.fields[..3].iter().chain(&schema.fields[n - 2..]).cloned().collect()
}

/// First rows of the dataset, one column per dataset column.
pub fn sample_table(records: &[Record], columns: &[String]) -> Table {
    let mut table = new_table();
    table.set_header(header(columns.iter().cloned()));
    for record in records {
        table.add_row(columns.iter().map(|c| Cell::new(cell_text(record, c))).collect::<Vec<_>>());
    }
    table
}

pub fn summary_table(summary: &Summary) -> Table {
    let mut table = new_table();
    table.set_header(header(["Metric".to_string(), "Value".to_string()]));
    table.add_row(vec![Cell::new("Total records"), Cell::new(summary.total)]);
    if let (Some(positives), Some(pct)) = (summary.positives, summary.positive_pct()) {
        table.add_row(vec![
            Cell::new(format!("Flagged ({}=1)", summary.label_column)),
            Cell::new(positives).fg(TableColor::Red),
        ]);
        table.add_row(vec![
            Cell::new("Flagged share"),
            Cell::new(format!("{:.4}%", pct)).fg(TableColor::Red),
        ]);
    }
    table
}

/// Blocks with their chosen fields and both linkage hashes.
pub fn chain_table(blocks: &[Block], fields: &[String], full_hashes: bool) -> Table {
    let mut table = new_table();
    if full_hashes {
        // Wrapping would split hashes across lines.
        table.set_content_arrangement(ContentArrangement::Disabled);
    }
    let names = std::iter::once("#".to_string())
        .chain(fields.iter().cloned())
        .chain(["previous_hash".to_string(), "current_hash".to_string()]);
    table.set_header(header(names));

    let render = |h: &str| if full_hashes { h.to_string() } else { shorten_hash(h) };
    for (i, block) in blocks.iter().enumerate() {
        let mut row = vec![Cell::new(i)];
        row.extend(fields.iter().map(|f| Cell::new(cell_text(&block.fields, f))));
        row.push(Cell::new(render(&block.previous_hash)).fg(TableColor::Grey));
        row.push(Cell::new(render(&block.current_hash)).fg(TableColor::Green));
        table.add_row(row);
    }
    table
}

pub fn prediction_banner(prediction: &Prediction) -> String {
    let pct = format!("{:.4}%", prediction.probability * 100.0);
    if prediction.is_positive() {
        format!("🔴 {} (fraud probability: {})", "FRAUD DETECTED".red().bold(), pct)
    } else {
        format!("✅ {} (fraud probability: {})", "NORMAL TRANSACTION".green().bold(), pct)
    }
}

pub fn verification_line(outcome: &Verification) -> String {
    match outcome {
        Verification::Valid { .. } => format!("🔒 {}", outcome.to_string().green()),
        Verification::Mismatch { .. } => format!("⚠️  tamper detected at {}", outcome.to_string().red()),
    }
}
