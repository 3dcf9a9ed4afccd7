//! Canonical serialization of records into the content string that gets hashed.
//!
//! The content string is the schema's fields, in schema order, formatted with
//! [`FieldValue`](crate::record::FieldValue)'s canonical `Display` and joined
//! with the separator. Different schemas produce different hashes for the same
//! row; a chain must always be verified with the schema that built it.

use crate::error::{ChainError, Result};
use crate::record::Record;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SEPARATOR: char = '-';

/// Number of anonymised PCA features in the card transaction dataset.
pub const TRANSACTION_LATENT_FEATURES: usize = 28;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSchema {
    pub name: String,
    pub fields: Vec<String>,
    pub separator: char,
}

impl ChainSchema {
    pub fn new(name: impl Into<String>, fields: Vec<String>, separator: char) -> Result<Self> {
        if fields.is_empty() {
            return Err(ChainError::InvalidSchema("schema needs at least one field".to_string()));
        }
        if let Some(dup) = fields.iter().enumerate().find_map(|(i, f)| fields[..i].contains(f).then_some(f)) {
            return Err(ChainError::InvalidSchema(format!("duplicate field '{}'", dup)));
        }
        Ok(Self {
            name: name.into(),
            fields,
            separator,
        })
    }

    /// Daily per-state case aggregates: `state-date-new_cases-deaths`.
    pub fn covid() -> Self {
        Self {
            name: "covid".to_string(),
            fields: ["state", "date", "new_cases", "deaths"].iter().map(|s| s.to_string()).collect(),
            separator: DEFAULT_SEPARATOR,
        }
    }

    /// Card transactions: `Time`, `V1`..`V28`, `Amount`, then the `Class` label.
    pub fn transactions() -> Self {
        let mut fields = Vec::with_capacity(TRANSACTION_LATENT_FEATURES + 3);
        fields.push("Time".to_string());
        fields.extend((1..=TRANSACTION_LATENT_FEATURES).map(|i| format!("V{}", i)));
        fields.push("Amount".to_string());
        fields.push("Class".to_string());
        Self {
            name: "transactions".to_string(),
            fields,
            separator: DEFAULT_SEPARATOR,
        }
    }

    /// Resolves a preset by name, as used in `auditchain.toml`.
    pub fn preset(name: &str) -> Result<Self> {
        match name {
            "covid" => Ok(Self::covid()),
            "transactions" => Ok(Self::transactions()),
            other => Err(ChainError::InvalidSchema(format!(
                "unknown schema preset '{}' (expected 'covid' or 'transactions')",
                other
            ))),
        }
    }

    /// Builds the content string for the record at position `row`.
    pub fn serialize(&self, record: &Record, row: usize) -> Result<String> {
        let mut out = String::new();
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                out.push(self.separator);
            }
            let value = record.require(field, row)?;
            out.push_str(&value.to_string());
        }
        Ok(out)
    }
}
