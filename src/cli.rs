//! Wiring shared by the binaries.
//!
//! [`Dashboard`] carries the configuration and the caches explicitly; nothing
//! here is global, so tests and binaries can each build their own.

use crate::blockchain::{build, AuditLedger, Block};
use crate::cache::{DatasetCache, ModelCache};
use crate::classifier::{Classifier, LogisticModel, Prediction};
use crate::config::Config;
use crate::dataset::Dataset;
use crate::error::{ChainError, Result};
use crate::record::{FieldValue, Record};
use crate::schema::ChainSchema;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::info;

/// Seed for picking the template transaction, so reruns show the same form.
pub const TEMPLATE_SEED: u64 = 42;

/// Columns a user typically edits when simulating a card transaction.
pub const EDITABLE_COLUMNS: [&str; 5] = ["Time", "Amount", "V1", "V2", "V3"];

/// Inclusive bounds the transaction form accepts for bounded columns.
pub const FORM_LIMITS: [(&str, f64, f64); 2] = [("Time", 0.0, 200_000.0), ("Amount", 0.0, 2_000.0)];

#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub transaction: Record,
    pub prediction: Prediction,
    pub block: Block,
}

#[derive(Clone)]
pub struct Dashboard {
    pub config: Config,
    pub datasets: DatasetCache,
    pub models: ModelCache,
}

impl Dashboard {
    pub fn new(config: Config) -> Self {
        let datasets = DatasetCache::new(config.cache.datasets);
        let models = ModelCache::new(config.cache.models);
        Self::with_caches(config, datasets, models)
    }

    pub fn with_caches(config: Config, datasets: DatasetCache, models: ModelCache) -> Self {
        Self {
            config,
            datasets,
            models,
        }
    }

    pub fn schema(&self) -> Result<ChainSchema> {
        self.config.chain.schema()
    }

    pub fn label_column(&self) -> &str {
        &self.config.dataset.label_column
    }

    pub fn load_dataset(&self) -> Result<Arc<Dataset>> {
        let dataset = self.datasets.load(&self.config.dataset.path, &self.config.dataset.renames)?;
        if dataset.is_empty() {
            return Err(ChainError::InsufficientData(format!(
                "dataset {} has no rows",
                self.config.dataset.path
            )));
        }
        Ok(dataset)
    }

    pub fn model(&self, dataset: &Dataset) -> Result<Arc<LogisticModel>> {
        self.models.train(dataset, self.label_column(), &self.config.model)
    }

    /// Chain over the first `chain.sample_size` rows.
    pub fn sample_chain(&self, dataset: &Dataset) -> Result<Vec<Block>> {
        let wanted = self.config.chain.sample_size;
        if dataset.len() < wanted {
            return Err(ChainError::InsufficientData(format!(
                "need at least {} records for the sample chain, found {}",
                wanted,
                dataset.len()
            )));
        }
        build(dataset.head(wanted), &self.schema()?)
    }

    /// A ledger holding the sample chain, ready for new audit blocks.
    pub fn seeded_ledger(&self, dataset: &Dataset) -> Result<AuditLedger> {
        AuditLedger::from_blocks(self.schema()?, self.sample_chain(dataset)?)
    }

    /// A randomly chosen (seeded) label-0 row with the label column removed.
    pub fn template_transaction(&self, dataset: &Dataset) -> Result<Record> {
        let label = self.label_column();
        let negatives = dataset.filter_eq(label, &FieldValue::Integer(0));
        let mut rng = StdRng::seed_from_u64(TEMPLATE_SEED);
        let mut template = negatives
            .choose(&mut rng)
            .map(|r| (*r).clone())
            .ok_or_else(|| ChainError::InsufficientData(format!("no rows with {} = 0", label)))?;
        template.remove(label);
        Ok(template)
    }

    /// Classifies the template with `overrides` applied, records the predicted
    /// label in the label column and appends the row to `ledger`.
    pub fn simulate(
        &self,
        dataset: &Dataset,
        classifier: &dyn Classifier,
        overrides: &[(String, FieldValue)],
        ledger: &AuditLedger,
    ) -> Result<SimulationOutcome> {
        let label = self.label_column();
        let mut features = self.template_transaction(dataset)?;
        for (column, value) in overrides {
            if column == label || features.get(column).is_none() {
                return Err(ChainError::Config(format!("cannot override '{}'", column)));
            }
            check_form_limit(column, value)?;
            features.set(column.clone(), value.clone());
        }

        let prediction = classifier.classify(&features)?;

        // Back to dataset column order, with the predicted class as the label.
        let transaction: Record = dataset
            .columns
            .iter()
            .map(|c| {
                let value = if c == label {
                    FieldValue::Integer(prediction.label)
                } else {
                    features.get(c).cloned().unwrap_or_else(|| FieldValue::Text(String::new()))
                };
                (c.clone(), value)
            })
            .collect();

        let block = ledger.append(transaction.clone())?;
        info!(
            label = prediction.label,
            probability = prediction.probability,
            hash = %block.current_hash,
            "simulated transaction recorded"
        );
        Ok(SimulationOutcome {
            transaction,
            prediction,
            block,
        })
    }
}

/// Rejects values outside [`FORM_LIMITS`] for the bounded columns.
pub fn check_form_limit(column: &str, value: &FieldValue) -> Result<()> {
    let Some(&(_, low, high)) = FORM_LIMITS.iter().find(|(name, _, _)| *name == column) else {
        return Ok(());
    };
    match value.as_f64() {
        Some(v) if (low..=high).contains(&v) => Ok(()),
        _ => Err(ChainError::Config(format!(
            "{} must be a number between {} and {}, got {}",
            column, low, high, value
        ))),
    }
}

/// Parses `COLUMN=VALUE` into a typed override.
pub fn parse_override(raw: &str) -> Result<(String, FieldValue)> {
    let (column, value) = raw
        .split_once('=')
        .ok_or_else(|| ChainError::Config(format!("override '{}' must look like COLUMN=VALUE", raw)))?;
    let column = column.trim();
    if column.is_empty() {
        return Err(ChainError::Config(format!("override '{}' has no column", raw)));
    }
    Ok((column.to_string(), FieldValue::parse(value)))
}
