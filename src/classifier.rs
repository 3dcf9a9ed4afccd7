//! Binary classification of records.
//!
//! The dashboard only sees the [`Classifier`] trait: a record goes in, a label
//! and a positive-class probability come out. [`LogisticModel`] is the bundled
//! implementation: standardised features, balanced class weights, and
//! deterministic full-batch gradient descent.

use crate::dataset::Dataset;
use crate::error::{ChainError, Result};
use crate::record::{FieldValue, Record};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Probability at or above which a record is labelled positive.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Rows per partial gradient during training.
const GRADIENT_CHUNK: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: i64,
    /// Probability of the positive class (label 1).
    pub probability: f64,
}

impl Prediction {
    pub fn from_probability(probability: f64) -> Self {
        let label = if probability >= DECISION_THRESHOLD { 1 } else { 0 };
        Self { label, probability }
    }

    pub fn is_positive(&self) -> bool {
        self.label == 1
    }
}

pub trait Classifier: Send + Sync {
    fn predict_proba(&self, record: &Record) -> Result<f64>;

    fn classify(&self, record: &Record) -> Result<Prediction> {
        Ok(Prediction::from_probability(self.predict_proba(record)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainParams {
    pub epochs: usize,
    pub learning_rate: f64,
    /// Inverse regularisation strength.
    pub c: f64,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            epochs: 300,
            learning_rate: 0.1,
            c: 1.0,
        }
    }
}

/// Per-feature standardisation: `(x - mean) / std`, with a zero std scaling by 1.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    pub means: Vec<f64>,
    pub scales: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>], width: usize) -> Self {
        let n = rows.len().max(1) as f64;
        let mut means = vec![0.0; width];
        for row in rows {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        means.iter_mut().for_each(|m| *m /= n);

        let mut scales = vec![0.0; width];
        for row in rows {
            for ((s, v), m) in scales.iter_mut().zip(row).zip(&means) {
                *s += (v - m).powi(2);
            }
        }
        for s in scales.iter_mut() {
            *s = (*s / n).sqrt();
            if *s == 0.0 {
                *s = 1.0;
            }
        }
        Self { means, scales }
    }

    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(&self.means)
            .zip(&self.scales)
            .map(|((v, m), s)| (v - m) / s)
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct LogisticModel {
    pub features: Vec<String>,
    pub label_column: String,
    pub scaler: StandardScaler,
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl LogisticModel {
    /// Trains on every column of `dataset` except `label_column`, whose values must be 0 or 1.
    pub fn train(dataset: &Dataset, label_column: &str, params: &TrainParams) -> Result<Self> {
        if dataset.is_empty() {
            return Err(ChainError::InsufficientData("cannot train on an empty dataset".to_string()));
        }
        if !dataset.has_column(label_column) {
            return Err(ChainError::MissingField {
                field: label_column.to_string(),
                row: 0,
            });
        }

        let features: Vec<String> = dataset.columns.iter().filter(|c| *c != label_column).cloned().collect();

        let mut raw = Vec::with_capacity(dataset.len());
        let mut labels = Vec::with_capacity(dataset.len());
        for (row, record) in dataset.records.iter().enumerate() {
            raw.push(feature_vector(&features, record, row)?);
            labels.push(binary_label(record.require(label_column, row)?, row)?);
        }

        let positives = labels.iter().filter(|&&y| y == 1).count();
        let negatives = labels.len() - positives;
        if positives == 0 || negatives == 0 {
            return Err(ChainError::Model(format!(
                "'{}' needs both classes to train (found {} positive, {} negative)",
                label_column, positives, negatives
            )));
        }

        let n = labels.len() as f64;
        let class_weight = [n / (2.0 * negatives as f64), n / (2.0 * positives as f64)];

        let scaler = StandardScaler::fit(&raw, features.len());
        let xs: Vec<Vec<f64>> = raw.iter().map(|r| scaler.transform(r)).collect();

        let width = features.len();
        let l2 = 1.0 / (params.c * n);
        let mut weights = vec![0.0; width];
        let mut bias = 0.0;

        for _ in 0..params.epochs {
            // Fixed chunk boundaries and an in-order sum keep the float
            // accumulation identical whatever the thread count.
            let partials: Vec<(Vec<f64>, f64)> = xs
                .par_chunks(GRADIENT_CHUNK)
                .zip(labels.par_chunks(GRADIENT_CHUNK))
                .map(|(chunk, ys)| {
                    let mut gw = vec![0.0; width];
                    let mut gb = 0.0;
                    for (x, &y) in chunk.iter().zip(ys) {
                        let p = sigmoid(dot(&weights, x) + bias);
                        let err = class_weight[y as usize] * (p - y as f64);
                        for (g, v) in gw.iter_mut().zip(x) {
                            *g += err * v;
                        }
                        gb += err;
                    }
                    (gw, gb)
                })
                .collect();

            let mut grad_w = vec![0.0; width];
            let mut grad_b = 0.0;
            for (gw, gb) in &partials {
                for (a, b) in grad_w.iter_mut().zip(gw) {
                    *a += b;
                }
                grad_b += gb;
            }

            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= params.learning_rate * (g / n + l2 * *w);
            }
            bias -= params.learning_rate * grad_b / n;
        }

        info!(
            rows = labels.len(),
            features = width,
            positives,
            epochs = params.epochs,
            "trained logistic model"
        );

        Ok(Self {
            features,
            label_column: label_column.to_string(),
            scaler,
            weights,
            bias,
        })
    }
}

impl Classifier for LogisticModel {
    fn predict_proba(&self, record: &Record) -> Result<f64> {
        let raw = feature_vector(&self.features, record, 0)?;
        let x = self.scaler.transform(&raw);
        Ok(sigmoid(dot(&self.weights, &x) + self.bias))
    }
}

fn feature_vector(features: &[String], record: &Record, row: usize) -> Result<Vec<f64>> {
    features
        .iter()
        .map(|f| {
            record.require(f, row)?.as_f64().ok_or_else(|| {
                ChainError::Model(format!("feature '{}' in record {} is not numeric", f, row))
            })
        })
        .collect()
}

fn binary_label(value: &FieldValue, row: usize) -> Result<u8> {
    match value.as_i64() {
        Some(0) => Ok(0),
        Some(1) => Ok(1),
        _ => Err(ChainError::Model(format!("label '{}' in record {} is not 0 or 1", value, row))),
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
