use super::chain::{build_from, Block, GENESIS_HASH};
use super::validation::{verify, Verification};
use crate::error::{ChainError, Result};
use crate::record::Record;
use crate::schema::ChainSchema;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Shared, append-only chain.
///
/// Each block's `previous_hash` depends on the block before it, so every append
/// computes and pushes under one lock. Clones share the same chain.
#[derive(Debug, Clone)]
pub struct AuditLedger {
    schema: Arc<ChainSchema>,
    blocks: Arc<Mutex<Vec<Block>>>,
}

impl AuditLedger {
    pub fn new(schema: ChainSchema) -> Self {
        Self {
            schema: Arc::new(schema),
            blocks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Seeds the ledger with an existing chain, which must verify under `schema`.
    pub fn from_blocks(schema: ChainSchema, blocks: Vec<Block>) -> Result<Self> {
        if let Verification::Mismatch { index, .. } = verify(&blocks, &schema) {
            return Err(ChainError::InvalidChain { index });
        }
        Ok(Self {
            schema: Arc::new(schema),
            blocks: Arc::new(Mutex::new(blocks)),
        })
    }

    pub fn schema(&self) -> &ChainSchema {
        &self.schema
    }

    /// Appends one record and returns the stored block.
    pub fn append(&self, record: Record) -> Result<Block> {
        let mut guard = self.blocks.lock();
        let previous_hash = tip_of(&guard);
        let block = Block::new(record, previous_hash, &self.schema, guard.len())?;
        guard.push(block.clone());
        debug!(height = guard.len(), hash = %block.current_hash, "appended audit block");
        Ok(block)
    }

    /// Appends all records or none of them.
    pub fn extend(&self, records: &[Record]) -> Result<Vec<Block>> {
        let mut guard = self.blocks.lock();
        let anchor = tip_of(&guard);
        let start = guard.len();
        let new_blocks = build_from(records, &self.schema, &anchor).map_err(|err| match err {
            ChainError::MissingField { field, row } => ChainError::MissingField {
                field,
                row: start + row,
            },
            other => other,
        })?;
        guard.extend(new_blocks.iter().cloned());
        Ok(new_blocks)
    }

    /// Hash the next block will link to.
    pub fn tip_hash(&self) -> String {
        tip_of(&self.blocks.lock())
    }

    pub fn len(&self) -> usize {
        self.blocks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<Block> {
        self.blocks.lock().clone()
    }

    pub fn verify(&self) -> Verification {
        let blocks = self.snapshot();
        verify(&blocks, &self.schema)
    }
}

fn tip_of(blocks: &[Block]) -> String {
    blocks
        .last()
        .map(|b| b.current_hash.clone())
        .unwrap_or_else(|| GENESIS_HASH.to_string())
}
