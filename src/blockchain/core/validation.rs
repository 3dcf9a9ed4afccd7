use super::chain::{Block, GENESIS_HASH};
use crate::error::ChainError;
use crate::schema::ChainSchema;
use std::fmt;
use tracing::{debug, warn};

/// Why a block failed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MismatchReason {
    /// Stored `previous_hash` does not match the predecessor (or the anchor at index 0).
    BrokenLink { expected: String, found: String },
    /// Stored `current_hash` does not match the recomputed one.
    HashMismatch { expected: String, found: String },
    /// The block's fields lack a field the schema serializes.
    Unserializable { field: String },
}

impl fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MismatchReason::BrokenLink { expected, found } => {
                write!(f, "previous_hash {} does not link to {}", found, expected)
            }
            MismatchReason::HashMismatch { expected, found } => {
                write!(f, "current_hash {} does not match recomputed {}", found, expected)
            }
            MismatchReason::Unserializable { field } => write!(f, "missing field '{}'", field),
        }
    }
}

/// Outcome of verifying a chain. Tampering is an expected result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Valid { blocks: usize },
    Mismatch { index: usize, reason: MismatchReason },
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid { .. })
    }

    /// Index of the first failing block, if any.
    pub fn failed_at(&self) -> Option<usize> {
        match self {
            Verification::Valid { .. } => None,
            Verification::Mismatch { index, .. } => Some(*index),
        }
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Verification::Valid { blocks } => write!(f, "chain valid ({} blocks)", blocks),
            Verification::Mismatch { index, reason } => write!(f, "block {}: {}", index, reason),
        }
    }
}

/// Verifies a chain produced by [`build`](super::chain::build).
pub fn verify(blocks: &[Block], schema: &ChainSchema) -> Verification {
    verify_from(blocks, schema, GENESIS_HASH)
}

/// Verifies a chain whose first block links to `anchor`.
///
/// Linkage is checked before each block's own hash; the first failure wins.
pub fn verify_from(blocks: &[Block], schema: &ChainSchema, anchor: &str) -> Verification {
    let mut expected_previous = anchor;

    for (index, block) in blocks.iter().enumerate() {
        if block.previous_hash != expected_previous {
            return mismatch(
                index,
                MismatchReason::BrokenLink {
                    expected: expected_previous.to_string(),
                    found: block.previous_hash.clone(),
                },
            );
        }

        let recomputed = match block.recompute_hash(schema, index) {
            Ok(hash) => hash,
            Err(ChainError::MissingField { field, .. }) => {
                return mismatch(index, MismatchReason::Unserializable { field });
            }
            Err(other) => {
                // Schema serialization only fails on missing fields.
                return mismatch(
                    index,
                    MismatchReason::Unserializable {
                        field: other.to_string(),
                    },
                );
            }
        };

        if recomputed != block.current_hash {
            return mismatch(
                index,
                MismatchReason::HashMismatch {
                    expected: recomputed,
                    found: block.current_hash.clone(),
                },
            );
        }

        expected_previous = block.current_hash.as_str();
    }

    debug!(blocks = blocks.len(), schema = %schema.name, "chain verified");
    Verification::Valid { blocks: blocks.len() }
}

fn mismatch(index: usize, reason: MismatchReason) -> Verification {
    warn!(index, %reason, "hash chain verification failed");
    Verification::Mismatch { index, reason }
}
