use crate::error::Result;
use crate::record::Record;
use crate::schema::ChainSchema;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Previous-hash value of the first block: 64 ASCII zeros.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Length of a lowercase hex SHA-256 digest.
pub const HASH_HEX_LEN: usize = 64;

/// Lowercase hex SHA-256 of `content` immediately followed by `previous_hash`.
///
/// No separator goes between the two; the byte layout is a compatibility contract.
pub fn compute_hash(content: &str, previous_hash: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher.update(previous_hash.as_bytes());
    hex::encode(hasher.finalize())
}

/// True for a 64-character lowercase hex string.
pub fn is_hash_hex(s: &str) -> bool {
    s.len() == HASH_HEX_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Block {
    pub fields: Record,
    pub previous_hash: String,
    pub current_hash: String,
}

impl Block {
    /// Hashes `fields` against `previous_hash`. `row` only tags a `MissingField` error.
    pub fn new(fields: Record, previous_hash: String, schema: &ChainSchema, row: usize) -> Result<Self> {
        let content = schema.serialize(&fields, row)?;
        let current_hash = compute_hash(&content, &previous_hash);
        Ok(Block {
            fields,
            previous_hash,
            current_hash,
        })
    }

    /// Recomputes the hash from the stored fields and previous hash.
    pub fn recompute_hash(&self, schema: &ChainSchema, row: usize) -> Result<String> {
        let content = schema.serialize(&self.fields, row)?;
        Ok(compute_hash(&content, &self.previous_hash))
    }
}

/// Builds a fresh chain anchored at [`GENESIS_HASH`].
pub fn build(records: &[Record], schema: &ChainSchema) -> Result<Vec<Block>> {
    build_from(records, schema, GENESIS_HASH)
}

/// Builds a chain whose first block links to `anchor` instead of the genesis sentinel.
///
/// Passing the last `current_hash` of an existing chain yields blocks that extend it.
/// A missing field aborts the whole build; no partial chain is returned.
pub fn build_from(records: &[Record], schema: &ChainSchema, anchor: &str) -> Result<Vec<Block>> {
    let mut blocks = Vec::with_capacity(records.len());
    let mut previous_hash = anchor.to_string();

    for (row, record) in records.iter().enumerate() {
        let block = Block::new(record.clone(), previous_hash, schema, row)?;
        previous_hash = block.current_hash.clone();
        blocks.push(block);
    }

    debug!(
        schema = %schema.name,
        blocks = blocks.len(),
        tip = %previous_hash,
        "built hash chain"
    );
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChainError;

    fn scenario() -> Vec<Record> {
        vec![
            Record::new().with("state", "X").with("date", "1").with("new_cases", 2).with("deaths", 0),
            Record::new().with("state", "Y").with("date", "2").with("new_cases", 3).with("deaths", 1),
        ]
    }

    #[test]
    fn test_genesis_constant() {
        assert_eq!(GENESIS_HASH.len(), HASH_HEX_LEN);
        assert!(GENESIS_HASH.bytes().all(|b| b == b'0'));
    }

    #[test]
    fn test_known_digests() {
        let chain = build(&scenario(), &ChainSchema::covid()).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].previous_hash, GENESIS_HASH);
        assert_eq!(
            chain[0].current_hash,
            "6de3b39b5667e71b87e155992e06f7dc418b33aaaa018ad7660890b754bffeea"
        );
        assert_eq!(chain[1].previous_hash, chain[0].current_hash);
        assert_eq!(
            chain[1].current_hash,
            "7e7108e52e5d3b3d92d83d5999662477c6bc5f7a82e6cec7dccf97527b7eb8d4"
        );
    }

    #[test]
    fn test_compute_hash_matches_manual_concat() {
        let joined = format!("X-1-2-0{}", GENESIS_HASH);
        let expected = hex::encode(Sha256::digest(joined.as_bytes()));
        assert_eq!(compute_hash("X-1-2-0", GENESIS_HASH), expected);
    }

    #[test]
    fn test_empty_input() {
        assert!(build(&[], &ChainSchema::covid()).unwrap().is_empty());
    }

    #[test]
    fn test_block_keeps_whole_record() {
        let record = scenario()[0].clone().with("source", "feed-a");
        let chain = build(&[record.clone()], &ChainSchema::covid()).unwrap();
        assert_eq!(chain[0].fields, record);
        assert!(is_hash_hex(&chain[0].current_hash));
    }

    #[test]
    fn test_missing_field_aborts_build() {
        let mut records = scenario();
        records[1].remove("deaths");
        let err = build(&records, &ChainSchema::covid()).unwrap_err();
        assert!(matches!(err, ChainError::MissingField { row: 1, .. }));
    }

    #[test]
    fn test_build_from_extends_existing_chain() {
        let records = scenario();
        let schema = ChainSchema::covid();
        let whole = build(&records, &schema).unwrap();

        let head = build(&records[..1], &schema).unwrap();
        let tail = build_from(&records[1..], &schema, &head[0].current_hash).unwrap();
        assert_eq!(tail[0], whole[1]);
    }

    #[test]
    fn test_is_hash_hex() {
        assert!(is_hash_hex(GENESIS_HASH));
        assert!(!is_hash_hex(&GENESIS_HASH.to_uppercase().replace('0', "A")));
        assert!(!is_hash_hex("abc"));
    }
}
