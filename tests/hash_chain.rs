//! Integration tests for hash chain construction and verification

use auditchain::blockchain::{
    build, build_from, compute_hash, is_hash_hex, verify, AuditLedger, MismatchReason, Verification,
    GENESIS_HASH,
};
use auditchain::error::ChainError;
use auditchain::record::Record;
use auditchain::schema::ChainSchema;

fn covid_row(state: &str, date: &str, new_cases: i64, deaths: i64) -> Record {
    Record::new()
        .with("state", state)
        .with("date", date)
        .with("new_cases", new_cases)
        .with("deaths", deaths)
}

/// Deterministic pseudo-random rows so property checks cover varied inputs.
fn generated_rows(n: usize, seed: u64) -> Vec<Record> {
    let states = ["SP", "RJ", "MG", "BA", "RS"];
    let mut x = seed;
    (0..n)
        .map(|i| {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            covid_row(
                states[(x >> 33) as usize % states.len()],
                &format!("2020-{:02}-{:02}", 1 + i % 12, 1 + i % 28),
                (x >> 40) as i64 % 5000,
                (x >> 50) as i64 % 300,
            )
        })
        .collect()
}

#[test]
fn test_concrete_scenario_digests() {
    let rows = vec![covid_row("X", "1", 2, 0), covid_row("Y", "2", 3, 1)];
    let chain = build(&rows, &ChainSchema::covid()).unwrap();

    assert_eq!(chain[0].previous_hash, "0".repeat(64));
    assert_eq!(chain[0].current_hash, compute_hash("X-1-2-0", &"0".repeat(64)));
    assert_eq!(
        chain[0].current_hash,
        "6de3b39b5667e71b87e155992e06f7dc418b33aaaa018ad7660890b754bffeea"
    );
    assert_eq!(chain[1].previous_hash, chain[0].current_hash);
    assert_eq!(chain[1].current_hash, compute_hash("Y-2-3-1", &chain[0].current_hash));
    assert_eq!(
        chain[1].current_hash,
        "7e7108e52e5d3b3d92d83d5999662477c6bc5f7a82e6cec7dccf97527b7eb8d4"
    );
}

#[test]
fn test_single_record_chain() {
    let chain = build(&[covid_row("AC", "2021-01-01", 10, 1)], &ChainSchema::covid()).unwrap();
    assert_eq!(chain.len(), 1);
    assert_eq!(chain[0].previous_hash, GENESIS_HASH);
    assert!(is_hash_hex(&chain[0].current_hash));
}

#[test]
fn test_properties_over_generated_inputs() {
    let schema = ChainSchema::covid();
    for (n, seed) in [(0usize, 1u64), (1, 2), (2, 3), (17, 4), (64, 5)] {
        let rows = generated_rows(n, seed);
        let first = build(&rows, &schema).unwrap();
        let second = build(&rows, &schema).unwrap();

        // length and determinism
        assert_eq!(first.len(), rows.len());
        assert_eq!(first, second);

        // order preserved
        for (block, row) in first.iter().zip(&rows) {
            assert_eq!(&block.fields, row);
            assert!(is_hash_hex(&block.current_hash));
        }

        // linkage
        if let Some(genesis) = first.first() {
            assert_eq!(genesis.previous_hash, GENESIS_HASH);
        }
        for pair in first.windows(2) {
            assert_eq!(pair[1].previous_hash, pair[0].current_hash);
        }

        assert_eq!(verify(&first, &schema), Verification::Valid { blocks: n });
    }
}

#[test]
fn test_tamper_detected_at_or_after_index() {
    let schema = ChainSchema::covid();
    let rows = generated_rows(12, 99);
    let chain = build(&rows, &schema).unwrap();

    for k in 0..chain.len() {
        for field in &schema.fields {
            let mut tampered = chain.clone();
            tampered[k].fields.set(field.clone(), "tampered");
            let outcome = verify(&tampered, &schema);
            let index = outcome.failed_at().expect("tamper must be detected");
            assert!(index >= k, "detected at {} before tampered block {}", index, k);
        }
    }
}

#[test]
fn test_overwritten_hash_reported_as_hash_mismatch() {
    let schema = ChainSchema::covid();
    let mut chain = build(&generated_rows(5, 7), &schema).unwrap();
    chain[2].current_hash = "a".repeat(64);

    match verify(&chain, &schema) {
        Verification::Mismatch { index: 2, reason: MismatchReason::HashMismatch { found, .. } } => {
            assert_eq!(found, "a".repeat(64));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[test]
fn test_missing_field_aborts_without_partial_chain() {
    let mut rows = generated_rows(4, 11);
    rows[3].remove("date");
    match build(&rows, &ChainSchema::covid()) {
        Err(ChainError::MissingField { field, row }) => {
            assert_eq!(field, "date");
            assert_eq!(row, 3);
        }
        other => panic!("expected MissingField, got {:?}", other),
    }
}

#[test]
fn test_incremental_append_equals_rebuild() {
    let schema = ChainSchema::covid();
    let rows = generated_rows(10, 21);
    let full = build(&rows, &schema).unwrap();

    let head = build(&rows[..6], &schema).unwrap();
    let tail = build_from(&rows[6..], &schema, &head[5].current_hash).unwrap();
    let stitched: Vec<_> = head.into_iter().chain(tail).collect();
    assert_eq!(stitched, full);

    let ledger = AuditLedger::from_blocks(schema.clone(), full[..6].to_vec()).unwrap();
    ledger.extend(&rows[6..9]).unwrap();
    ledger.append(rows[9].clone()).unwrap();
    assert_eq!(ledger.snapshot(), full);
    assert_eq!(ledger.tip_hash(), full[9].current_hash);
}

#[test]
fn test_transactions_schema_chain() {
    let schema = ChainSchema::transactions();
    let rows: Vec<Record> = (0..3)
        .map(|i| {
            let mut r = Record::new().with("Time", i as f64);
            for v in 1..=28 {
                r.set(format!("V{}", v), 0.5 * v as f64 - i as f64);
            }
            r.with("Amount", 149.62).with("Class", 0)
        })
        .collect();
    let chain = build(&rows, &schema).unwrap();

    let expected_content = schema.serialize(&rows[0], 0).unwrap();
    assert!(expected_content.starts_with("0.0-0.5-1.0-1.5-"));
    assert!(expected_content.ends_with("-149.62-0"));
    assert_eq!(chain[0].current_hash, compute_hash(&expected_content, GENESIS_HASH));
    assert!(verify(&chain, &schema).is_valid());
}
