//! End-to-end scenarios for the trust core: the full approval lifecycle of a
//! multi-signature transaction, with every state change recorded into the
//! tamper-evident audit chain the way an API layer is expected to.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use election_trust::audit::{
    export_logs_to_archive, generate_merkle_root, ArchiveFormat, AuditChain, AuditEvent,
    ChainedLogEntry, GENESIS_HASH,
};
use election_trust::config::{ThresholdTable, TrustConfig};
use election_trust::keys::{
    decrypt_private_key, generate_key_pair, rotate_keys, AdminKeyRegistry, GeneratedKeyPair,
};
use election_trust::multisig::{
    validate_payload, TransactionEngine, TransactionStatus, TransactionType,
};
use election_trust::TrustError;

fn setup_engine(admins: &[&str]) -> (TransactionEngine, HashMap<String, GeneratedKeyPair>) {
    let mut registry = AdminKeyRegistry::new(10);
    let mut pairs = HashMap::new();
    for admin in admins {
        let pair = generate_key_pair(2048).unwrap();
        registry.register_admin(admin, &pair.public_key_pem).unwrap();
        pairs.insert(admin.to_string(), pair);
    }
    let config = TrustConfig {
        total_admins: 10,
        thresholds: ThresholdTable::default(),
        ..TrustConfig::default()
    };
    let engine = TransactionEngine::new(config, Arc::new(RwLock::new(registry)));
    (engine, pairs)
}

fn close_election_payload() -> HashMap<String, String> {
    let mut payload = HashMap::new();
    payload.insert("electionId".to_string(), "el-2026-board".to_string());
    payload
}

/// The full §8 scenario: CloseElection at threshold 3 with four admins.
#[test]
fn test_close_election_lifecycle_with_audit_trail() {
    let (engine, pairs) = setup_engine(&["A", "B", "C", "D"]);
    let chain = AuditChain::new("integration-secret");
    let mut trail: Vec<ChainedLogEntry> = Vec::new();

    let payload = close_election_payload();
    validate_payload(TransactionType::CloseElection, &payload).unwrap();

    let tx = engine
        .create_transaction(TransactionType::CloseElection, payload, "A", None)
        .unwrap();
    assert_eq!(tx.required_signatures, 3);
    trail.push(chain.create_log_entry(
        AuditEvent::new("A", "transaction.create", &tx.id)
            .with_metadata("type", tx.tx_type.as_str()),
    ));

    for signer in ["A", "B"] {
        let updated = engine
            .sign_transaction(&tx.id, signer, &pairs[signer].private_key_pem)
            .unwrap();
        assert_eq!(updated.status, TransactionStatus::Pending);
        trail.push(chain.create_log_entry(AuditEvent::new(signer, "transaction.sign", &tx.id)));
    }

    let approved = engine
        .sign_transaction(&tx.id, "C", &pairs["C"].private_key_pem)
        .unwrap();
    assert_eq!(approved.status, TransactionStatus::Approved);
    trail.push(chain.create_log_entry(AuditEvent::new("C", "transaction.sign", &tx.id)));

    let executed = engine.execute_transaction(&tx.id, "D").unwrap();
    assert_eq!(executed.status, TransactionStatus::Executed);
    assert!(executed.executed_at.is_some());
    trail.push(chain.create_log_entry(AuditEvent::new("D", "transaction.execute", &tx.id)));

    // Every signature record carries a verified signature and the signer's
    // key snapshot, in arrival order.
    assert_eq!(
        executed
            .signatures
            .iter()
            .map(|s| s.admin_id.as_str())
            .collect::<Vec<_>>(),
        vec!["A", "B", "C"]
    );
    assert!(executed.signatures.iter().all(|s| s.verified));

    // The recorded trail is a valid chain and survives a snapshot round trip.
    let verification = chain.verify_log_chain(&trail);
    assert!(verification.valid);
    assert_eq!(verification.valid_logs, 5);

    let snapshot = chain.create_snapshot(&trail, "close-election-audit");
    assert!(chain.verify_snapshot(&trail, &snapshot));

    let mut tampered = trail.clone();
    tampered[2].event.actor = "M".to_string();
    assert!(!chain.verify_snapshot(&tampered, &snapshot));
    assert_eq!(chain.verify_log_chain(&tampered).invalid_indices, vec![2]);
}

#[test]
fn test_chain_linkage_and_reset() {
    let chain = AuditChain::new("integration-secret");
    let e1 = chain.create_log_entry(AuditEvent::new("A", "election.create", "el-1"));
    let e2 = chain.create_log_entry(AuditEvent::new("A", "election.open", "el-1"));
    assert_eq!(e2.previous_hash, e1.hash);

    chain.reset_chain();
    let e3 = chain.create_log_entry(AuditEvent::new("A", "election.create", "el-2"));
    assert_eq!(e3.previous_hash, GENESIS_HASH);
}

#[test]
fn test_archive_export_verifies_after_reload() {
    let chain = AuditChain::new("integration-secret");
    let logs: Vec<ChainedLogEntry> = (0..4)
        .map(|i| chain.create_log_entry(AuditEvent::new("A", "vote.audit", &format!("b-{}", i))))
        .collect();

    let archive = export_logs_to_archive(&logs, ArchiveFormat::JsonLines).unwrap();
    let reloaded = election_trust::audit::parse_archive(&archive).unwrap();
    assert!(chain.verify_log_chain(&reloaded).valid);
    assert_eq!(generate_merkle_root(&reloaded), generate_merkle_root(&logs));
}

#[test]
fn test_rejection_halts_approved_path() {
    let (engine, pairs) = setup_engine(&["A", "B", "C", "D"]);
    let tx = engine
        .create_transaction(
            TransactionType::CancelElection,
            close_election_payload(),
            "A",
            None,
        )
        .unwrap();
    engine
        .sign_transaction(&tx.id, "A", &pairs["A"].private_key_pem)
        .unwrap();
    engine
        .sign_transaction(&tx.id, "B", &pairs["B"].private_key_pem)
        .unwrap();

    // One objection halts the transaction despite two collected signatures.
    let rejected = engine.reject_transaction(&tx.id, "D").unwrap();
    assert_eq!(rejected.status, TransactionStatus::Rejected);

    let err = engine.execute_transaction(&tx.id, "A").unwrap_err();
    assert!(matches!(err, TrustError::InvalidState(_)));
}

#[test]
fn test_revoked_admin_cannot_act() {
    let mut registry = AdminKeyRegistry::new(10);
    let a = generate_key_pair(2048).unwrap();
    let b = generate_key_pair(2048).unwrap();
    registry.register_admin("A", &a.public_key_pem).unwrap();
    registry.register_admin("B", &b.public_key_pem).unwrap();
    registry.revoke_admin("B").unwrap();

    let engine = TransactionEngine::new(
        TrustConfig::default(),
        Arc::new(RwLock::new(registry)),
    );
    let tx = engine
        .create_transaction(
            TransactionType::CloseElection,
            close_election_payload(),
            "A",
            None,
        )
        .unwrap();

    let err = engine
        .sign_transaction(&tx.id, "B", &b.private_key_pem)
        .unwrap_err();
    assert!(err.to_string().contains("revoked"));
}

#[test]
fn test_key_rotation_archival_round_trip() {
    let pair = generate_key_pair(2048).unwrap();
    let rotated = rotate_keys(&pair.private_key_pem, "rotation-passphrase").unwrap();

    // The archived old key unseals back to the original private key.
    let unsealed = decrypt_private_key(&rotated.archived_old_key, "rotation-passphrase").unwrap();
    assert_eq!(unsealed, pair.private_key_pem);

    // The new pair registers cleanly as the replacement.
    let mut registry = AdminKeyRegistry::new(2);
    registry.register_admin("A", &pair.public_key_pem).unwrap();
    let record = registry
        .register_admin("A", &rotated.new_pair.public_key_pem)
        .unwrap();
    assert_eq!(record.fingerprint, rotated.new_pair.fingerprint);
}
