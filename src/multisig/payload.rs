//! Structural payload validation, run by callers before `create_transaction`
//! to fail fast. Not a hard precondition inside the engine.

use std::collections::HashMap;

use crate::error::TrustError;
use crate::multisig::transaction::TransactionType;

fn require_keys(
    tx_type: TransactionType,
    payload: &HashMap<String, String>,
    keys: &[&str],
) -> Result<(), TrustError> {
    for key in keys {
        match payload.get(*key) {
            Some(value) if !value.trim().is_empty() => {}
            _ => {
                return Err(TrustError::InvalidPayload(format!(
                    "{} payload missing '{}'",
                    tx_type.as_str(),
                    key
                )))
            }
        }
    }
    Ok(())
}

fn require_rfc3339(
    tx_type: TransactionType,
    payload: &HashMap<String, String>,
    key: &str,
) -> Result<(), TrustError> {
    let value = payload.get(key).map(String::as_str).unwrap_or("");
    chrono::DateTime::parse_from_rfc3339(value).map_err(|_| {
        TrustError::InvalidPayload(format!(
            "{} payload '{}' is not an RFC 3339 timestamp",
            tx_type.as_str(),
            key
        ))
    })?;
    Ok(())
}

pub fn validate_payload(
    tx_type: TransactionType,
    payload: &HashMap<String, String>,
) -> Result<(), TrustError> {
    match tx_type {
        TransactionType::CreateElection => {
            require_keys(tx_type, payload, &["title", "startDate", "endDate"])?;
            require_rfc3339(tx_type, payload, "startDate")?;
            require_rfc3339(tx_type, payload, "endDate")?;
        }
        TransactionType::CloseElection
        | TransactionType::CancelElection
        | TransactionType::StartDecryption
        | TransactionType::PublishResults => {
            require_keys(tx_type, payload, &["electionId"])?;
        }
        TransactionType::RotateKeys => {
            require_keys(tx_type, payload, &["adminId"])?;
        }
        TransactionType::EmergencyShutdown => {
            require_keys(tx_type, payload, &["reason"])?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_create_election_payload() {
        let good = map(&[
            ("title", "Board 2026"),
            ("startDate", "2026-09-01T08:00:00Z"),
            ("endDate", "2026-09-02T20:00:00Z"),
        ]);
        assert!(validate_payload(TransactionType::CreateElection, &good).is_ok());

        let missing = map(&[("title", "Board 2026")]);
        assert!(validate_payload(TransactionType::CreateElection, &missing).is_err());

        let bad_date = map(&[
            ("title", "Board 2026"),
            ("startDate", "tomorrow"),
            ("endDate", "2026-09-02T20:00:00Z"),
        ]);
        assert!(validate_payload(TransactionType::CreateElection, &bad_date).is_err());
    }

    #[test]
    fn test_election_scoped_payloads() {
        let good = map(&[("electionId", "el-7")]);
        for t in [
            TransactionType::CloseElection,
            TransactionType::CancelElection,
            TransactionType::StartDecryption,
            TransactionType::PublishResults,
        ] {
            assert!(validate_payload(t, &good).is_ok());
            assert!(validate_payload(t, &HashMap::new()).is_err());
        }
    }

    #[test]
    fn test_emergency_shutdown_needs_reason() {
        assert!(validate_payload(
            TransactionType::EmergencyShutdown,
            &map(&[("reason", "ballot box compromise")])
        )
        .is_ok());
        assert!(validate_payload(
            TransactionType::EmergencyShutdown,
            &map(&[("reason", "  ")])
        )
        .is_err());
    }
}
