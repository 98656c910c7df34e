//! Signed snapshots and archive export.
//!
//! A snapshot is an immutable commitment to a closed range of the log:
//! entry count, boundary hashes, Merkle root, and a keyed signature over
//! those fields. Snapshot verification fails closed.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

use crate::audit::chain::AuditChain;
use crate::audit::entry::ChainedLogEntry;
use crate::audit::merkle::generate_merkle_root;
use crate::error::TrustError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSnapshot {
    pub snapshot_id: String,
    pub timestamp: DateTime<Utc>,
    pub total_logs: usize,
    pub merkle_root: String,
    pub first_hash: String,
    pub last_hash: String,
    /// Keyed digest over all other snapshot fields.
    pub signature: String,
}

impl LogSnapshot {
    /// Canonical form of the signed fields, sorted key order.
    fn canonical_string(&self) -> String {
        format!(
            "first_hash:{}|last_hash:{}|merkle_root:{}|snapshot_id:{}|timestamp:{}|total_logs:{}",
            self.first_hash,
            self.last_hash,
            self.merkle_root,
            self.snapshot_id,
            self.timestamp.to_rfc3339(),
            self.total_logs,
        )
    }
}

impl AuditChain {
    /// Commit to a closed batch of entries.
    pub fn create_snapshot(&self, logs: &[ChainedLogEntry], snapshot_id: &str) -> LogSnapshot {
        let mut snapshot = LogSnapshot {
            snapshot_id: snapshot_id.to_string(),
            timestamp: Utc::now(),
            total_logs: logs.len(),
            merkle_root: generate_merkle_root(logs),
            first_hash: logs.first().map(|e| e.hash.clone()).unwrap_or_default(),
            last_hash: logs.last().map(|e| e.hash.clone()).unwrap_or_default(),
            signature: String::new(),
        };
        snapshot.signature = self.sign_hash(&snapshot.canonical_string());
        info!(
            "Created snapshot '{}' over {} entries (root {})",
            snapshot_id, snapshot.total_logs, snapshot.merkle_root
        );
        snapshot
    }

    /// Re-verify a snapshot against the batch it claims to commit to. Any
    /// mismatch in count, boundary hashes, recomputed root, or signature
    /// returns false; this never errors.
    pub fn verify_snapshot(&self, logs: &[ChainedLogEntry], snapshot: &LogSnapshot) -> bool {
        if snapshot.total_logs != logs.len() {
            return false;
        }
        let first = logs.first().map(|e| e.hash.as_str()).unwrap_or("");
        let last = logs.last().map(|e| e.hash.as_str()).unwrap_or("");
        if snapshot.first_hash != first || snapshot.last_hash != last {
            return false;
        }
        if snapshot.merkle_root != generate_merkle_root(logs) {
            return false;
        }
        self.sign_hash(&snapshot.canonical_string()) == snapshot.signature
    }
}

/// Serialization formats for log archival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// One JSON array holding every entry.
    Json,
    /// One JSON record per line, streaming-friendly.
    JsonLines,
}

/// Serialize entries for archival. No semantic transformation of the data.
pub fn export_logs_to_archive(
    logs: &[ChainedLogEntry],
    format: ArchiveFormat,
) -> Result<String, TrustError> {
    match format {
        ArchiveFormat::Json => Ok(serde_json::to_string_pretty(logs)?),
        ArchiveFormat::JsonLines => {
            let mut lines = Vec::with_capacity(logs.len());
            for entry in logs {
                lines.push(serde_json::to_string(entry)?);
            }
            let mut out = lines.join("\n");
            if !out.is_empty() {
                out.push('\n');
            }
            Ok(out)
        }
    }
}

/// Parse an archive produced by [`export_logs_to_archive`], detecting the
/// format from the content.
pub fn parse_archive(content: &str) -> Result<Vec<ChainedLogEntry>> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        serde_json::from_str(content).context("failed to parse JSON archive")
    } else {
        let mut entries = Vec::new();
        for (line_num, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let entry: ChainedLogEntry = serde_json::from_str(line)
                .with_context(|| format!("failed to parse entry at line {}", line_num + 1))?;
            entries.push(entry);
        }
        Ok(entries)
    }
}

/// Load an archive file from disk.
pub fn load_archive_file(path: &Path) -> Result<Vec<ChainedLogEntry>> {
    if !path.exists() {
        return Err(anyhow!("archive file does not exist: {}", path.display()));
    }
    let file = File::open(path)
        .with_context(|| format!("failed to open archive: {}", path.display()))?;
    let mut content = String::new();
    for line in BufReader::new(file).lines() {
        content.push_str(&line?);
        content.push('\n');
    }
    let entries = parse_archive(&content)?;
    debug!("Loaded {} entries from {}", entries.len(), path.display());
    Ok(entries)
}
