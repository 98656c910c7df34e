//! Audit Log Verification Tool
//!
//! Loads an exported audit-log archive (JSON or JSONL), verifies the hash
//! chain and entry signatures, and optionally checks a claimed Merkle root.
//! Exits non-zero if the archive fails verification.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

use election_trust::audit::{generate_merkle_root, load_archive_file, AuditChain};
use election_trust::config::TrustConfig;

#[derive(Parser)]
#[command(name = "verify-log")]
#[command(about = "Verify the integrity of an exported audit log archive")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the archive file
    #[arg(short, long)]
    archive: PathBuf,

    /// Expected Merkle root over the archived entries
    #[arg(short, long)]
    merkle_root: Option<String>,
}

fn run(cli: &Cli) -> Result<bool> {
    let config = TrustConfig::load()?;
    let chain = AuditChain::new(&config.audit_secret);

    let entries = load_archive_file(&cli.archive)?;
    let result = chain.verify_log_chain(&entries);

    println!(
        "{} entries, {} valid, {} invalid",
        result.total_logs,
        result.valid_logs,
        result.invalid_indices.len()
    );
    if !result.valid {
        println!("Invalid entries at indices: {:?}", result.invalid_indices);
        return Ok(false);
    }

    if let Some(expected_root) = &cli.merkle_root {
        let actual_root = generate_merkle_root(&entries);
        if &actual_root != expected_root {
            println!("Merkle root mismatch:\n  expected {}\n  actual   {}", expected_root, actual_root);
            return Ok(false);
        }
        println!("Merkle root matches: {}", actual_root);
    }

    println!("Audit log archive is valid");
    Ok(true)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("Verification failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
