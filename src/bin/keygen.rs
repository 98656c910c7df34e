//! Admin Key Generation Tool
//!
//! Command-line tool for generating administrator key pairs during
//! onboarding, with optional passphrase sealing and backup codes.

use anyhow::Result;
use clap::Parser;

use election_trust::keys::{
    encrypt_private_key, generate_backup_codes, generate_key_pair, hash_backup_code,
    RECOMMENDED_KEY_SIZE,
};

#[derive(Parser)]
#[command(name = "keygen")]
#[command(about = "Generate an administrator key pair for the election trust core")]
#[command(version = "0.1.0")]
struct Cli {
    /// RSA key size in bits (2048, 3072 or 4096)
    #[arg(short, long, default_value_t = RECOMMENDED_KEY_SIZE)]
    key_size: usize,

    /// Seal the private key under this passphrase instead of printing it
    #[arg(short, long)]
    passphrase: Option<String>,

    /// Number of backup recovery codes to generate
    #[arg(short, long, default_value_t = 0)]
    backup_codes: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let pair = generate_key_pair(cli.key_size)?;

    println!("Fingerprint: {}", pair.fingerprint);
    println!("\n{}", pair.public_key_pem);

    match &cli.passphrase {
        Some(passphrase) => {
            let sealed = encrypt_private_key(&pair.private_key_pem, passphrase)?;
            println!("Sealed private key (base64):\n{}", sealed);
        }
        None => {
            println!("{}", pair.private_key_pem);
        }
    }

    if cli.backup_codes > 0 {
        println!("Backup codes (store the hashes, hand out the codes once):");
        for code in generate_backup_codes(cli.backup_codes) {
            println!("  {}  {}", code, hash_backup_code(&code));
        }
    }

    Ok(())
}
