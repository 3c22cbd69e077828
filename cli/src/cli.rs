//! # CLI Interface
//!
//! Defines the command-line argument structure for `txwire` using `clap`
//! derive. Transactions go in and come out as hex (wire bytes) or JSON
//! (the serde form of `Transaction`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Encode, decode, sign and verify transactions.
///
/// Arguments that take a transaction accept `-` to read it from stdin.
#[derive(Parser, Debug)]
#[command(
    name = "txwire",
    about = "Transaction wire-format toolkit",
    version,
    propagate_version = true
)]
pub struct TxwireCli {
    /// Network preset: mainnet, testnet, or devnet.
    #[arg(long, short = 'n', global = true, env = "TXWIRE_NETWORK", default_value = "devnet")]
    pub network: String,

    /// Network configuration file (TOML). Takes precedence over `--network`.
    #[arg(long, short = 'c', global = true, env = "TXWIRE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Default log filter when `RUST_LOG` is not set.
    #[arg(long, global = true, env = "TXWIRE_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Log output format: pretty or json. Logs go to stderr.
    #[arg(long, global = true, env = "TXWIRE_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serialize a JSON transaction to hex.
    Encode(EncodeArgs),
    /// Parse hex into a JSON transaction.
    Decode(DecodeArgs),
    /// Generate a keypair and print its address on the selected network.
    Keygen(KeygenArgs),
    /// Sign a JSON transaction and print the signed hex.
    Sign(SignArgs),
    /// Decode and fully verify a signed transaction.
    Verify(VerifyArgs),
    /// List the registered transaction types and their fees.
    Types,
    /// Print version information and exit.
    Version,
}

#[derive(Parser, Debug)]
pub struct EncodeArgs {
    /// Transaction JSON, or `-` for stdin.
    pub json: String,
}

#[derive(Parser, Debug)]
pub struct DecodeArgs {
    /// Transaction hex, or `-` for stdin.
    pub hex: String,

    /// Print single-line JSON.
    #[arg(long)]
    pub compact: bool,
}

#[derive(Parser, Debug)]
pub struct KeygenArgs {
    /// Derive the key from a passphrase instead of the OS RNG.
    /// Only for tests and demos: passphrases are guessable.
    #[arg(long)]
    pub passphrase: Option<String>,
}

#[derive(Parser, Debug)]
pub struct SignArgs {
    /// Transaction JSON, or `-` for stdin.
    pub json: String,

    /// Hex-encoded Ed25519 secret key of the sender.
    ///
    /// **Never pass this flag on a shared machine**; prefer the env var.
    #[arg(long, short = 'k', env = "TXWIRE_SECRET_KEY")]
    pub key: String,

    /// Hex-encoded secret key for the second signature, if the sender has one.
    #[arg(long, env = "TXWIRE_SECOND_SECRET_KEY")]
    pub second_key: Option<String>,

    /// Print the signed transaction as JSON instead of hex.
    #[arg(long)]
    pub json_output: bool,
}

#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// Transaction hex, or `-` for stdin.
    pub hex: String,

    /// Also verify the second signature against this public key (hex).
    #[arg(long)]
    pub second_public_key: Option<String>,
}
