// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # txwire
//!
//! Entry point for the `txwire` binary. Parses CLI arguments, initializes
//! logging, loads the network configuration, and runs one subcommand:
//!
//! - `encode`   JSON transaction to wire hex
//! - `decode`   wire hex to JSON transaction
//! - `keygen`   new keypair and address
//! - `sign`     sign a JSON transaction
//! - `verify`   decode and verify a signed transaction
//! - `types`    list registered transaction types
//! - `version`  print build version information
//!
//! Every command's result goes to stdout; logs and errors go to stderr.

mod cli;
mod logging;

use std::io::Read;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use txwire::config::{NetworkConfig, SATOSHI_PER_COIN, TRANSACTION_VERSION};
use txwire::crypto::keys::{Keypair, PublicKey};
use txwire::identity::Address;
use txwire::transaction::signing::{second_sign_transaction_with, sign_transaction_with};
use txwire::transaction::verification::{verify_second_signature_with, verify_transaction_with};
use txwire::transaction::{Transaction, TransactionId, TransactionRegistry};

use cli::{Commands, DecodeArgs, EncodeArgs, KeygenArgs, SignArgs, TxwireCli, VerifyArgs};
use logging::LogFormat;

fn main() -> Result<()> {
    let cli = TxwireCli::parse();
    logging::init_logging(&cli.log_level, LogFormat::from_str_lossy(&cli.log_format));

    let output = run(&cli)?;
    println!("{}", output);
    Ok(())
}

/// Runs the selected subcommand and returns what it would print.
fn run(cli: &TxwireCli) -> Result<String> {
    let network = load_network(cli)?;
    let registry = TransactionRegistry::for_network(&network);
    tracing::debug!(network = %network.name, "network configuration loaded");

    match &cli.command {
        Commands::Encode(args) => encode(&registry, args),
        Commands::Decode(args) => decode(&registry, args),
        Commands::Keygen(args) => keygen(&network, args),
        Commands::Sign(args) => sign(&registry, args),
        Commands::Verify(args) => verify(&registry, &network, args),
        Commands::Types => Ok(list_types(&registry)),
        Commands::Version => Ok(version()),
    }
}

fn load_network(cli: &TxwireCli) -> Result<NetworkConfig> {
    match &cli.config {
        Some(path) => NetworkConfig::from_file(path)
            .with_context(|| format!("failed to load network config {}", path.display())),
        None => NetworkConfig::from_name(&cli.network)
            .with_context(|| format!("failed to select network '{}'", cli.network)),
    }
}

// ---------------------------------------------------------------------------
// Input helpers
// ---------------------------------------------------------------------------

/// Returns the argument itself, or all of stdin for `-`.
fn read_input(arg: &str) -> Result<String> {
    if arg != "-" {
        return Ok(arg.to_string());
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read stdin")?;
    Ok(buf)
}

fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let s = input.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s).context("input is not valid hex")
}

fn parse_transaction_json(input: &str) -> Result<Transaction> {
    serde_json::from_str(input.trim()).context("input is not a valid transaction JSON document")
}

fn format_coins(amount: u64) -> String {
    format!("{}.{:08}", amount / SATOSHI_PER_COIN, amount % SATOSHI_PER_COIN)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn encode(registry: &TransactionRegistry, args: &EncodeArgs) -> Result<String> {
    let tx = parse_transaction_json(&read_input(&args.json)?)?;
    let bytes = registry.encode(&tx).context("failed to encode transaction")?;
    tracing::info!(
        internal_type = %tx.internal_type(),
        len = bytes.len(),
        "transaction encoded"
    );
    Ok(hex::encode(bytes))
}

#[derive(Serialize)]
struct DecodeOutput<'a> {
    id: TransactionId,
    #[serde(rename = "type")]
    type_name: &'a str,
    size: usize,
    transaction: &'a Transaction,
}

fn decode(registry: &TransactionRegistry, args: &DecodeArgs) -> Result<String> {
    let bytes = parse_hex(&read_input(&args.hex)?)?;
    let tx = registry
        .decode(&bytes)
        .context("failed to decode transaction")?;
    let codec = registry.codec_for(tx.internal_type())?;

    let output = DecodeOutput {
        id: TransactionId::of_serialized(&bytes),
        type_name: codec.name(),
        size: bytes.len(),
        transaction: &tx,
    };
    let json = if args.compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    Ok(json)
}

#[derive(Serialize)]
struct KeygenOutput {
    secret_key: String,
    public_key: PublicKey,
    address: String,
}

fn keygen(network: &NetworkConfig, args: &KeygenArgs) -> Result<String> {
    let keypair = match &args.passphrase {
        Some(passphrase) => Keypair::from_passphrase(passphrase),
        None => Keypair::generate(),
    };
    let public_key = keypair.public_key();
    let address = Address::from_public_key(&public_key, network.pub_key_hash)
        .to_bech32(&network.hrp)
        .context("failed to render address")?;

    tracing::info!(%address, network = %network.name, "keypair generated");
    Ok(serde_json::to_string_pretty(&KeygenOutput {
        secret_key: keypair.secret_hex(),
        public_key,
        address,
    })?)
}

fn sign(registry: &TransactionRegistry, args: &SignArgs) -> Result<String> {
    let mut tx = parse_transaction_json(&read_input(&args.json)?)?;

    let keypair = Keypair::from_hex(args.key.trim()).context("invalid secret key")?;
    sign_transaction_with(registry, &mut tx, &keypair).context("failed to sign transaction")?;

    if let Some(second_key) = &args.second_key {
        let second = Keypair::from_hex(second_key.trim()).context("invalid second secret key")?;
        second_sign_transaction_with(registry, &mut tx, &second)
            .context("failed to add second signature")?;
    }

    let bytes = registry.encode(&tx).context("failed to encode signed transaction")?;
    tracing::info!(id = %TransactionId::of_serialized(&bytes), "transaction signed");

    if args.json_output {
        Ok(serde_json::to_string_pretty(&tx)?)
    } else {
        Ok(hex::encode(bytes))
    }
}

fn verify(
    registry: &TransactionRegistry,
    network: &NetworkConfig,
    args: &VerifyArgs,
) -> Result<String> {
    let bytes = parse_hex(&read_input(&args.hex)?)?;
    let tx = registry
        .decode(&bytes)
        .context("failed to decode transaction")?;

    verify_transaction_with(registry, &tx, network).context("verification failed")?;

    if let Some(pk_hex) = &args.second_public_key {
        let second = PublicKey::from_hex(pk_hex.trim()).context("invalid second public key")?;
        verify_second_signature_with(registry, &tx, &second)
            .context("second signature verification failed")?;
    }

    Ok(format!("OK {}", TransactionId::of_serialized(&bytes)))
}

fn list_types(registry: &TransactionRegistry) -> String {
    let mut lines = vec![format!(
        "{:<8} {:<24} {:>16} {:>12}",
        "TYPE", "NAME", "STATIC FEE", "ADDON BYTES"
    )];
    for codec in registry.codecs() {
        lines.push(format!(
            "{:<8} {:<24} {:>16} {:>12}",
            codec.internal_type().to_string(),
            codec.name(),
            format_coins(codec.static_fee(None)),
            codec.addon_bytes()
        ));
    }
    lines.join("\n")
}

fn version() -> String {
    format!(
        "txwire      {}\nwire format v{}",
        env!("CARGO_PKG_VERSION"),
        TRANSACTION_VERSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use txwire::transaction::{Asset, Payment, TransactionBuilder, TransferAsset};

    fn run_args(args: &[&str]) -> Result<String> {
        let mut argv = vec!["txwire"];
        argv.extend_from_slice(args);
        run(&TxwireCli::try_parse_from(argv)?)
    }

    fn draft_json(network: &NetworkConfig) -> String {
        let tx = TransactionBuilder::new(Asset::Transfer(TransferAsset {
            amount: 12_345,
            expiration: 0,
            recipient: Address::new(network.pub_key_hash, [6u8; 20]),
        }))
        .network(network)
        .nonce(1)
        .vendor_field("cli test")
        .build()
        .unwrap();
        serde_json::to_string(&tx).unwrap()
    }

    #[test]
    fn keygen_is_deterministic_with_passphrase() {
        let a = run_args(&["keygen", "--passphrase", "demo"]).unwrap();
        let b = run_args(&["keygen", "--passphrase", "demo"]).unwrap();
        assert_eq!(a, b);
        let v: serde_json::Value = serde_json::from_str(&a).unwrap();
        assert!(v["address"].as_str().unwrap().starts_with("twd1"));
    }

    #[test]
    fn sign_then_verify_then_decode() {
        let secret = Keypair::from_passphrase("cli signer").secret_hex();
        let json = draft_json(&NetworkConfig::devnet());

        let signed_hex = run_args(&["sign", "--key", &secret, &json]).unwrap();
        let verdict = run_args(&["verify", &signed_hex]).unwrap();
        assert!(verdict.starts_with("OK "));

        let decoded = run_args(&["decode", "--compact", &signed_hex]).unwrap();
        let v: serde_json::Value = serde_json::from_str(&decoded).unwrap();
        assert_eq!(v["type"], "transfer");
        assert_eq!(v["transaction"]["vendor_field"], "cli test");
        assert_eq!(v["id"], verdict.trim_start_matches("OK "));
    }

    #[test]
    fn verify_rejects_other_network() {
        let secret = Keypair::from_passphrase("cli signer").secret_hex();
        let signed_hex =
            run_args(&["sign", "--key", &secret, &draft_json(&NetworkConfig::devnet())]).unwrap();
        assert!(run_args(&["--network", "mainnet", "verify", &signed_hex]).is_err());
    }

    #[test]
    fn encode_requires_sender_key() {
        let err = run_args(&["encode", &draft_json(&NetworkConfig::devnet())]).unwrap_err();
        assert!(format!("{:#}", err).contains("sender public key"));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(run_args(&["decode", "deadbeef"]).is_err());
        assert!(run_args(&["decode", "not hex"]).is_err());
    }

    #[test]
    fn config_file_selects_network() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "name = \"localnet\"\npub_key_hash = 42\nhrp = \"twl\"\nepoch = \"2024-01-01T00:00:00Z\""
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let out = run_args(&["--config", &path, "keygen", "--passphrase", "x"]).unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(v["address"].as_str().unwrap().starts_with("twl1"));
    }

    #[test]
    fn verify_second_signature_uses_configured_limits() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "name = \"bignet\"\npub_key_hash = 30\nhrp = \"twd\"\nepoch = \"2024-01-01T00:00:00Z\"\nmulti_payment_limit = 100"
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let network = NetworkConfig::from_file(file.path()).unwrap();
        let registry = TransactionRegistry::for_network(&network);

        let payments = (0..80u8)
            .map(|i| Payment {
                amount: 1 + i as u64,
                recipient: Address::new(network.pub_key_hash, [i; 20]),
            })
            .collect();
        let tx = TransactionBuilder::new(Asset::MultiPayment(payments))
            .network(&network)
            .nonce(1)
            .build_with(&registry)
            .unwrap();
        let json = serde_json::to_string(&tx).unwrap();

        let key = Keypair::from_passphrase("payer").secret_hex();
        let second = Keypair::from_passphrase("payer second");
        let signed_hex = run_args(&[
            "--config",
            &path,
            "sign",
            "--key",
            &key,
            "--second-key",
            &second.secret_hex(),
            &json,
        ])
        .unwrap();

        let second_pk = second.public_key().to_hex();
        let verdict = run_args(&[
            "--config",
            &path,
            "verify",
            "--second-public-key",
            &second_pk,
            &signed_hex,
        ])
        .unwrap();
        assert!(verdict.starts_with("OK "));
    }

    #[test]
    fn unknown_network_is_an_error() {
        assert!(run_args(&["--network", "moonnet", "version"]).is_err());
    }

    #[test]
    fn types_lists_core_registry() {
        let out = run_args(&["types"]).unwrap();
        assert_eq!(out.lines().count(), 1 + 11);
        assert!(out.contains("htlc_refund"));
        assert!(out.contains("25.00000000"));
    }

    #[test]
    fn coin_formatting() {
        assert_eq!(format_coins(10_000_000), "0.10000000");
        assert_eq!(format_coins(2_500_000_000), "25.00000000");
    }
}
