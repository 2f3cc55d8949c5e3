use std::path::PathBuf;

use clap::{Parser, Subcommand};
use doginals_core::config::{
    DEFAULT_BROADCAST_URL, DEFAULT_CONTENT_INDEXER_URL, DEFAULT_UTXO_INDEXER_URL,
};

/// Doginals: a command-line Dogecoin wallet for viewing and sending
/// doginal inscriptions.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Path of the JSON file holding the wallet key and caches.
    #[arg(long, default_value = "doginals-wallet.json", env = "DOGINALS_STORE")]
    pub store: PathBuf,

    /// Chain to operate on (mainnet or testnet).
    #[arg(long, default_value = "mainnet", env = "DOGINALS_CHAIN")]
    pub chain: String,

    /// Base URL of the UTXO indexer (dogechain.info API).
    #[arg(long, default_value = DEFAULT_UTXO_INDEXER_URL, env = "DOGINALS_UTXO_INDEXER_URL")]
    pub utxo_indexer_url: String,

    /// Base URL of the inscription content indexer.
    #[arg(long, default_value = DEFAULT_CONTENT_INDEXER_URL, env = "DOGINALS_CONTENT_INDEXER_URL")]
    pub content_indexer_url: String,

    /// Transaction push endpoint.
    #[arg(long, default_value = DEFAULT_BROADCAST_URL, env = "DOGINALS_BROADCAST_URL")]
    pub broadcast_url: String,

    /// Attempts per UTXO listing page before giving up.
    #[arg(long, default_value = "3", env = "DOGINALS_RETRY_ATTEMPTS")]
    pub retry_attempts: u32,

    /// Delay between listing retries, in milliseconds.
    #[arg(long, default_value = "0", env = "DOGINALS_RETRY_BACKOFF_MS")]
    pub retry_backoff_ms: u64,

    /// Fee rate in koinu per 1000 bytes.
    #[arg(long, default_value = "1000000", env = "DOGINALS_FEE_RATE")]
    pub fee_rate: u64,

    /// Amount in koinu sent along with an inscription.
    #[arg(long, default_value = "1000000", env = "DOGINALS_TRANSFER_AMOUNT")]
    pub transfer_amount: u64,

    /// Maximum outbound requests per second per service.
    #[arg(long, env = "DOGINALS_REQUESTS_PER_SECOND")]
    pub requests_per_second: Option<u32>,

    /// TCP connect timeout in seconds.
    #[arg(long, default_value = "10", env = "DOGINALS_CONNECT_TIMEOUT_SECS")]
    pub connect_timeout_secs: u64,

    /// HTTP request timeout in seconds.
    #[arg(long, default_value = "30", env = "DOGINALS_TIMEOUT_SECS")]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a new wallet key from a random 12-word mnemonic.
    Create {
        /// Replace an existing wallet key.
        #[arg(long)]
        force: bool,
    },

    /// Import a WIF private key as the wallet key.
    ImportKey {
        /// Private key in wallet import format.
        wif: String,
    },

    /// Import a BIP39 mnemonic; the key is derived at m/44'/3'/0'/0/0.
    ImportMnemonic {
        /// Mnemonic words, separated by spaces.
        #[arg(required = true, num_args = 1..)]
        words: Vec<String>,
    },

    /// Accept the terms of use (required before sending).
    AcceptTerms,

    /// Show the wallet address and stored key material.
    Show,

    /// Refresh UTXOs and inscriptions and print the wallet contents.
    Refresh,

    /// Send an inscription to another address.
    Send {
        /// Inscription id to send.
        inscription_id: String,
        /// Recipient address.
        address: String,
    },

    /// Delete the wallet key and all cached state.
    Reset {
        /// Confirm that the key and caches should be erased.
        #[arg(long)]
        yes: bool,
    },
}
