mod cli;
mod display;

use std::time::Duration;

use bitcoin::Amount;
use clap::Parser;
use eyre::{bail, eyre, WrapErr};

use doginals_core::remote::HttpOptions;
use doginals_core::retry::RetryPolicy;
use doginals_core::store::JsonFileStore;
use doginals_core::{Chain, CoreError, InscriptionId, Wallet, WalletConfig};

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let config = build_config(&args)?;
    let store = JsonFileStore::open(&args.store).wrap_err("open wallet store")?;
    tracing::debug!(path = %store.path().display(), "using wallet store");
    let wallet = Wallet::connect(config, store).wrap_err("configure remote services")?;

    match args.command {
        Command::Create { force } => {
            let existing = wallet.load().wrap_err("load wallet")?;
            if existing.credentials.is_some() && !force {
                bail!("a wallet key already exists; pass --force to replace it");
            }
            let credentials = wallet.create().wrap_err("create wallet key")?;
            println!("Created wallet {}", credentials.address());
            println!("Write down the mnemonic below; it is the only backup of this key.");
            display::print_credentials(&credentials);
        }
        Command::ImportKey { wif } => {
            let credentials = wallet
                .import_private_key(&wif)
                .wrap_err("import private key")?;
            println!("Imported key for {}", credentials.address());
        }
        Command::ImportMnemonic { words } => {
            let credentials = wallet
                .import_mnemonic(&words.join(" "))
                .wrap_err("import mnemonic")?;
            println!("Imported mnemonic for {}", credentials.address());
        }
        Command::AcceptTerms => {
            wallet.accept_terms().wrap_err("store terms acceptance")?;
            println!("Terms accepted.");
        }
        Command::Show => {
            let state = wallet.load().wrap_err("load wallet")?;
            let credentials = state
                .credentials
                .as_ref()
                .ok_or_else(|| eyre!(CoreError::NoCredentials))?;
            display::print_credentials(credentials);
            let accepted = wallet.accepted_terms().wrap_err("read terms")?;
            let terms = if accepted { "accepted" } else { "pending" };
            println!("Terms:       {terms}");
        }
        Command::Refresh => {
            let state = wallet.load().wrap_err("load wallet")?;
            let state = wallet.refresh(state).await.map_err(refresh_error)?;
            display::print_wallet(&state, wallet.balance(&state));
        }
        Command::Send {
            inscription_id,
            address,
        } => {
            let state = wallet.load().wrap_err("load wallet")?;
            let state = wallet.refresh(state).await.map_err(refresh_error)?;
            let txid = wallet
                .send_inscription(&state, &InscriptionId(inscription_id), &address)
                .await
                .wrap_err("send inscription")?;
            println!("Sent. Transaction id: {txid}");
        }
        Command::Reset { yes } => {
            if !yes {
                bail!("refusing to erase the wallet without --yes");
            }
            wallet.reset().wrap_err("reset wallet")?;
            println!("Wallet erased.");
        }
    }

    Ok(())
}

fn build_config(args: &Cli) -> eyre::Result<WalletConfig> {
    let chain: Chain = args.chain.parse().wrap_err("parse --chain")?;
    Ok(WalletConfig {
        chain,
        utxo_indexer_url: args.utxo_indexer_url.clone(),
        content_indexer_url: args.content_indexer_url.clone(),
        broadcast_url: args.broadcast_url.clone(),
        retry: RetryPolicy {
            max_attempts: args.retry_attempts,
            backoff: Duration::from_millis(args.retry_backoff_ms),
        },
        http: HttpOptions {
            connect_timeout: Duration::from_secs(args.connect_timeout_secs),
            request_timeout: Duration::from_secs(args.timeout_secs),
            requests_per_second: args.requests_per_second,
        },
        fee_rate_per_kb: Amount::from_sat(args.fee_rate),
        transfer_amount: Amount::from_sat(args.transfer_amount),
    })
}

/// Attach an actionable hint to refresh failures the user can resolve by
/// waiting.
fn refresh_error(err: CoreError) -> eyre::Report {
    let hint = match &err {
        CoreError::OutOfSync { .. } => {
            Some("the inscription indexer is catching up; retry in a few minutes")
        }
        CoreError::Indexer(_) => {
            Some("the UTXO indexer is unreachable or rate limiting; retry later")
        }
        _ => None,
    };
    let report = eyre!(err);
    match hint {
        Some(hint) => report.wrap_err(format!("refresh wallet ({hint})")),
        None => report.wrap_err("refresh wallet"),
    }
}
