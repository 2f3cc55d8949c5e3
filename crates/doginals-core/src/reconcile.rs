//! UTXO reconciliation against the remote indexer.
//!
//! Pages through the address's unspent outputs, partitions them into
//! confirmed and unconfirmed, and only replaces the persisted baseline after
//! the content indexer has proven it has caught up with the same chain tip.

use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::remote::{ContentIndexClient, UtxoIndexer};
use crate::retry::{retry, RetryPolicy};
use crate::store::{KeyValueStore, WalletStore};
use crate::types::Utxo;

/// Outcome of a successful refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtxoRefresh {
    /// Confirmed outputs, newest first.
    pub confirmed: Vec<Utxo>,
    pub num_unconfirmed: usize,
    /// `false` when the confirmed set equals the persisted baseline and the
    /// staleness check and write were skipped.
    pub changed: bool,
}

/// Upper bound on listing pages per refresh. An indexer that keeps serving
/// non-empty pages past this point is treated as faulty.
pub const MAX_UNSPENT_PAGES: u32 = 1_000;

/// Fetch every page of unspent outputs for `address`, retrying each page
/// under `policy`. Stops at the first empty page.
pub async fn fetch_all_unspent(
    indexer: &dyn UtxoIndexer,
    address: &str,
    policy: RetryPolicy,
) -> Result<Vec<Utxo>, CoreError> {
    fetch_pages(indexer, address, policy, MAX_UNSPENT_PAGES).await
}

async fn fetch_pages(
    indexer: &dyn UtxoIndexer,
    address: &str,
    policy: RetryPolicy,
    max_pages: u32,
) -> Result<Vec<Utxo>, CoreError> {
    let mut utxos = Vec::new();

    for page in 1..=max_pages {
        let batch = retry(policy, CoreError::is_transient, |attempt| {
            debug!(page, attempt, "fetch unspent page");
            indexer.list_unspent(address, page)
        })
        .await?;

        if batch.is_empty() {
            debug!(page, total = utxos.len(), "unspent listing exhausted");
            return Ok(utxos);
        }
        utxos.extend(batch);
    }

    warn!(max_pages, total = utxos.len(), "unspent listing never ended");
    Err(CoreError::Indexer(format!(
        "unspent listing for {address} did not end within {max_pages} pages"
    )))
}

/// Sort ascending by confirmations (unconfirmed first, so newest first) and
/// split into `(confirmed, unconfirmed)`.
pub fn partition_by_confirmation(mut utxos: Vec<Utxo>) -> (Vec<Utxo>, Vec<Utxo>) {
    utxos.sort_by_key(Utxo::confirmation_count);
    utxos.into_iter().partition(Utxo::is_confirmed)
}

/// Reconcile the wallet's confirmed UTXO set with the remote indexer.
///
/// Fails with [`CoreError::Indexer`] once a page exhausts its retries, and
/// with [`CoreError::OutOfSync`] when the content indexer has not ingested
/// the UTXO indexer's best block. In both cases the persisted baseline is
/// left untouched.
pub async fn refresh_utxos<S: KeyValueStore>(
    indexer: &dyn UtxoIndexer,
    content: &dyn ContentIndexClient,
    store: &WalletStore<S>,
    address: &str,
    policy: RetryPolicy,
) -> Result<UtxoRefresh, CoreError> {
    let utxos = fetch_all_unspent(indexer, address, policy).await?;
    let (confirmed, unconfirmed) = partition_by_confirmation(utxos);

    for utxo in unconfirmed.iter().chain(confirmed.iter()) {
        debug!(
            outpoint = %utxo.outpoint(),
            sats = utxo.satoshis,
            confs = utxo.confirmation_count(),
            "utxo"
        );
    }

    let baseline = store.utxos()?;
    if baseline.as_deref() == Some(confirmed.as_slice()) {
        debug!(confirmed = confirmed.len(), "confirmed set unchanged");
        return Ok(UtxoRefresh {
            confirmed,
            num_unconfirmed: unconfirmed.len(),
            changed: false,
        });
    }

    let best_hash = indexer.best_block_hash().await?;
    if !content.is_block_indexed(&best_hash).await? {
        warn!(%best_hash, "content indexer is behind the UTXO indexer");
        return Err(CoreError::OutOfSync { best_hash });
    }

    store.set_utxos(&confirmed)?;
    info!(
        confirmed = confirmed.len(),
        unconfirmed = unconfirmed.len(),
        %best_hash,
        "utxo baseline updated"
    );

    Ok(UtxoRefresh {
        confirmed,
        num_unconfirmed: unconfirmed.len(),
        changed: true,
    })
}
