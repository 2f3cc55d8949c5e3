//! Incremental inscription discovery and content caching.
//!
//! Two passes run after every UTXO refresh. [`discover`] maps each confirmed
//! output to the inscription ids it holds, consulting the persisted
//! per-output index first. [`materialize`] then turns ids into full
//! [`Inscription`] records, fetching content and display number only for
//! ids never seen before. Neither pass retries: fetch failures propagate.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::remote::ContentIndexClient;
use crate::store::{KeyValueStore, WalletStore};
use crate::types::{Discovery, Inscription, InscriptionId, Utxo};

/// Outputs with more confirmations than this are considered fully indexed:
/// their per-output mapping is persisted even when empty and never
/// re-queried.
pub const SETTLED_CONFIRMATIONS: u64 = 10;

/// Find the inscriptions held by `utxos`, in UTXO order.
///
/// Outputs already in the persisted index are not queried. Newly queried
/// outputs are persisted when they hold inscriptions or are settled; young
/// empty outputs stay unpersisted so a lagging indexer gets another chance
/// on the next refresh.
pub async fn discover<S: KeyValueStore>(
    content: &dyn ContentIndexClient,
    store: &WalletStore<S>,
    utxos: &[Utxo],
) -> Result<Discovery, CoreError> {
    let outpoints: Vec<_> = utxos.iter().map(Utxo::outpoint).collect();
    let index = store.output_index(&outpoints)?;
    let mut discovery = Discovery::default();
    let mut queried = 0usize;

    for utxo in utxos {
        let outpoint = utxo.outpoint();
        let ids = match index.get(&outpoint) {
            Some(ids) => ids.clone(),
            None => {
                queried += 1;
                let ids = content.list_inscriptions_at_output(&outpoint).await?;
                if !ids.is_empty() || utxo.confirmation_count() > SETTLED_CONFIRMATIONS {
                    store.set_output_index(&outpoint, &ids)?;
                } else {
                    debug!(
                        %outpoint,
                        confs = utxo.confirmation_count(),
                        "empty young output left unsettled"
                    );
                }
                ids
            }
        };

        for id in ids {
            discovery.push(id, outpoint);
        }
    }

    debug!(
        outputs = utxos.len(),
        queried,
        inscriptions = discovery.len(),
        "inscription discovery complete"
    );
    Ok(discovery)
}

/// Build full records for every discovered inscription.
///
/// Cached records are reused without any request; their `outpoint` is
/// updated in memory to where the id was just discovered. Uncached ids have
/// their content and metadata fetched and are persisted immediately, so a
/// failure part way through keeps everything fetched so far.
pub async fn materialize<S: KeyValueStore>(
    content: &dyn ContentIndexClient,
    store: &WalletStore<S>,
    discovery: &Discovery,
) -> Result<HashMap<InscriptionId, Inscription>, CoreError> {
    let cached = store.inscriptions(&discovery.inscription_ids)?;
    let mut inscriptions = HashMap::with_capacity(discovery.len());
    let mut fetched = 0usize;

    for (id, outpoint) in discovery.iter() {
        if inscriptions.contains_key(id) {
            warn!(%id, %outpoint, "inscription discovered at more than one output");
            continue;
        }

        let inscription = match cached.get(id) {
            Some(record) => Inscription {
                outpoint: *outpoint,
                ..record.clone()
            },
            None => {
                fetched += 1;
                let data = content.fetch_inscription_content(id).await?;
                let metadata = content.fetch_inscription_metadata(id).await?;
                let record = Inscription {
                    id: id.clone(),
                    data: data.encode(),
                    outpoint: *outpoint,
                    number: metadata.number,
                };
                store.set_inscription(&record)?;
                debug!(%id, number = %record.number, mime = %data.mime, "cached inscription");
                record
            }
        };
        inscriptions.insert(id.clone(), inscription);
    }

    info!(
        inscriptions = inscriptions.len(),
        fetched,
        "inscriptions materialized"
    );
    Ok(inscriptions)
}
