//! Domain types for the Doginals wallet model.
//!
//! Contains the unspent output record (`Utxo`), inscription identity and
//! content (`InscriptionId`, `Inscription`), and the aggregate
//! `WalletState` rebuilt on every refresh.

use std::collections::HashMap;

use bitcoin::{Amount, OutPoint, ScriptBuf, Txid};
use serde::{Deserialize, Serialize};

use crate::keys::Credentials;

// ==============================================================================
// Unspent Outputs
// ==============================================================================

/// An unspent output owned by the wallet address, as reported by the
/// UTXO indexer. Identity is the `(txid, vout)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub txid: Txid,
    pub vout: u32,
    pub script: ScriptBuf,
    /// Value in koinu (1e-8 DOGE).
    pub satoshis: u64,
    /// `None` when the indexer omits the field, which means unconfirmed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmations: Option<u64>,
}

impl Utxo {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.txid, self.vout)
    }

    pub fn value(&self) -> Amount {
        Amount::from_sat(self.satoshis)
    }

    /// Confirmation count with absent treated as zero.
    pub fn confirmation_count(&self) -> u64 {
        self.confirmations.unwrap_or(0)
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmation_count() > 0
    }
}

// ==============================================================================
// Inscriptions
// ==============================================================================

/// Opaque identifier of an inscription, independent of the output that
/// currently holds it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InscriptionId(pub String);

impl InscriptionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for InscriptionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl std::fmt::Display for InscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A discovered inscription with its content captured as a data URI.
///
/// The content and display number never change for a given id, so the
/// record is fetched once and cached forever. `outpoint` is where the
/// inscription was seen on the most recent discovery pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inscription {
    pub id: InscriptionId,
    /// `data:{mime};base64,{payload}`.
    pub data: String,
    pub outpoint: OutPoint,
    /// Human-readable display number scraped from the indexer.
    pub number: String,
}

/// Result of a discovery pass: every inscription id found on the confirmed
/// outputs, paired index-for-index with the outpoint holding it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    pub inscription_ids: Vec<InscriptionId>,
    pub inscription_outpoints: Vec<OutPoint>,
}

impl Discovery {
    pub fn len(&self) -> usize {
        self.inscription_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inscription_ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&InscriptionId, &OutPoint)> {
        self.inscription_ids
            .iter()
            .zip(self.inscription_outpoints.iter())
    }

    pub(crate) fn push(&mut self, id: InscriptionId, outpoint: OutPoint) {
        self.inscription_ids.push(id);
        self.inscription_outpoints.push(outpoint);
    }
}

// ==============================================================================
// Wallet State
// ==============================================================================

/// Everything a wallet view needs, owned by the caller and passed into each
/// operation. Refresh returns a new value instead of mutating shared state.
#[derive(Debug, Clone, Default)]
pub struct WalletState {
    pub credentials: Option<Credentials>,
    /// Confirmed outputs only, newest first (ascending confirmations).
    pub utxos: Vec<Utxo>,
    pub num_unconfirmed: usize,
    pub inscriptions: HashMap<InscriptionId, Inscription>,
}

impl WalletState {
    /// Sum of all confirmed outputs, inscription carriers included.
    pub fn balance(&self) -> Amount {
        self.utxos.iter().map(Utxo::value).sum()
    }

    /// Number of cached inscriptions currently located at `outpoint`.
    pub fn inscriptions_at(&self, outpoint: &OutPoint) -> usize {
        self.inscriptions
            .values()
            .filter(|inscription| inscription.outpoint == *outpoint)
            .count()
    }

    pub fn hosts_inscription(&self, outpoint: &OutPoint) -> bool {
        self.inscriptions
            .values()
            .any(|inscription| inscription.outpoint == *outpoint)
    }

    pub fn find_utxo(&self, outpoint: &OutPoint) -> Option<&Utxo> {
        self.utxos.iter().find(|utxo| utxo.outpoint() == *outpoint)
    }
}
