//! Remote service abstraction layer.
//!
//! Three capabilities back the wallet: a UTXO indexer ([`UtxoIndexer`]), an
//! inscription content indexer ([`ContentIndexClient`]) and a transaction
//! broadcaster ([`Broadcaster`]). HTTP implementations for the public
//! Dogecoin services live in `http_adapter`; tests use `mock`.

mod http_adapter;
#[cfg(test)]
pub mod mock;
pub mod types;

pub use http_adapter::{BlockchairClient, DogechainClient, DoginalsClient, HttpOptions};
pub use types::InscriptionMetadata;

use async_trait::async_trait;
use bitcoin::{BlockHash, OutPoint};

use crate::data_uri::DataUri;
use crate::error::CoreError;
use crate::types::{InscriptionId, Utxo};

/// Paginated view of the unspent outputs of an address, plus the indexer's
/// idea of the chain tip.
#[async_trait]
pub trait UtxoIndexer: Send + Sync {
    /// Fetch one page (1-based) of unspent outputs. An empty page marks the
    /// end of the listing.
    async fn list_unspent(&self, address: &str, page: u32) -> Result<Vec<Utxo>, CoreError>;

    /// Hash of the best block the indexer has processed.
    async fn best_block_hash(&self) -> Result<BlockHash, CoreError>;
}

/// Inscription discovery and content retrieval.
#[async_trait]
pub trait ContentIndexClient: Send + Sync {
    /// Whether the content indexer has ingested `block_hash`.
    async fn is_block_indexed(&self, block_hash: &BlockHash) -> Result<bool, CoreError>;

    /// Inscription ids located at `outpoint`, in display order.
    async fn list_inscriptions_at_output(
        &self,
        outpoint: &OutPoint,
    ) -> Result<Vec<InscriptionId>, CoreError>;

    /// Raw content bytes and MIME type of an inscription.
    async fn fetch_inscription_content(&self, id: &InscriptionId) -> Result<DataUri, CoreError>;

    async fn fetch_inscription_metadata(
        &self,
        id: &InscriptionId,
    ) -> Result<InscriptionMetadata, CoreError>;
}

/// Submits signed transactions to the network.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Push a serialized transaction. Rejections surface as
    /// [`CoreError::Broadcast`] carrying the service's message.
    async fn broadcast(&self, raw_tx_hex: &str) -> Result<(), CoreError>;
}
