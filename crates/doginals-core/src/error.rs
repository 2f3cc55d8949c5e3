use bitcoin::{Amount, BlockHash, OutPoint};

use crate::types::InscriptionId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("UTXO indexer failure: {0}")]
    Indexer(String),

    #[error("content indexer has not ingested best block {best_hash}; try again later")]
    OutOfSync { best_hash: BlockHash },

    #[error("content indexer failure: {0}")]
    ContentIndex(String),

    #[error("inscription not found at output {0}")]
    InscriptionNotFound(OutPoint),

    #[error("output {outpoint} holds {count} inscriptions; cannot send one of them alone")]
    MultiInscriptionOutput { outpoint: OutPoint, count: usize },

    #[error("inscription output {0} is not among the confirmed UTXOs")]
    UtxoNotFound(OutPoint),

    #[error("insufficient funds: have {available}, need {required}")]
    InsufficientFunds { available: Amount, required: Amount },

    #[error("unknown inscription {0}; refresh the wallet first")]
    UnknownInscription(InscriptionId),

    #[error("no wallet key loaded; import a private key first")]
    NoCredentials,

    #[error("terms of use have not been accepted")]
    TermsNotAccepted,

    #[error("broadcast rejected: {0}")]
    Broadcast(String),

    #[error("invalid data from remote service: {0}")]
    InvalidData(String),

    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("invalid address `{address}`: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("wallet store error: {0}")]
    Store(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Whether a failed UTXO listing request may succeed on another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Indexer(_))
    }
}
