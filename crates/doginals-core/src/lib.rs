pub mod chain;
pub mod config;
pub mod data_uri;
pub mod error;
pub mod inscriptions;
pub mod keys;
pub mod reconcile;
pub mod remote;
pub mod retry;
pub mod store;
pub mod transfer;
pub mod types;
pub mod wallet;

#[cfg(test)]
pub(crate) mod test_util;

pub use chain::Chain;
pub use config::WalletConfig;
pub use error::CoreError;
pub use types::{Inscription, InscriptionId, Utxo, WalletState};
pub use wallet::Wallet;
