//! Wallet configuration: service endpoints, chain, fees, and transport.

use bitcoin::Amount;
use serde::{Deserialize, Serialize};

use crate::chain::Chain;
use crate::remote::HttpOptions;
use crate::retry::RetryPolicy;
use crate::transfer::{TransferParams, DUST_AMOUNT};

pub const DEFAULT_UTXO_INDEXER_URL: &str = "https://dogechain.info";
pub const DEFAULT_CONTENT_INDEXER_URL: &str = "https://doginals.com";
pub const DEFAULT_BROADCAST_URL: &str = "https://api.blockchair.com/dogecoin/push/transaction";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConfig {
    pub chain: Chain,
    pub utxo_indexer_url: String,
    pub content_indexer_url: String,
    /// Full push endpoint, not a base URL.
    pub broadcast_url: String,
    /// Retry budget for each UTXO listing page.
    pub retry: RetryPolicy,
    pub http: HttpOptions,
    pub fee_rate_per_kb: Amount,
    pub transfer_amount: Amount,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            chain: Chain::Mainnet,
            utxo_indexer_url: DEFAULT_UTXO_INDEXER_URL.to_owned(),
            content_indexer_url: DEFAULT_CONTENT_INDEXER_URL.to_owned(),
            broadcast_url: DEFAULT_BROADCAST_URL.to_owned(),
            retry: RetryPolicy::default(),
            http: HttpOptions::default(),
            fee_rate_per_kb: Amount::from_sat(1_000_000),
            transfer_amount: DUST_AMOUNT,
        }
    }
}

impl WalletConfig {
    pub fn transfer_params(&self) -> TransferParams {
        TransferParams {
            chain: self.chain,
            amount: self.transfer_amount,
            dust_limit: DUST_AMOUNT,
            fee_rate_per_kb: self.fee_rate_per_kb,
        }
    }
}
