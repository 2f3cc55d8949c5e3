use async_trait::async_trait;
use bitcoin::BlockHash;
use tracing::{debug, trace};

use crate::error::CoreError;
use crate::remote::UtxoIndexer;
use crate::types::Utxo;

use super::connection::{HttpOptions, HttpTransport};
use super::parsing::{parse_best_hash, parse_unspent_page};

/// Client for the dogechain.info v1 API.
///
/// Every failure, transport or application level, is reported as
/// [`CoreError::Indexer`] so the reconciler may retry it.
pub struct DogechainClient {
    transport: HttpTransport,
}

impl DogechainClient {
    pub fn new(base_url: &str, options: &HttpOptions) -> Result<Self, CoreError> {
        Ok(Self {
            transport: HttpTransport::new(base_url, options)?,
        })
    }

    async fn get_text(&self, path: &str) -> Result<String, CoreError> {
        self.transport.wait_for_rate_limit().await;
        let url = self.transport.url(path);
        debug!(%url, "dogechain request");

        let response = self
            .transport
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| CoreError::Indexer(format!("HTTP error: {e}")))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CoreError::Indexer(format!("read response body: {e}")))?;
        debug!(%url, %status, body_len = body.len(), "dogechain response");
        trace!(%url, body = %body, "dogechain response body");

        Ok(body)
    }
}

#[async_trait]
impl UtxoIndexer for DogechainClient {
    async fn list_unspent(&self, address: &str, page: u32) -> Result<Vec<Utxo>, CoreError> {
        let body = self
            .get_text(&format!("api/v1/address/unspent/{address}/{page}"))
            .await?;
        parse_unspent_page(&body)
    }

    async fn best_block_hash(&self) -> Result<BlockHash, CoreError> {
        let body = self.get_text("api/v1/block/besthash").await?;
        parse_best_hash(&body)
    }
}
