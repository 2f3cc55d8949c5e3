use async_trait::async_trait;
use reqwest::header;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::remote::Broadcaster;

use super::connection::{HttpOptions, HttpTransport};
use super::parsing::broadcast_error_message;

#[derive(Serialize)]
struct PushRequest<'a> {
    data: &'a str,
}

/// Broadcasts through Blockchair's `push/transaction` endpoint. The
/// configured URL is the full endpoint, not a base.
pub struct BlockchairClient {
    transport: HttpTransport,
}

impl BlockchairClient {
    pub fn new(push_url: &str, options: &HttpOptions) -> Result<Self, CoreError> {
        Ok(Self {
            transport: HttpTransport::new(push_url, options)?,
        })
    }
}

#[async_trait]
impl Broadcaster for BlockchairClient {
    async fn broadcast(&self, raw_tx_hex: &str) -> Result<(), CoreError> {
        self.transport.wait_for_rate_limit().await;
        let url = self.transport.url("");
        let url = url.trim_end_matches('/');
        debug!(url, tx_len = raw_tx_hex.len(), "broadcast transaction");

        let response = self
            .transport
            .client
            .post(url)
            .header(header::ACCEPT, "application/json")
            .json(&PushRequest { data: raw_tx_hex })
            .send()
            .await
            .map_err(|e| CoreError::Broadcast(format!("HTTP error: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::OK {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let message = broadcast_error_message(status, &body);
        warn!(%status, %message, "broadcast rejected");
        Err(CoreError::Broadcast(message))
    }
}
