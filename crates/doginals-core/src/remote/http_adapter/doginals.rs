use async_trait::async_trait;
use bitcoin::{BlockHash, OutPoint};
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::data_uri::DataUri;
use crate::error::CoreError;
use crate::remote::{ContentIndexClient, InscriptionMetadata};
use crate::types::InscriptionId;

use super::connection::{HttpOptions, HttpTransport};
use super::parsing::{parse_inscription_number, parse_output_page};

/// MIME type assumed when the content response carries none.
const FALLBACK_MIME: &str = "application/octet-stream";

/// Client for the doginals.com explorer. Inscription listings and numbers
/// are scraped from its HTML pages.
pub struct DoginalsClient {
    transport: HttpTransport,
}

impl DoginalsClient {
    pub fn new(base_url: &str, options: &HttpOptions) -> Result<Self, CoreError> {
        Ok(Self {
            transport: HttpTransport::new(base_url, options)?,
        })
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, CoreError> {
        self.transport.wait_for_rate_limit().await;
        let url = self.transport.url(path);
        debug!(%url, "doginals request");

        let response = self
            .transport
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CoreError::ContentIndex(format!("HTTP error: {e}")))?;
        debug!(%url, status = %response.status(), "doginals response");
        Ok(response)
    }

    async fn get_page(&self, path: &str) -> Result<String, CoreError> {
        let response = self.get(path).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::ContentIndex(format!("GET {path} returned {status}")));
        }
        response
            .text()
            .await
            .map_err(|e| CoreError::ContentIndex(format!("read {path}: {e}")))
    }
}

#[async_trait]
impl ContentIndexClient for DoginalsClient {
    async fn is_block_indexed(&self, block_hash: &BlockHash) -> Result<bool, CoreError> {
        let response = self.get(&format!("block/{block_hash}")).await?;
        Ok(response.status() == reqwest::StatusCode::OK)
    }

    async fn list_inscriptions_at_output(
        &self,
        outpoint: &OutPoint,
    ) -> Result<Vec<InscriptionId>, CoreError> {
        let html = self.get_page(&format!("output/{outpoint}")).await?;
        parse_output_page(&html)
    }

    async fn fetch_inscription_content(&self, id: &InscriptionId) -> Result<DataUri, CoreError> {
        let path = format!("content/{id}");
        let response = self.get(&path).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::ContentIndex(format!("GET {path} returned {status}")));
        }

        let mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(FALLBACK_MIME)
            .to_owned();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CoreError::ContentIndex(format!("read {path}: {e}")))?;

        Ok(DataUri::new(mime, bytes.to_vec()))
    }

    async fn fetch_inscription_metadata(
        &self,
        id: &InscriptionId,
    ) -> Result<InscriptionMetadata, CoreError> {
        let html = self.get_page(&format!("shibescription/{id}")).await?;
        Ok(InscriptionMetadata {
            number: parse_inscription_number(&html)?,
        })
    }
}
