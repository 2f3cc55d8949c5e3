//! Scripted in-memory implementations of the remote capabilities, with call
//! counters so tests can assert which requests were made.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bitcoin::hashes::Hash;
use bitcoin::{BlockHash, OutPoint};

use crate::data_uri::DataUri;
use crate::error::CoreError;
use crate::types::{InscriptionId, Utxo};

use super::{Broadcaster, ContentIndexClient, InscriptionMetadata, UtxoIndexer};

// ==============================================================================
// UTXO Indexer
// ==============================================================================

/// Serves `pages[n - 1]` for page `n` and an empty page afterwards.
pub struct MockUtxoIndexer {
    pages: Mutex<Vec<Vec<Utxo>>>,
    /// Remaining scripted failures per page number.
    failures: Mutex<HashMap<u32, u32>>,
    best_hash: BlockHash,
    page_requests: Mutex<Vec<u32>>,
    best_hash_calls: AtomicUsize,
}

impl MockUtxoIndexer {
    pub fn builder() -> MockUtxoIndexerBuilder {
        MockUtxoIndexerBuilder {
            pages: Vec::new(),
            failures: HashMap::new(),
            best_hash: BlockHash::all_zeros(),
        }
    }

    /// Every page number requested, in order, retries included.
    pub fn page_requests(&self) -> Vec<u32> {
        self.page_requests.lock().expect("lock").clone()
    }

    pub fn best_hash_calls(&self) -> usize {
        self.best_hash_calls.load(Ordering::SeqCst)
    }

    /// Replace the served listing, as if the remote state changed.
    pub fn set_pages(&self, pages: Vec<Vec<Utxo>>) {
        *self.pages.lock().expect("lock") = pages;
    }
}

pub struct MockUtxoIndexerBuilder {
    pages: Vec<Vec<Utxo>>,
    failures: HashMap<u32, u32>,
    best_hash: BlockHash,
}

impl MockUtxoIndexerBuilder {
    pub fn with_page(mut self, utxos: Vec<Utxo>) -> Self {
        self.pages.push(utxos);
        self
    }

    /// Make the first `times` requests for `page` fail.
    pub fn failing_page(mut self, page: u32, times: u32) -> Self {
        self.failures.insert(page, times);
        self
    }

    pub fn with_best_hash(mut self, hash: BlockHash) -> Self {
        self.best_hash = hash;
        self
    }

    pub fn build(self) -> MockUtxoIndexer {
        MockUtxoIndexer {
            pages: Mutex::new(self.pages),
            failures: Mutex::new(self.failures),
            best_hash: self.best_hash,
            page_requests: Mutex::new(Vec::new()),
            best_hash_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl UtxoIndexer for MockUtxoIndexer {
    async fn list_unspent(&self, _address: &str, page: u32) -> Result<Vec<Utxo>, CoreError> {
        let attempt = {
            let mut requests = self.page_requests.lock().expect("lock");
            requests.push(page);
            requests.iter().filter(|p| **p == page).count()
        };

        if let Some(remaining) = self.failures.lock().expect("lock").get_mut(&page) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(CoreError::Indexer(format!("page {page} attempt {attempt} failed")));
            }
        }

        let pages = self.pages.lock().expect("lock");
        Ok((page as usize)
            .checked_sub(1)
            .and_then(|index| pages.get(index))
            .cloned()
            .unwrap_or_default())
    }

    async fn best_block_hash(&self) -> Result<BlockHash, CoreError> {
        self.best_hash_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.best_hash)
    }
}

// ==============================================================================
// Content Indexer
// ==============================================================================

pub struct MockContentIndex {
    outputs: HashMap<OutPoint, Vec<InscriptionId>>,
    contents: HashMap<InscriptionId, DataUri>,
    numbers: HashMap<InscriptionId, String>,
    indexed_blocks: HashSet<BlockHash>,
    output_requests: Mutex<HashMap<OutPoint, usize>>,
    content_requests: AtomicUsize,
    metadata_requests: AtomicUsize,
    sync_checks: AtomicUsize,
}

impl MockContentIndex {
    pub fn builder() -> MockContentIndexBuilder {
        MockContentIndexBuilder {
            outputs: HashMap::new(),
            contents: HashMap::new(),
            numbers: HashMap::new(),
            indexed_blocks: HashSet::new(),
        }
    }

    pub fn output_requests(&self, outpoint: &OutPoint) -> usize {
        self.output_requests
            .lock()
            .expect("lock")
            .get(outpoint)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_output_requests(&self) -> usize {
        self.output_requests.lock().expect("lock").values().sum()
    }

    pub fn content_requests(&self) -> usize {
        self.content_requests.load(Ordering::SeqCst)
    }

    pub fn metadata_requests(&self) -> usize {
        self.metadata_requests.load(Ordering::SeqCst)
    }

    pub fn sync_checks(&self) -> usize {
        self.sync_checks.load(Ordering::SeqCst)
    }
}

pub struct MockContentIndexBuilder {
    outputs: HashMap<OutPoint, Vec<InscriptionId>>,
    contents: HashMap<InscriptionId, DataUri>,
    numbers: HashMap<InscriptionId, String>,
    indexed_blocks: HashSet<BlockHash>,
}

impl MockContentIndexBuilder {
    /// Register an inscription at `outpoint` with text content and a number.
    pub fn with_inscription(mut self, outpoint: OutPoint, id: &str, number: &str) -> Self {
        let id = InscriptionId::from(id);
        self.outputs.entry(outpoint).or_default().push(id.clone());
        let content = format!("content of {id}").into_bytes();
        let uri = DataUri::new("text/plain;charset=utf-8", content);
        self.contents.insert(id.clone(), uri);
        self.numbers.insert(id, number.to_owned());
        self
    }

    pub fn with_indexed_block(mut self, hash: BlockHash) -> Self {
        self.indexed_blocks.insert(hash);
        self
    }

    pub fn build(self) -> MockContentIndex {
        MockContentIndex {
            outputs: self.outputs,
            contents: self.contents,
            numbers: self.numbers,
            indexed_blocks: self.indexed_blocks,
            output_requests: Mutex::new(HashMap::new()),
            content_requests: AtomicUsize::new(0),
            metadata_requests: AtomicUsize::new(0),
            sync_checks: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ContentIndexClient for MockContentIndex {
    async fn is_block_indexed(&self, block_hash: &BlockHash) -> Result<bool, CoreError> {
        self.sync_checks.fetch_add(1, Ordering::SeqCst);
        Ok(self.indexed_blocks.contains(block_hash))
    }

    async fn list_inscriptions_at_output(
        &self,
        outpoint: &OutPoint,
    ) -> Result<Vec<InscriptionId>, CoreError> {
        *self
            .output_requests
            .lock()
            .expect("lock")
            .entry(*outpoint)
            .or_default() += 1;
        Ok(self.outputs.get(outpoint).cloned().unwrap_or_default())
    }

    async fn fetch_inscription_content(&self, id: &InscriptionId) -> Result<DataUri, CoreError> {
        self.content_requests.fetch_add(1, Ordering::SeqCst);
        self.contents
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::ContentIndex(format!("no content for {id}")))
    }

    async fn fetch_inscription_metadata(
        &self,
        id: &InscriptionId,
    ) -> Result<InscriptionMetadata, CoreError> {
        self.metadata_requests.fetch_add(1, Ordering::SeqCst);
        self.numbers
            .get(id)
            .map(|number| InscriptionMetadata {
                number: number.clone(),
            })
            .ok_or_else(|| CoreError::ContentIndex(format!("no page for {id}")))
    }
}

// ==============================================================================
// Broadcaster
// ==============================================================================

/// Accepts every transaction unless built with a rejection message.
#[derive(Default)]
pub struct MockBroadcaster {
    rejection: Option<String>,
    broadcasts: Mutex<Vec<String>>,
}

impl MockBroadcaster {
    pub fn accepting() -> Self {
        Self::default()
    }

    pub fn rejecting(message: &str) -> Self {
        Self {
            rejection: Some(message.to_owned()),
            broadcasts: Mutex::new(Vec::new()),
        }
    }

    pub fn broadcasts(&self) -> Vec<String> {
        self.broadcasts.lock().expect("lock").clone()
    }
}

#[async_trait]
impl Broadcaster for MockBroadcaster {
    async fn broadcast(&self, raw_tx_hex: &str) -> Result<(), CoreError> {
        self.broadcasts
            .lock()
            .expect("lock")
            .push(raw_tx_hex.to_owned());
        match &self.rejection {
            Some(message) => Err(CoreError::Broadcast(message.clone())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;

    #[tokio::test]
    async fn pages_past_the_end_are_empty() {
        let indexer = MockUtxoIndexer::builder()
            .with_page(vec![make_utxo(1, 0, 1_000, Some(1))])
            .build();
        assert_eq!(indexer.list_unspent("D", 1).await.expect("page 1").len(), 1);
        assert!(indexer.list_unspent("D", 2).await.expect("page 2").is_empty());
        assert_eq!(indexer.page_requests(), vec![1, 2]);
    }

    #[tokio::test]
    async fn scripted_failures_are_consumed() {
        let indexer = MockUtxoIndexer::builder().failing_page(1, 1).build();
        assert!(indexer.list_unspent("D", 1).await.is_err());
        assert!(indexer.list_unspent("D", 1).await.is_ok());
    }
}
