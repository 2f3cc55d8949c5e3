//! Shared test helpers for `doginals-core` unit tests.
//!
//! Deterministic txids, a fixed wallet key, and builders for UTXOs and
//! inscriptions so every module's tests agree on dummy data.

use std::sync::atomic::{AtomicUsize, Ordering};

use bitcoin::hashes::Hash;
use bitcoin::secp256k1::SecretKey;
use bitcoin::{NetworkKind, OutPoint, PrivateKey, Txid};

use crate::chain::Chain;
use crate::data_uri::DataUri;
use crate::error::CoreError;
use crate::keys::Credentials;
use crate::store::{KeyValueStore, MemoryStore};
use crate::types::{Inscription, InscriptionId, Utxo};

/// Address handed to mocks; they ignore it.
pub const TEST_ADDRESS: &str = "DTestWalletAddressForMocks";

// ==============================================================================
// Txid Helpers
// ==============================================================================

/// Create a deterministic `Txid` from a single distinguishing byte.
pub fn txid_from_byte(b: u8) -> Txid {
    let mut bytes = [0u8; 32];
    bytes[0] = b;
    Txid::from_byte_array(bytes)
}

// ==============================================================================
// Keys
// ==============================================================================

fn credentials_from_byte(b: u8) -> Credentials {
    let inner = SecretKey::from_slice(&[b; 32]).expect("constant secret key is valid");
    Credentials {
        private_key: PrivateKey {
            compressed: true,
            network: NetworkKind::Main,
            inner,
        },
        chain: Chain::Mainnet,
        mnemonic: None,
        derivation: None,
    }
}

/// The wallet key every test UTXO is locked to.
pub fn test_credentials() -> Credentials {
    credentials_from_byte(0x11)
}

/// A mainnet P2PKH address belonging to someone else.
pub fn destination_address() -> String {
    credentials_from_byte(0x22).address()
}

// ==============================================================================
// Domain Builders
// ==============================================================================

/// A UTXO paying the test wallet.
pub fn make_utxo(txid_byte: u8, vout: u32, sats: u64, confirmations: Option<u64>) -> Utxo {
    Utxo {
        txid: txid_from_byte(txid_byte),
        vout,
        script: test_credentials().script_pubkey(),
        satoshis: sats,
        confirmations,
    }
}

/// A text inscription located at `outpoint`.
pub fn make_inscription(id: &str, outpoint: OutPoint) -> Inscription {
    Inscription {
        id: InscriptionId::from(id),
        data: DataUri::new("text/plain;charset=utf-8", id.as_bytes().to_vec()).encode(),
        outpoint,
        number: "1".to_owned(),
    }
}

// ==============================================================================
// Stores
// ==============================================================================

/// In-memory store that counts mutating calls.
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: MemoryStore,
    writes: AtomicUsize,
}

impl CountingStore {
    /// Number of `set`, `remove` and `clear` calls so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

impl KeyValueStore for CountingStore {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, CoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: serde_json::Value) -> Result<(), CoreError> {
        self.record_write();
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        self.record_write();
        self.inner.remove(key)
    }

    fn clear(&self) -> Result<(), CoreError> {
        self.record_write();
        self.inner.clear()
    }
}
