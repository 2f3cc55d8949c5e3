use std::collections::HashMap;

use bitcoin::OutPoint;
use serde::de::DeserializeOwned;

use crate::chain::Chain;
use crate::error::CoreError;
use crate::keys::Credentials;
use crate::types::{Inscription, InscriptionId, Utxo};

use super::KeyValueStore;

/// Key layout of the persisted wallet.
pub mod keys {
    use bitcoin::OutPoint;

    use crate::types::InscriptionId;

    pub const PRIVKEY: &str = "privkey";
    pub const MNEMONIC: &str = "mnemonic";
    pub const DERIVATION: &str = "derivation";
    pub const ACCEPTED_TERMS: &str = "accepted_terms";
    pub const UTXOS: &str = "utxos";

    pub fn inscriptions_at(outpoint: &OutPoint) -> String {
        format!("inscriptions_at_{outpoint}")
    }

    pub fn inscription(id: &InscriptionId) -> String {
        format!("inscription_{id}")
    }
}

/// Typed access to the wallet's persisted keys.
pub struct WalletStore<S> {
    inner: S,
}

impl<S: KeyValueStore> WalletStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn get_typed<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CoreError> {
        match self.inner.get(key)? {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| CoreError::Store(format!("corrupt value under `{key}`: {e}"))),
        }
    }

    fn set_or_remove(&self, key: &str, value: Option<&str>) -> Result<(), CoreError> {
        match value {
            Some(v) => self.inner.set(key, serde_json::json!(v)),
            None => self.inner.remove(key),
        }
    }

    // ========================================================================
    // Credentials and terms
    // ========================================================================

    pub fn credentials(&self, chain: Chain) -> Result<Option<Credentials>, CoreError> {
        let Some(wif) = self.get_typed::<String>(keys::PRIVKEY)? else {
            return Ok(None);
        };
        let mut credentials = Credentials::from_wif(&wif, chain)?;
        credentials.mnemonic = self.get_typed(keys::MNEMONIC)?;
        credentials.derivation = self.get_typed(keys::DERIVATION)?;
        Ok(Some(credentials))
    }

    pub fn store_credentials(&self, credentials: &Credentials) -> Result<(), CoreError> {
        self.inner
            .set(keys::PRIVKEY, serde_json::json!(credentials.to_wif()))?;
        self.set_or_remove(keys::MNEMONIC, credentials.mnemonic.as_deref())?;
        self.set_or_remove(keys::DERIVATION, credentials.derivation.as_deref())
    }

    pub fn accepted_terms(&self) -> Result<bool, CoreError> {
        Ok(self.get_typed::<bool>(keys::ACCEPTED_TERMS)?.unwrap_or(false))
    }

    pub fn accept_terms(&self) -> Result<(), CoreError> {
        self.inner.set(keys::ACCEPTED_TERMS, serde_json::json!(true))
    }

    // ========================================================================
    // UTXO baseline
    // ========================================================================

    /// The last confirmed set that passed the staleness check.
    pub fn utxos(&self) -> Result<Option<Vec<Utxo>>, CoreError> {
        self.get_typed(keys::UTXOS)
    }

    pub fn set_utxos(&self, utxos: &[Utxo]) -> Result<(), CoreError> {
        self.inner.set(keys::UTXOS, serde_json::to_value(utxos)?)
    }

    // ========================================================================
    // Per-output inscription index
    // ========================================================================

    pub fn output_index(
        &self,
        outpoints: &[OutPoint],
    ) -> Result<HashMap<OutPoint, Vec<InscriptionId>>, CoreError> {
        let key_list: Vec<String> = outpoints.iter().map(keys::inscriptions_at).collect();
        let found = self.inner.get_many(&key_list)?;

        let mut index = HashMap::with_capacity(found.len());
        for (outpoint, key) in outpoints.iter().zip(key_list) {
            if let Some(value) = found.get(&key) {
                let ids: Vec<InscriptionId> = serde_json::from_value(value.clone())
                    .map_err(|e| CoreError::Store(format!("corrupt value under `{key}`: {e}")))?;
                index.insert(*outpoint, ids);
            }
        }
        Ok(index)
    }

    pub fn set_output_index(
        &self,
        outpoint: &OutPoint,
        ids: &[InscriptionId],
    ) -> Result<(), CoreError> {
        self.inner
            .set(&keys::inscriptions_at(outpoint), serde_json::to_value(ids)?)
    }

    // ========================================================================
    // Per-inscription content
    // ========================================================================

    pub fn inscription(&self, id: &InscriptionId) -> Result<Option<Inscription>, CoreError> {
        self.get_typed(&keys::inscription(id))
    }

    pub fn inscriptions(
        &self,
        ids: &[InscriptionId],
    ) -> Result<HashMap<InscriptionId, Inscription>, CoreError> {
        let key_list: Vec<String> = ids.iter().map(keys::inscription).collect();
        let found = self.inner.get_many(&key_list)?;

        let mut records = HashMap::with_capacity(found.len());
        for (id, key) in ids.iter().zip(key_list) {
            if let Some(value) = found.get(&key) {
                let record: Inscription = serde_json::from_value(value.clone())
                    .map_err(|e| CoreError::Store(format!("corrupt value under `{key}`: {e}")))?;
                records.insert(id.clone(), record);
            }
        }
        Ok(records)
    }

    pub fn set_inscription(&self, inscription: &Inscription) -> Result<(), CoreError> {
        self.inner.set(
            &keys::inscription(&inscription.id),
            serde_json::to_value(inscription)?,
        )
    }

    /// Forget everything: credentials, terms, and all caches.
    pub fn reset(&self) -> Result<(), CoreError> {
        self.inner.clear()
    }
}
