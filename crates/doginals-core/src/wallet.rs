//! The wallet facade: one handle bundling the remote services, the
//! persisted store, and configuration.
//!
//! Callers own the [`WalletState`] and serialize operations per wallet; the
//! facade never keeps state of its own besides the store.

use std::sync::Arc;

use bitcoin::{Amount, Txid};
use tracing::info;

use crate::config::WalletConfig;
use crate::error::CoreError;
use crate::inscriptions::{discover, materialize};
use crate::keys::Credentials;
use crate::reconcile::refresh_utxos;
use crate::remote::{
    BlockchairClient, Broadcaster, ContentIndexClient, DogechainClient, DoginalsClient,
    UtxoIndexer,
};
use crate::store::{KeyValueStore, WalletStore};
use crate::transfer::send_inscription;
use crate::types::{InscriptionId, WalletState};

pub struct Wallet<S> {
    indexer: Arc<dyn UtxoIndexer>,
    content: Arc<dyn ContentIndexClient>,
    broadcaster: Arc<dyn Broadcaster>,
    store: WalletStore<S>,
    config: WalletConfig,
}

impl<S: KeyValueStore> Wallet<S> {
    pub fn new(
        indexer: Arc<dyn UtxoIndexer>,
        content: Arc<dyn ContentIndexClient>,
        broadcaster: Arc<dyn Broadcaster>,
        store: S,
        config: WalletConfig,
    ) -> Self {
        Self {
            indexer,
            content,
            broadcaster,
            store: WalletStore::new(store),
            config,
        }
    }

    /// Wire the HTTP clients for the configured public services.
    pub fn connect(config: WalletConfig, store: S) -> Result<Self, CoreError> {
        let indexer = DogechainClient::new(&config.utxo_indexer_url, &config.http)?;
        let content = DoginalsClient::new(&config.content_indexer_url, &config.http)?;
        let broadcaster = BlockchairClient::new(&config.broadcast_url, &config.http)?;
        Ok(Self::new(
            Arc::new(indexer),
            Arc::new(content),
            Arc::new(broadcaster),
            store,
            config,
        ))
    }

    pub fn store(&self) -> &WalletStore<S> {
        &self.store
    }

    // ========================================================================
    // Credentials and terms
    // ========================================================================

    /// State as persisted: credentials and the last confirmed UTXO baseline.
    /// Inscriptions are filled in by [`Wallet::refresh`].
    pub fn load(&self) -> Result<WalletState, CoreError> {
        Ok(WalletState {
            credentials: self.store.credentials(self.config.chain)?,
            utxos: self.store.utxos()?.unwrap_or_default(),
            ..WalletState::default()
        })
    }

    /// Generate a fresh mnemonic-backed key and make it the wallet key.
    pub fn create(&self) -> Result<Credentials, CoreError> {
        let credentials = Credentials::generate(self.config.chain)?;
        self.store.store_credentials(&credentials)?;
        info!(address = %credentials.address(), "created wallet key");
        Ok(credentials)
    }

    pub fn import_private_key(&self, wif: &str) -> Result<Credentials, CoreError> {
        let credentials = Credentials::from_wif(wif, self.config.chain)?;
        self.store.store_credentials(&credentials)?;
        info!(address = %credentials.address(), "imported private key");
        Ok(credentials)
    }

    pub fn import_mnemonic(&self, words: &str) -> Result<Credentials, CoreError> {
        let credentials = Credentials::from_mnemonic(words, self.config.chain)?;
        self.store.store_credentials(&credentials)?;
        info!(
            address = %credentials.address(),
            derivation = ?credentials.derivation,
            "imported mnemonic"
        );
        Ok(credentials)
    }

    pub fn accepted_terms(&self) -> Result<bool, CoreError> {
        self.store.accepted_terms()
    }

    pub fn accept_terms(&self) -> Result<(), CoreError> {
        self.store.accept_terms()
    }

    /// Wipe credentials and every cache.
    pub fn reset(&self) -> Result<(), CoreError> {
        self.store.reset()?;
        info!("wallet reset");
        Ok(())
    }

    // ========================================================================
    // Refresh and send
    // ========================================================================

    /// Reconcile UTXOs, discover inscriptions and materialize their content,
    /// returning the rebuilt state.
    pub async fn refresh(&self, state: WalletState) -> Result<WalletState, CoreError> {
        let credentials = state.credentials.ok_or(CoreError::NoCredentials)?;
        let address = credentials.address();

        let refresh = refresh_utxos(
            self.indexer.as_ref(),
            self.content.as_ref(),
            &self.store,
            &address,
            self.config.retry,
        )
        .await?;
        let discovery = discover(self.content.as_ref(), &self.store, &refresh.confirmed).await?;
        let inscriptions = materialize(self.content.as_ref(), &self.store, &discovery).await?;

        info!(
            %address,
            confirmed = refresh.confirmed.len(),
            unconfirmed = refresh.num_unconfirmed,
            inscriptions = inscriptions.len(),
            "wallet refreshed"
        );

        Ok(WalletState {
            credentials: Some(credentials),
            utxos: refresh.confirmed,
            num_unconfirmed: refresh.num_unconfirmed,
            inscriptions,
        })
    }

    /// Send the inscription `id` to `destination` and return the txid.
    ///
    /// The record is taken from `state`, falling back to the persisted
    /// cache; its outpoint must still resolve in `state`.
    pub async fn send_inscription(
        &self,
        state: &WalletState,
        id: &InscriptionId,
        destination: &str,
    ) -> Result<Txid, CoreError> {
        if !self.store.accepted_terms()? {
            return Err(CoreError::TermsNotAccepted);
        }
        let credentials = state.credentials.as_ref().ok_or(CoreError::NoCredentials)?;

        let inscription = match state.inscriptions.get(id) {
            Some(inscription) => inscription.clone(),
            None => self
                .store
                .inscription(id)?
                .ok_or_else(|| CoreError::UnknownInscription(id.clone()))?,
        };

        send_inscription(
            state,
            credentials,
            &inscription,
            destination,
            self.broadcaster.as_ref(),
            &self.config.transfer_params(),
        )
        .await
    }

    pub fn balance(&self, state: &WalletState) -> Amount {
        state.balance()
    }
}

#[cfg(test)]
mod tests {
    use bitcoin::hashes::Hash;
    use bitcoin::BlockHash;

    use super::*;
    use crate::keys::DERIVATION_PATH;
    use crate::remote::mock::{MockBroadcaster, MockContentIndex, MockUtxoIndexer};
    use crate::store::MemoryStore;
    use crate::test_util::*;

    struct Harness {
        indexer: Arc<MockUtxoIndexer>,
        content: Arc<MockContentIndex>,
        broadcaster: Arc<MockBroadcaster>,
        wallet: Wallet<MemoryStore>,
    }

    fn harness(indexer: MockUtxoIndexer, content: MockContentIndex) -> Harness {
        let indexer = Arc::new(indexer);
        let content = Arc::new(content);
        let broadcaster = Arc::new(MockBroadcaster::accepting());
        let wallet = Wallet::new(
            indexer.clone(),
            content.clone(),
            broadcaster.clone(),
            MemoryStore::new(),
            WalletConfig::default(),
        );
        wallet
            .store()
            .store_credentials(&test_credentials())
            .expect("seed credentials");
        Harness {
            indexer,
            content,
            broadcaster,
            wallet,
        }
    }

    fn tip() -> BlockHash {
        BlockHash::from_byte_array([7u8; 32])
    }

    #[tokio::test]
    async fn refresh_then_send_end_to_end() {
        let a = make_utxo(0xaa, 0, 2_000_000, Some(5));
        let b = make_utxo(0xbb, 1, 5_000_000, Some(3));
        let h = harness(
            MockUtxoIndexer::builder()
                .with_page(vec![a.clone(), b.clone()])
                .with_best_hash(tip())
                .build(),
            MockContentIndex::builder()
                .with_indexed_block(tip())
                .with_inscription(a.outpoint(), "aai0", "100")
                .build(),
        );
        h.wallet.accept_terms().expect("accept terms");

        let state = h
            .wallet
            .refresh(h.wallet.load().expect("load"))
            .await
            .expect("refresh");
        assert_eq!(state.utxos, vec![b.clone(), a.clone()]);
        assert_eq!(h.wallet.balance(&state), Amount::from_sat(7_000_000));

        let txid = h
            .wallet
            .send_inscription(&state, &InscriptionId::from("aai0"), &destination_address())
            .await
            .expect("send");

        let broadcasts = h.broadcaster.broadcasts();
        assert_eq!(broadcasts.len(), 1);
        let tx: bitcoin::Transaction = bitcoin::consensus::encode::deserialize_hex(&broadcasts[0])
            .expect("broadcast hex must decode");
        assert_eq!(tx.compute_txid(), txid);
        let spent: Vec<_> = tx.input.iter().map(|input| input.previous_output).collect();
        assert_eq!(spent, vec![a.outpoint(), b.outpoint()]);
        assert_eq!(tx.output[0].value, Amount::from_sat(1_000_000));
    }

    #[tokio::test]
    async fn repeated_refresh_hits_no_sync_or_content_endpoints() {
        let a = make_utxo(0xaa, 0, 2_000_000, Some(50));
        let h = harness(
            MockUtxoIndexer::builder()
                .with_page(vec![a.clone()])
                .with_best_hash(tip())
                .build(),
            MockContentIndex::builder()
                .with_indexed_block(tip())
                .with_inscription(a.outpoint(), "aai0", "1")
                .build(),
        );

        let first = h
            .wallet
            .refresh(h.wallet.load().expect("load"))
            .await
            .expect("first refresh");
        let second = h
            .wallet
            .refresh(h.wallet.load().expect("load"))
            .await
            .expect("second refresh");

        assert_eq!(first.utxos, second.utxos);
        assert_eq!(first.inscriptions, second.inscriptions);
        assert_eq!(h.indexer.best_hash_calls(), 1);
        assert_eq!(h.content.sync_checks(), 1);
        assert_eq!(h.content.total_output_requests(), 1);
        assert_eq!(h.content.content_requests(), 1);
    }

    #[tokio::test]
    async fn send_requires_accepted_terms() {
        let h = harness(
            MockUtxoIndexer::builder().build(),
            MockContentIndex::builder().build(),
        );
        let state = h.wallet.load().expect("load");

        let err = h
            .wallet
            .send_inscription(&state, &InscriptionId::from("aai0"), &destination_address())
            .await
            .expect_err("terms gate");
        assert!(matches!(err, CoreError::TermsNotAccepted));
    }

    #[tokio::test]
    async fn send_of_unknown_inscription_fails() {
        let h = harness(
            MockUtxoIndexer::builder().build(),
            MockContentIndex::builder().build(),
        );
        h.wallet.accept_terms().expect("accept terms");
        let state = h.wallet.load().expect("load");

        let err = h
            .wallet
            .send_inscription(
                &state,
                &InscriptionId::from("nopei0"),
                &destination_address(),
            )
            .await
            .expect_err("unknown id");
        assert!(matches!(err, CoreError::UnknownInscription(_)));
        assert!(h.broadcaster.broadcasts().is_empty());
    }

    #[tokio::test]
    async fn refresh_without_credentials_fails() {
        let h = harness(
            MockUtxoIndexer::builder().build(),
            MockContentIndex::builder().build(),
        );
        h.wallet.reset().expect("reset");

        let state = h.wallet.load().expect("load");
        assert!(state.credentials.is_none());
        let err = h.wallet.refresh(state).await.expect_err("no key");
        assert!(matches!(err, CoreError::NoCredentials));
    }

    #[test]
    fn import_private_key_persists_credentials() {
        let h = harness(
            MockUtxoIndexer::builder().build(),
            MockContentIndex::builder().build(),
        );
        h.wallet.reset().expect("reset");

        let imported = h
            .wallet
            .import_private_key(&test_credentials().to_wif())
            .expect("import");
        let loaded = h.wallet.load().expect("load");
        assert_eq!(
            loaded.credentials.expect("credentials").address(),
            imported.address()
        );
    }

    #[test]
    fn imported_mnemonic_survives_reload() {
        let h = harness(
            MockUtxoIndexer::builder().build(),
            MockContentIndex::builder().build(),
        );
        let words = "abandon abandon abandon abandon abandon abandon abandon abandon abandon \
                     abandon abandon about";

        let imported = h.wallet.import_mnemonic(words).expect("import");
        let loaded = h
            .wallet
            .load()
            .expect("load")
            .credentials
            .expect("credentials");

        assert_eq!(loaded.address(), "DBus3bamQjgJULBJtYXpEzDWQRwF5iwxgC");
        assert_eq!(loaded.address(), imported.address());
        assert_eq!(loaded.mnemonic.as_deref(), Some(words));
        assert_eq!(loaded.derivation.as_deref(), Some(DERIVATION_PATH));
    }

    #[test]
    fn create_replaces_key_and_records_mnemonic() {
        let h = harness(
            MockUtxoIndexer::builder().build(),
            MockContentIndex::builder().build(),
        );

        let created = h.wallet.create().expect("create");
        let loaded = h
            .wallet
            .load()
            .expect("load")
            .credentials
            .expect("credentials");

        assert_ne!(created.address(), test_credentials().address());
        assert_eq!(loaded.address(), created.address());
        assert!(loaded.mnemonic.is_some());
    }

    #[test]
    fn accepted_terms_reflects_acceptance() {
        let h = harness(
            MockUtxoIndexer::builder().build(),
            MockContentIndex::builder().build(),
        );
        assert!(!h.wallet.accepted_terms().expect("read terms"));
        h.wallet.accept_terms().expect("accept terms");
        assert!(h.wallet.accepted_terms().expect("read terms"));
    }
}
