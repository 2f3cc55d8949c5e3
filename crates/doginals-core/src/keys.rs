//! Wallet credentials and Dogecoin base58 encoding.
//!
//! A wallet key comes from a bare WIF import, a BIP39 mnemonic, or a freshly
//! generated mnemonic. Mnemonic keys are derived at [`DERIVATION_PATH`]
//! (BIP44, Dogecoin coin type 3) and keep the phrase and path alongside the
//! key so both can be shown back to the user.

use std::str::FromStr;

use bip39::{Language, Mnemonic};
use bitcoin::base58;
use bitcoin::bip32::{DerivationPath, Xpriv};
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{Secp256k1, SecretKey};
use bitcoin::{NetworkKind, PrivateKey, PubkeyHash, PublicKey, ScriptBuf, ScriptHash};
use rand::Rng;

use crate::chain::Chain;
use crate::error::CoreError;

/// BIP44 path of the wallet's single receive key.
pub const DERIVATION_PATH: &str = "m/44'/3'/0'/0/0";

/// Entropy for a 12-word mnemonic.
const MNEMONIC_ENTROPY_BYTES: usize = 16;

/// The wallet's single signing key plus optional derivation metadata.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub private_key: PrivateKey,
    pub chain: Chain,
    pub mnemonic: Option<String>,
    pub derivation: Option<String>,
}

impl Credentials {
    /// Import a bare WIF private key (no mnemonic, no derivation path).
    pub fn from_wif(wif: &str, chain: Chain) -> Result<Self, CoreError> {
        Ok(Self {
            private_key: decode_wif(wif.trim(), chain)?,
            chain,
            mnemonic: None,
            derivation: None,
        })
    }

    /// Derive the wallet key from a BIP39 English mnemonic (empty
    /// passphrase).
    pub fn from_mnemonic(words: &str, chain: Chain) -> Result<Self, CoreError> {
        let mnemonic = Mnemonic::parse_in(Language::English, words.trim())
            .map_err(|e| CoreError::InvalidKey(format!("invalid mnemonic: {e}")))?;
        Self::derive(&mnemonic, chain)
    }

    /// Create a new wallet key from a random 12-word mnemonic.
    pub fn generate(chain: Chain) -> Result<Self, CoreError> {
        let mut entropy = [0u8; MNEMONIC_ENTROPY_BYTES];
        rand::thread_rng().fill(&mut entropy[..]);
        let mnemonic = Mnemonic::from_entropy(&entropy)
            .map_err(|e| CoreError::InvalidKey(format!("generate mnemonic: {e}")))?;
        Self::derive(&mnemonic, chain)
    }

    fn derive(mnemonic: &Mnemonic, chain: Chain) -> Result<Self, CoreError> {
        let secp = Secp256k1::new();
        let network = network_kind(chain);
        let path = DerivationPath::from_str(DERIVATION_PATH)
            .map_err(|e| CoreError::InvalidKey(format!("derivation path: {e}")))?;

        let seed = mnemonic.to_seed("");
        let child = Xpriv::new_master(network, &seed)
            .and_then(|master| master.derive_priv(&secp, &path))
            .map_err(|e| CoreError::InvalidKey(format!("derive key: {e}")))?;

        Ok(Self {
            private_key: PrivateKey::new(child.private_key, network),
            chain,
            mnemonic: Some(mnemonic.to_string()),
            derivation: Some(DERIVATION_PATH.to_owned()),
        })
    }

    pub fn to_wif(&self) -> String {
        encode_wif(&self.private_key, self.chain)
    }

    pub fn public_key(&self) -> PublicKey {
        let secp = Secp256k1::new();
        self.private_key.public_key(&secp)
    }

    /// The P2PKH address used both for receiving and for change.
    pub fn address(&self) -> String {
        let hash = self.public_key().pubkey_hash();
        encode_with_prefix(self.chain.p2pkh_prefix(), &hash.to_byte_array())
    }

    pub fn script_pubkey(&self) -> ScriptBuf {
        ScriptBuf::new_p2pkh(&self.public_key().pubkey_hash())
    }
}

// ==============================================================================
// WIF
// ==============================================================================

fn decode_wif(wif: &str, chain: Chain) -> Result<PrivateKey, CoreError> {
    let data = base58::decode_check(wif).map_err(|e| CoreError::InvalidKey(e.to_string()))?;

    let compressed = match data.len() {
        33 => false,
        34 if data[33] == 0x01 => true,
        34 => return Err(CoreError::InvalidKey("invalid compression flag in WIF".to_owned())),
        n => return Err(CoreError::InvalidKey(format!("invalid WIF length {n}"))),
    };

    if data[0] != chain.wif_prefix() {
        return Err(CoreError::InvalidKey(format!(
            "WIF version byte {:#04x} does not belong to {chain}",
            data[0]
        )));
    }

    let inner =
        SecretKey::from_slice(&data[1..33]).map_err(|e| CoreError::InvalidKey(e.to_string()))?;

    Ok(PrivateKey {
        compressed,
        network: network_kind(chain),
        inner,
    })
}

fn network_kind(chain: Chain) -> NetworkKind {
    match chain {
        Chain::Mainnet => NetworkKind::Main,
        Chain::Testnet => NetworkKind::Test,
    }
}

fn encode_wif(key: &PrivateKey, chain: Chain) -> String {
    let mut data = Vec::with_capacity(34);
    data.push(chain.wif_prefix());
    data.extend_from_slice(&key.inner.secret_bytes());
    if key.compressed {
        data.push(0x01);
    }
    base58::encode_check(&data)
}

// ==============================================================================
// Addresses
// ==============================================================================

fn encode_with_prefix(prefix: u8, payload: &[u8; 20]) -> String {
    let mut data = Vec::with_capacity(21);
    data.push(prefix);
    data.extend_from_slice(payload);
    base58::encode_check(&data)
}

/// Decode a base58 Dogecoin address into the script that pays it.
pub fn address_to_script(address: &str, chain: Chain) -> Result<ScriptBuf, CoreError> {
    let invalid = |reason: String| CoreError::InvalidAddress {
        address: address.to_owned(),
        reason,
    };

    let data = base58::decode_check(address.trim()).map_err(|e| invalid(e.to_string()))?;
    if data.len() != 21 {
        return Err(invalid(format!("expected 21 bytes, got {}", data.len())));
    }

    let mut payload = [0u8; 20];
    payload.copy_from_slice(&data[1..]);

    if data[0] == chain.p2pkh_prefix() {
        Ok(ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array(payload)))
    } else if data[0] == chain.p2sh_prefix() {
        Ok(ScriptBuf::new_p2sh(&ScriptHash::from_byte_array(payload)))
    } else {
        Err(invalid(format!("version byte {:#04x} is not a {chain} address", data[0])))
    }
}
