//! Inscription transfer construction.
//!
//! A transfer spends the inscription's output first, followed by every
//! confirmed output that carries no cached inscription (the funding set),
//! pays a fixed amount to the recipient and returns the rest as change.
//! Outputs holding other inscriptions are never used for funding, so they
//! cannot be swept along by accident.

use bitcoin::hashes::Hash;
use bitcoin::script::{Builder, PushBytesBuf};
use bitcoin::secp256k1::{Message, Secp256k1};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::transaction::Version;
use bitcoin::{
    absolute, ecdsa, Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid,
    Witness,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chain::Chain;
use crate::error::CoreError;
use crate::keys::{address_to_script, Credentials};
use crate::remote::Broadcaster;
use crate::types::{Inscription, Utxo, WalletState};

/// Dogecoin's practical dust limit, also the amount sent with an
/// inscription.
pub const DUST_AMOUNT: Amount = Amount::from_sat(1_000_000);

const TX_OVERHEAD_BYTES: u64 = 10;
const P2PKH_INPUT_BYTES: u64 = 148;
const P2PKH_OUTPUT_BYTES: u64 = 34;

// ==============================================================================
// Parameters
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferParams {
    pub chain: Chain,
    /// Value of the output carrying the inscription to the recipient.
    pub amount: Amount,
    /// Change below this is folded into the fee.
    pub dust_limit: Amount,
    /// Fee per 1000 bytes of estimated transaction size.
    pub fee_rate_per_kb: Amount,
}

impl Default for TransferParams {
    fn default() -> Self {
        Self {
            chain: Chain::Mainnet,
            amount: DUST_AMOUNT,
            dust_limit: DUST_AMOUNT,
            fee_rate_per_kb: Amount::from_sat(1_000_000),
        }
    }
}

impl TransferParams {
    fn fee_for(&self, inputs: usize, outputs: usize) -> Amount {
        let size = TX_OVERHEAD_BYTES
            + P2PKH_INPUT_BYTES * inputs as u64
            + P2PKH_OUTPUT_BYTES * outputs as u64;
        Amount::from_sat((size * self.fee_rate_per_kb.to_sat()).div_ceil(1000))
    }
}

// ==============================================================================
// Input Selection
// ==============================================================================

/// Confirmed outputs that carry no cached inscription.
pub fn funding_set(state: &WalletState) -> Vec<&Utxo> {
    state
        .utxos
        .iter()
        .filter(|utxo| !state.hosts_inscription(&utxo.outpoint()))
        .collect()
}

/// Resolve the output holding `inscription` and the funding set.
///
/// The inscription must be the only cached inscription at its outpoint, and
/// that outpoint must be a current confirmed UTXO.
pub fn select_inputs<'a>(
    state: &'a WalletState,
    inscription: &Inscription,
) -> Result<(&'a Utxo, Vec<&'a Utxo>), CoreError> {
    let outpoint = inscription.outpoint;
    match state.inscriptions_at(&outpoint) {
        0 => return Err(CoreError::InscriptionNotFound(outpoint)),
        1 => {}
        count => return Err(CoreError::MultiInscriptionOutput { outpoint, count }),
    }

    let inscription_utxo = state
        .find_utxo(&outpoint)
        .ok_or(CoreError::UtxoNotFound(outpoint))?;

    Ok((inscription_utxo, funding_set(state)))
}

// ==============================================================================
// Construction and Signing
// ==============================================================================

/// A signed transfer ready for broadcast.
#[derive(Debug, Clone)]
pub struct SignedTransfer {
    pub tx: Transaction,
    pub txid: Txid,
    /// Spent outpoints, inscription output first.
    pub inputs: Vec<OutPoint>,
    pub input_total: Amount,
    pub fee: Amount,
    pub change: Option<Amount>,
}

impl SignedTransfer {
    pub fn raw_hex(&self) -> String {
        bitcoin::consensus::encode::serialize_hex(&self.tx)
    }
}

/// Build and sign the transfer of `inscription` to `destination` without
/// touching the network.
pub fn build_transfer(
    state: &WalletState,
    credentials: &Credentials,
    inscription: &Inscription,
    destination: &str,
    params: &TransferParams,
) -> Result<SignedTransfer, CoreError> {
    let destination_script = address_to_script(destination, params.chain)?;
    let (inscription_utxo, funding) = select_inputs(state, inscription)?;

    let mut spent: Vec<&Utxo> = Vec::with_capacity(funding.len() + 1);
    spent.push(inscription_utxo);
    spent.extend(funding);

    let own_script = credentials.script_pubkey();
    if let Some(foreign) = spent.iter().find(|utxo| utxo.script != own_script) {
        return Err(CoreError::InvalidData(format!(
            "output {} is not locked to the wallet key",
            foreign.outpoint()
        )));
    }

    let input_total: Amount = spent.iter().map(|utxo| utxo.value()).sum();
    let (fee, change) = plan_fee_and_change(input_total, spent.len(), params)?;

    let mut output = vec![TxOut {
        value: params.amount,
        script_pubkey: destination_script,
    }];
    if let Some(change) = change {
        output.push(TxOut {
            value: change,
            script_pubkey: own_script,
        });
    }

    let mut tx = Transaction {
        version: Version::ONE,
        lock_time: absolute::LockTime::ZERO,
        input: spent
            .iter()
            .map(|utxo| TxIn {
                previous_output: utxo.outpoint(),
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            })
            .collect(),
        output,
    };
    sign_p2pkh_inputs(&mut tx, &spent, credentials)?;

    let output_total: Amount = tx.output.iter().map(|out| out.value).sum();
    if input_total < output_total {
        return Err(CoreError::InsufficientFunds {
            available: input_total,
            required: output_total,
        });
    }

    let txid = tx.compute_txid();
    debug!(
        %txid,
        inputs = tx.input.len(),
        outputs = tx.output.len(),
        %input_total,
        %fee,
        "built inscription transfer"
    );

    Ok(SignedTransfer {
        inputs: spent.iter().map(|utxo| utxo.outpoint()).collect(),
        tx,
        txid,
        input_total,
        fee,
        change,
    })
}

/// Fee and optional change for `inputs` inputs. Change below the dust limit
/// is dropped and becomes part of the fee.
fn plan_fee_and_change(
    input_total: Amount,
    inputs: usize,
    params: &TransferParams,
) -> Result<(Amount, Option<Amount>), CoreError> {
    let with_change = params.fee_for(inputs, 2);
    if let Some(change) = input_total
        .checked_sub(params.amount)
        .and_then(|rest| rest.checked_sub(with_change))
    {
        if change >= params.dust_limit {
            return Ok((with_change, Some(change)));
        }
    }

    let without_change = params.fee_for(inputs, 1);
    let required = params.amount + without_change;
    match input_total.checked_sub(params.amount) {
        Some(fee) if input_total >= required => Ok((fee, None)),
        _ => Err(CoreError::InsufficientFunds {
            available: input_total,
            required,
        }),
    }
}

/// Sign every input as a P2PKH spend with `SIGHASH_ALL`.
fn sign_p2pkh_inputs(
    tx: &mut Transaction,
    spent: &[&Utxo],
    credentials: &Credentials,
) -> Result<(), CoreError> {
    let secp = Secp256k1::new();
    let public_key = credentials.public_key();
    let sighash_type = EcdsaSighashType::All;

    let mut script_sigs = Vec::with_capacity(spent.len());
    {
        let cache = SighashCache::new(&*tx);
        for (index, utxo) in spent.iter().enumerate() {
            let sighash = cache
                .legacy_signature_hash(index, &utxo.script, sighash_type.to_u32())
                .map_err(|e| CoreError::InvalidData(format!("sighash for input {index}: {e}")))?;
            let message = Message::from_digest(sighash.to_byte_array());
            let signature = ecdsa::Signature {
                signature: secp.sign_ecdsa(&message, &credentials.private_key.inner),
                sighash_type,
            };
            let push = PushBytesBuf::try_from(signature.to_vec())
                .map_err(|e| CoreError::InvalidData(format!("signature push: {e}")))?;
            script_sigs.push(
                Builder::new()
                    .push_slice(push)
                    .push_key(&public_key)
                    .into_script(),
            );
        }
    }

    for (input, script_sig) in tx.input.iter_mut().zip(script_sigs) {
        input.script_sig = script_sig;
    }
    Ok(())
}

// ==============================================================================
// Send
// ==============================================================================

/// Build, sign and broadcast the transfer of `inscription`. Nothing is
/// broadcast when any precondition fails.
pub async fn send_inscription(
    state: &WalletState,
    credentials: &Credentials,
    inscription: &Inscription,
    destination: &str,
    broadcaster: &dyn Broadcaster,
    params: &TransferParams,
) -> Result<Txid, CoreError> {
    let transfer = build_transfer(state, credentials, inscription, destination, params)?;
    debug!(inputs = ?transfer.inputs, "funding inputs");

    broadcaster.broadcast(&transfer.raw_hex()).await?;
    info!(
        txid = %transfer.txid,
        inscription = %inscription.id,
        destination,
        fee = %transfer.fee,
        "inscription sent"
    );
    Ok(transfer.txid)
}
