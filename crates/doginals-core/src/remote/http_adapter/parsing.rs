//! Response decoding for the HTTP adapters: the dogechain JSON envelopes,
//! the doginals HTML pages, and Blockchair error bodies.

use std::sync::LazyLock;

use bitcoin::{BlockHash, ScriptBuf, Txid};
use regex::Regex;

use crate::error::CoreError;
use crate::types::{InscriptionId, Utxo};

// ==============================================================================
// dogechain.info
// ==============================================================================

#[derive(serde::Deserialize)]
struct UnspentEnvelope {
    success: serde_json::Value,
    #[serde(default)]
    unspent_outputs: Vec<UnspentOutput>,
}

#[derive(serde::Deserialize)]
struct UnspentOutput {
    tx_hash: String,
    tx_output_n: u32,
    script: String,
    value: serde_json::Value,
    #[serde(default)]
    confirmations: Option<u64>,
}

#[derive(serde::Deserialize)]
struct BestHashEnvelope {
    success: serde_json::Value,
    #[serde(default)]
    hash: Option<String>,
}

/// dogechain reports `success` as either `1` or `true`.
fn is_success(flag: &serde_json::Value) -> bool {
    match flag {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_u64() == Some(1),
        _ => false,
    }
}

/// Amounts arrive either as integers or as decimal-digit strings of koinu.
fn parse_koinu(value: &serde_json::Value) -> Result<u64, CoreError> {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| CoreError::Indexer(format!("value out of range: {n}"))),
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .map_err(|e| CoreError::Indexer(format!("invalid value `{s}`: {e}"))),
        other => Err(CoreError::Indexer(format!("invalid value: {other}"))),
    }
}

pub(super) fn parse_unspent_page(body: &str) -> Result<Vec<Utxo>, CoreError> {
    let envelope: UnspentEnvelope = serde_json::from_str(body)
        .map_err(|e| CoreError::Indexer(format!("decode unspent outputs: {e}")))?;
    if !is_success(&envelope.success) {
        return Err(CoreError::Indexer("unspent output listing reported failure".to_owned()));
    }

    envelope
        .unspent_outputs
        .into_iter()
        .map(|output| {
            let txid: Txid = output
                .tx_hash
                .parse()
                .map_err(|e| CoreError::Indexer(format!("invalid tx_hash: {e}")))?;
            let script = ScriptBuf::from_hex(&output.script)
                .map_err(|e| CoreError::Indexer(format!("invalid script hex: {e}")))?;
            Ok(Utxo {
                txid,
                vout: output.tx_output_n,
                script,
                satoshis: parse_koinu(&output.value)?,
                confirmations: output.confirmations,
            })
        })
        .collect()
}

pub(super) fn parse_best_hash(body: &str) -> Result<BlockHash, CoreError> {
    let envelope: BestHashEnvelope = serde_json::from_str(body)
        .map_err(|e| CoreError::Indexer(format!("decode best block hash: {e}")))?;
    if !is_success(&envelope.success) {
        return Err(CoreError::Indexer("best block hash request reported failure".to_owned()));
    }
    envelope
        .hash
        .ok_or_else(|| CoreError::Indexer("best block response is missing `hash`".to_owned()))?
        .parse()
        .map_err(|e| CoreError::Indexer(format!("invalid best block hash: {e}")))
}

// ==============================================================================
// doginals.com
// ==============================================================================

static MAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<main\b[^>]*>(.*?)</main>").expect("static regex"));
static DL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<dl\b[^>]*>(.*?)</dl>").expect("static regex"));
static THUMBNAILS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<dd\b[^>]*\bclass\s*=\s*["']?thumbnails["']?[^>]*>(.*?)</dd>"#)
        .expect("static regex")
});
static INSCRIPTION_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)href\s*=\s*["']?[^"'\s>]*/shibescription/([^"'\s>/?#]+)"#)
        .expect("static regex")
});
static H1: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h1\b[^>]*>(.*?)</h1>").expect("static regex"));

fn main_section(html: &str) -> Result<&str, CoreError> {
    MAIN.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| CoreError::ContentIndex("page has no <main> element".to_owned()))
}

/// Inscription ids linked from the thumbnail entries of an output page.
/// Order follows the page; repeated links are collapsed.
pub(super) fn parse_output_page(html: &str) -> Result<Vec<InscriptionId>, CoreError> {
    let main = main_section(html)?;
    let list = DL
        .captures(main)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| CoreError::ContentIndex("output page has no <dl> list".to_owned()))?;

    let mut ids: Vec<InscriptionId> = Vec::new();
    for thumbnails in THUMBNAILS.captures_iter(list) {
        let Some(body) = thumbnails.get(1) else {
            continue;
        };
        for link in INSCRIPTION_HREF.captures_iter(body.as_str()) {
            let id = InscriptionId(link[1].to_owned());
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    Ok(ids)
}

/// The display number is the second word of the page heading, e.g.
/// `Shibescription 12345`.
pub(super) fn parse_inscription_number(html: &str) -> Result<String, CoreError> {
    let main = main_section(html)?;
    let heading = H1
        .captures(main)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| CoreError::ContentIndex("inscription page has no <h1>".to_owned()))?;

    heading
        .split_whitespace()
        .nth(1)
        .map(str::to_owned)
        .ok_or_else(|| {
            CoreError::ContentIndex(format!("inscription heading has no number: `{heading}`"))
        })
}

// ==============================================================================
// Blockchair
// ==============================================================================

/// Prefer the structured `context.error` message, falling back to the
/// status line.
pub(super) fn broadcast_error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.get("context")
                .and_then(|context| context.get("error"))
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned)
        })
        .unwrap_or_else(|| {
            format!(
                "{}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status")
            )
        })
}
