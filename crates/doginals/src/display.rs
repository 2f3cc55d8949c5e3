use std::cmp::Ordering;

use bitcoin::Amount;

use doginals_core::data_uri::DataUri;
use doginals_core::keys::Credentials;
use doginals_core::{Inscription, WalletState};

/// Longest text preview printed for text inscriptions.
const PREVIEW_CHARS: usize = 60;

pub(crate) fn print_credentials(credentials: &Credentials) {
    println!("Address:     {}", credentials.address());
    println!("Private key: {}", credentials.to_wif());
    if let Some(mnemonic) = &credentials.mnemonic {
        println!("Mnemonic:    {mnemonic}");
    }
    if let Some(derivation) = &credentials.derivation {
        println!("Derivation:  {derivation}");
    }
}

pub(crate) fn print_wallet(state: &WalletState, balance: Amount) {
    if let Some(credentials) = &state.credentials {
        println!("Address: {}", credentials.address());
    }
    println!("Balance: {} DOGE", balance.to_btc());

    if state.num_unconfirmed > 0 {
        let count = state.num_unconfirmed;
        let suffix = if count > 1 { "s" } else { "" };
        println!("{count} unconfirmed transaction{suffix}...");
    }

    if state.inscriptions.is_empty() {
        println!("No doginals.");
        return;
    }

    let mut inscriptions: Vec<&Inscription> = state.inscriptions.values().collect();
    inscriptions.sort_by(|a, b| by_number(a, b));

    println!();
    for inscription in inscriptions {
        println!(
            "#{:<10} {}  at {}  {}",
            inscription.number,
            inscription.id,
            inscription.outpoint,
            describe(&inscription.data)
        );
    }
}

/// Numeric inscription order; numbers that do not parse sort last, by text.
fn by_number(a: &Inscription, b: &Inscription) -> Ordering {
    let parsed = |inscription: &Inscription| inscription.number.trim().parse::<i64>().ok();
    let by_value = match (parsed(a), parsed(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.number.cmp(&b.number),
    };
    by_value.then_with(|| a.id.cmp(&b.id))
}

fn describe(data: &str) -> String {
    let Ok(uri) = DataUri::parse(data) else {
        return "[unreadable content]".to_owned();
    };
    if uri.is_image() {
        return format!("[image {}] {} bytes", uri.essence(), uri.bytes.len());
    }
    match uri.text() {
        Some(text) => {
            let preview: String = text.chars().take(PREVIEW_CHARS).collect();
            format!("[{}] {}", uri.essence(), preview.replace('\n', " "))
        }
        None => format!("[{}] {} bytes", uri.essence(), uri.bytes.len()),
    }
}
