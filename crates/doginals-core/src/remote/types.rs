//! Response shapes shared by the remote capabilities.

use serde::{Deserialize, Serialize};

/// Metadata scraped from an inscription's detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InscriptionMetadata {
    /// Display number, kept as text exactly as the indexer renders it.
    pub number: String,
}
