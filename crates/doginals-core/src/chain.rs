//! Dogecoin chain parameters.
//!
//! The `bitcoin` crate only knows Bitcoin's base58 prefixes, so Dogecoin's
//! address and WIF version bytes are kept here and applied by `keys`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    #[default]
    Mainnet,
    Testnet,
}

impl Chain {
    pub fn p2pkh_prefix(self) -> u8 {
        match self {
            Self::Mainnet => 0x1e,
            Self::Testnet => 0x71,
        }
    }

    pub fn p2sh_prefix(self) -> u8 {
        match self {
            Self::Mainnet => 0x16,
            Self::Testnet => 0xc4,
        }
    }

    pub fn wif_prefix(self) -> u8 {
        match self {
            Self::Mainnet => 0x9e,
            Self::Testnet => 0xf1,
        }
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mainnet => write!(f, "mainnet"),
            Self::Testnet => write!(f, "testnet"),
        }
    }
}

impl FromStr for Chain {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" | "main" => Ok(Self::Mainnet),
            "testnet" | "test" => Ok(Self::Testnet),
            other => Err(CoreError::Config(format!(
                "unrecognized chain `{other}`; expected mainnet or testnet"
            ))),
        }
    }
}
