//! HTTP clients for the public Dogecoin services.
//!
//! `dogechain.info` serves the UTXO listing and best block hash,
//! `doginals.com` serves inscription pages and content, and Blockchair
//! relays signed transactions. All three share one [`HttpTransport`]
//! configuration with timeouts and optional rate limiting.

mod blockchair;
mod connection;
mod dogechain;
mod doginals;
mod parsing;

pub use blockchair::BlockchairClient;
pub use connection::HttpOptions;
pub use dogechain::DogechainClient;
pub use doginals::DoginalsClient;
