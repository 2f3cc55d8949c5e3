use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Transport settings shared by every HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpOptions {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Outbound requests per second per client; `None` disables limiting.
    pub requests_per_second: Option<u32>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            requests_per_second: None,
        }
    }
}

/// A configured `reqwest` client bound to one service base URL.
pub(super) struct HttpTransport {
    pub(super) client: reqwest::Client,
    base: String,
    limiter: Option<DirectRateLimiter>,
}

impl HttpTransport {
    pub(super) fn new(base_url: &str, options: &HttpOptions) -> Result<Self, CoreError> {
        let base = parse_base_url(base_url)?;

        let client = reqwest::Client::builder()
            .connect_timeout(options.connect_timeout)
            .timeout(options.request_timeout)
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| CoreError::Config(format!("build HTTP client: {e}")))?;

        let limiter = match options.requests_per_second {
            None => None,
            Some(limit) => {
                let limit = NonZeroU32::new(limit).ok_or_else(|| {
                    CoreError::Config("requests_per_second must be at least 1".to_owned())
                })?;
                Some(RateLimiter::direct(Quota::per_second(limit)))
            }
        };

        Ok(Self {
            client,
            base,
            limiter,
        })
    }

    /// Absolute URL for a path relative to the service base.
    pub(super) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    pub(super) async fn wait_for_rate_limit(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

/// Accept only absolute HTTP(S) URLs; the trailing slash is dropped so paths
/// can be appended uniformly.
pub(super) fn parse_base_url(url: &str) -> Result<String, CoreError> {
    let parsed = Url::parse(url).map_err(|e| {
        CoreError::Config(format!("invalid service URL `{url}`: expected HTTP(S) URL ({e})"))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(url.trim_end_matches('/').to_owned()),
        other => Err(CoreError::Config(format!(
            "unsupported URL scheme `{other}`; expected http or https"
        ))),
    }
}
