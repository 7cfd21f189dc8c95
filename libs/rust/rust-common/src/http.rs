//! Outbound HTTP client configuration.
//!
//! Services that call out to managed endpoints build their `reqwest` client
//! here so pooling, timeouts and TLS stay consistent.

use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder};

use crate::error::PlatformError;

/// Outbound HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Whole-request timeout (default: 29s, the private API integration ceiling)
    pub timeout: Duration,
    /// Connection establishment timeout (default: 5s)
    pub connect_timeout: Duration,
    /// Pool idle timeout (default: 90s)
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections per host (default: 32)
    pub pool_max_idle_per_host: usize,
    /// User agent sent when the caller supplied none
    pub user_agent: String,
    /// Whether redirects are followed (default: false)
    pub follow_redirects: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(29),
            connect_timeout: Duration::from_secs(5),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 32,
            user_agent: concat!("chatbot-proxy/", env!("CARGO_PKG_VERSION")).to_string(),
            follow_redirects: false,
        }
    }
}

impl HttpConfig {
    /// Sets the whole-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Enables or disables redirect following.
    #[must_use]
    pub const fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }
}

/// Build a configured HTTP client.
///
/// Redirects are not followed unless [`HttpConfig::follow_redirects`] is set,
/// so a relaying caller sees the upstream's own 3xx.
///
/// # Errors
///
/// Returns [`PlatformError::Client`] if the client cannot be built (e.g. TLS
/// initialization fails).
///
/// # Examples
///
/// ```
/// use rust_common::{HttpConfig, build_http_client};
/// use std::time::Duration;
///
/// let config = HttpConfig::default().with_timeout(Duration::from_secs(10));
/// let client = build_http_client(&config).expect("client");
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, PlatformError> {
    let redirect = if config.follow_redirects {
        Policy::default()
    } else {
        Policy::none()
    };

    ClientBuilder::new()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .pool_idle_timeout(config.pool_idle_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .user_agent(&config.user_agent)
        .redirect(redirect)
        .use_rustls_tls()
        .build()
        .map_err(PlatformError::Client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(29));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert!(!config.follow_redirects);
        assert!(config.user_agent.starts_with("chatbot-proxy/"));
    }

    #[test]
    fn test_config_builder() {
        let config = HttpConfig::default()
            .with_timeout(Duration::from_secs(3))
            .with_user_agent("test-agent")
            .with_follow_redirects(true);

        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.user_agent, "test-agent");
        assert!(config.follow_redirects);
    }

    #[test]
    fn test_build_client() {
        assert!(build_http_client(&HttpConfig::default()).is_ok());
    }
}
