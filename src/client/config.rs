//! Client configuration options.

use std::time::Duration;

/// Which wire style mutating transaction calls go through.
///
/// The site has migrated between API generations; the client keeps both
/// request shapes and selects one here. A future migration means adding a
/// variant and its primitive, not reworking the services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiStyle {
    /// The original bundled-service and form-post endpoints
    #[default]
    Legacy,
    /// The newer resource-oriented PFM endpoints
    Pfm,
}

/// Web API key sent on PFM calls. This is the site's own client-side key,
/// an external-service credential rather than a per-user secret.
const DEFAULT_API_KEY: &str = "prdakyresmGE6xGXVCSM2GO8GXEHHfNDkNYK2YVW";

/// Configuration for the Mint client.
///
/// # Example
///
/// ```
/// use mint_rs::{ApiStyle, ClientConfig};
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .with_timeout(Duration::from_secs(60))
///     .with_api_style(ApiStyle::Pfm);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root URL for the legacy endpoints
    pub base_url: String,
    /// Root URL for the PFM endpoints
    pub pfm_base_url: String,
    /// API key sent in the `Authorization` header of PFM calls
    pub api_key: String,
    /// Wire style for transaction mutations
    pub api_style: ApiStyle,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://mint.intuit.com".to_string(),
            pfm_base_url: "https://mint.intuit.com/pfm/v1".to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            api_style: ApiStyle::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the legacy base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the PFM base URL.
    pub fn with_pfm_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.pfm_base_url = base_url.into();
        self
    }

    /// Override the PFM API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Select the wire style for transaction mutations.
    pub fn with_api_style(mut self, style: ApiStyle) -> Self {
        self.api_style = style;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api_style, ApiStyle::Legacy);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.pfm_base_url.starts_with(&config.base_url));
    }

    #[test]
    fn test_builders() {
        let config = ClientConfig::new()
            .with_base_url("http://localhost:9999")
            .with_api_style(ApiStyle::Pfm);
        assert_eq!(config.base_url, "http://localhost:9999");
        assert_eq!(config.api_style, ApiStyle::Pfm);
    }
}
