//! Client-wide configuration.

/// Base URLs and shared settings handed to every path function.
///
/// Most endpoints build their URL from [`api_base_url`]; the handful of
/// legacy form-parameter endpoints use [`rest_base_url`]. Both default to
/// the same host unless overridden, which is how regional or test
/// deployments are pointed at.
///
/// [`api_base_url`]: ClientConfig::api_base_url
/// [`rest_base_url`]: ClientConfig::rest_base_url
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    api_base_url: String,
    rest_base_url: String,
}

impl ClientConfig {
    /// Configuration with both bases pointing at `api_base_url`.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        let api_base_url = trim_trailing_slash(api_base_url.into());
        Self {
            rest_base_url: api_base_url.clone(),
            api_base_url,
        }
    }

    /// Override the base for legacy form-parameter endpoints.
    pub fn with_rest_base_url(mut self, rest_base_url: impl Into<String>) -> Self {
        self.rest_base_url = trim_trailing_slash(rest_base_url.into());
        self
    }

    /// Base URL for JSON endpoints, without a trailing slash.
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Base URL for legacy form-parameter endpoints, without a trailing
    /// slash.
    pub fn rest_base_url(&self) -> &str {
        &self.rest_base_url
    }
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_base_defaults_to_the_api_base() {
        let config = ClientConfig::new("https://api.example.com");
        assert_eq!(config.api_base_url(), "https://api.example.com");
        assert_eq!(config.rest_base_url(), "https://api.example.com");
    }

    #[test]
    fn bases_are_normalized_and_overridable() {
        let config = ClientConfig::new("https://api.example.com/")
            .with_rest_base_url("https://rest.example.com/");
        assert_eq!(config.api_base_url(), "https://api.example.com");
        assert_eq!(config.rest_base_url(), "https://rest.example.com");
    }
}
