use std::time::Duration;

use serde::Deserialize;

use crate::error::RegistryError;

fn default_timeout_secs() -> u64 {
    30
}

/// Where the registry lives and how to authenticate against it.
#[derive(Clone, Deserialize)]
pub struct RegistryConfig {
    pub url: String,
    /// Basic-auth user (API key).
    #[serde(default)]
    pub key: String,
    /// Basic-auth password (API secret).
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let secret = if self.secret.is_empty() { "" } else { "***" };
        f.debug_struct("RegistryConfig")
            .field("url", &self.url)
            .field("key", &self.key)
            .field("secret", &secret)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl RegistryConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key: String::new(),
            secret: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), RegistryError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(RegistryError::Config("registry url is empty".into()));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(RegistryError::Config(format!(
                "registry url '{url}' must start with http:// or https://"
            )));
        }
        if self.key.is_empty() != self.secret.is_empty() {
            return Err(RegistryError::Config(
                "registry key and secret must be set together".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_url_scheme() {
        assert!(RegistryConfig::new("https://psrc.example.cloud").validate().is_ok());
        assert!(RegistryConfig::new("").validate().is_err());
        assert!(RegistryConfig::new("psrc.example.cloud").validate().is_err());
    }

    #[test]
    fn key_without_secret_is_rejected() {
        let cfg = RegistryConfig {
            key: "k".into(),
            ..RegistryConfig::new("http://localhost:8081")
        };
        assert!(matches!(cfg.validate(), Err(RegistryError::Config(_))));
    }

    #[test]
    fn debug_hides_secret() {
        let cfg = RegistryConfig {
            key: "k".into(),
            secret: "s3cr3t".into(),
            ..RegistryConfig::new("http://localhost:8081")
        };
        assert!(!format!("{cfg:?}").contains("s3cr3t"));
    }
}
