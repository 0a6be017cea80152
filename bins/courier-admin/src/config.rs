use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use courier_engine::{ConsumerConfig, ProducerConfig};
use courier_registry::RegistryConfig;

use crate::error::AdminError;

#[derive(Parser)]
#[command(name = "courier-admin", about = "Schema and topic administration for courier")]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, env = "COURIER_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the schemas known to this build
    ListSchemas,
    /// Register a catalog schema with the schema registry
    RegisterSchema(RegisterArgs),
    /// Load, validate and print the configuration
    CheckConfig,
    /// Publish and consume sample records through an in-memory broker
    Demo(DemoArgs),
}

#[derive(Args, Clone, Debug)]
pub struct RegisterArgs {
    /// Catalog name, e.g. UserCreated
    pub name: String,
}

#[derive(Args, Clone, Debug)]
pub struct DemoArgs {
    /// Number of records to publish
    #[arg(long, default_value_t = 5)]
    pub count: usize,
    /// Overrides `num_workers` from the consumer section
    #[arg(long)]
    pub workers: Option<usize>,
}

// ---- TOML Config ----

#[derive(Debug, Default, Deserialize)]
pub struct AdminConfig {
    pub consumer: Option<ConsumerConfig>,
    pub producer: Option<ProducerConfig>,
    pub registry: Option<RegistryConfig>,
}

const ENV_REGISTRY_URL: &str = "CONFLUENT_SCHEMA_REGISTRY_URL";
const ENV_REGISTRY_KEY: &str = "CONFLUENT_SCHEMA_REGISTRY_KEY";
const ENV_REGISTRY_SECRET: &str = "CONFLUENT_SCHEMA_REGISTRY_SECRET";

impl AdminConfig {
    /// Read the file at `path` (when given) and apply environment overrides.
    pub fn load(path: Option<&str>) -> Result<Self, AdminError> {
        let mut config = match path {
            Some(path) => Self::parse(&read(path)?).map_err(|detail| AdminError::Config {
                context: "parse",
                detail: format!("'{path}': {detail}"),
            })?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        if let Some(path) = path {
            tracing::debug!(config = %path, "loaded config");
        }
        Ok(config)
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Registry settings from the environment win over the file.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(url) = var(ENV_REGISTRY_URL) {
            match &mut self.registry {
                Some(registry) => registry.url = url,
                None => self.registry = Some(RegistryConfig::new(url)),
            }
        }
        if let Some(registry) = &mut self.registry {
            if let Some(key) = var(ENV_REGISTRY_KEY) {
                registry.key = key;
            }
            if let Some(secret) = var(ENV_REGISTRY_SECRET) {
                registry.secret = secret;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.is_none() && self.producer.is_none() && self.registry.is_none()
    }
}

fn read(path: &str) -> Result<String, AdminError> {
    std::fs::read_to_string(path).map_err(|e| AdminError::Config {
        context: "read",
        detail: format!("'{path}': {e}"),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const SAMPLE: &str = r#"
        [consumer]
        brokers = ["pkc-1.cloud:9092"]
        topic = "users"
        group_id = "billing"
        num_workers = 3
        username = "api-key"
        password = "api-secret"
        sasl = true
        tls = true
        business_hours = true

        [producer]
        brokers = ["pkc-1.cloud:9092"]
        topic = "users"

        [registry]
        url = "https://psrc.cloud"
        key = "file-key"
        secret = "file-secret"
    "#;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn parses_all_sections() {
        let config = AdminConfig::parse(SAMPLE).unwrap();
        let consumer = config.consumer.unwrap();
        assert_eq!(consumer.num_workers, 3);
        assert!(consumer.business_hours);
        assert!(consumer.validate().is_ok());
        assert_eq!(config.producer.unwrap().topic, "users");
        assert_eq!(config.registry.unwrap().key, "file-key");
    }

    #[test]
    fn empty_file_has_no_sections() {
        assert!(AdminConfig::parse("").unwrap().is_empty());
    }

    #[test]
    fn env_overrides_registry_credentials() {
        let mut config = AdminConfig::parse(SAMPLE).unwrap();
        config.apply_env(env(&[
            (ENV_REGISTRY_KEY, "env-key"),
            (ENV_REGISTRY_SECRET, ""),
        ]));
        let registry = config.registry.unwrap();
        assert_eq!(registry.url, "https://psrc.cloud");
        assert_eq!(registry.key, "env-key");
        assert_eq!(registry.secret, "file-secret");
    }

    #[test]
    fn env_url_creates_registry_section() {
        let mut config = AdminConfig::default();
        config.apply_env(env(&[
            (ENV_REGISTRY_URL, "http://localhost:8081"),
            (ENV_REGISTRY_KEY, "k"),
            (ENV_REGISTRY_SECRET, "s"),
        ]));
        let registry = config.registry.unwrap();
        assert_eq!(registry.url, "http://localhost:8081");
        assert_eq!((registry.key.as_str(), registry.secret.as_str()), ("k", "s"));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = AdminConfig::load(Some("/nonexistent/courier.toml")).unwrap_err();
        assert!(matches!(err, AdminError::Config { context: "read", .. }));
    }
}
