use apache_avro::Schema;
use serde::{Deserialize, Serialize};

use crate::config::RegistryConfig;
use crate::error::RegistryError;

const CONTENT_TYPE: &str = "application/vnd.schemaregistry.v1+json";

#[derive(Serialize)]
struct RegisterRequest<'a> {
    schema: &'a str,
}

#[derive(Deserialize)]
struct RegisterResponse {
    id: u32,
}

/// Registry subject holding the value schema of `name`.
pub fn value_subject(name: &str) -> String {
    format!("{name}-value")
}

/// `POST` target registering a new version under the value subject of `name`.
pub fn versions_url(base: &str, name: &str) -> String {
    format!(
        "{}/subjects/{}/versions",
        base.trim_end_matches('/'),
        value_subject(name)
    )
}

/// Parse `schema_json` and render the request body carrying its canonical form.
pub fn register_body(name: &str, schema_json: &str) -> Result<String, RegistryError> {
    let schema = Schema::parse_str(schema_json).map_err(|e| RegistryError::InvalidSchema {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    let canonical = schema.canonical_form();
    serde_json::to_string(&RegisterRequest { schema: &canonical })
        .map_err(|e| RegistryError::InvalidSchema {
            name: name.to_string(),
            reason: e.to_string(),
        })
}

pub struct SchemaRegistryClient {
    http: reqwest::Client,
    config: RegistryConfig,
}

impl std::fmt::Debug for SchemaRegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistryClient")
            .field("config", &self.config)
            .finish()
    }
}

impl SchemaRegistryClient {
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| RegistryError::Config(format!("HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    /// Register `schema_json` as a new version of `{name}-value` and return
    /// the id the registry assigned to it.
    ///
    /// Registering a schema identical to an existing version returns the
    /// existing id.
    pub async fn register(&self, name: &str, schema_json: &str) -> Result<u32, RegistryError> {
        let body = register_body(name, schema_json)?;
        let url = versions_url(&self.config.url, name);

        let mut request = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .body(body);
        if !self.config.key.is_empty() {
            request = request.basic_auth(&self.config.key, Some(&self.config.secret));
        }

        let resp = request.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(RegistryError::Rejected {
                subject: value_subject(name),
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: RegisterResponse = serde_json::from_str(&text)
            .map_err(|e| RegistryError::Response(format!("{e}: {text}")))?;
        tracing::info!(subject = %value_subject(name), id = parsed.id, "schema registered");
        Ok(parsed.id)
    }
}
