use apache_avro::Schema;

use courier_models::{CATALOG, lookup};
use courier_registry::SchemaRegistryClient;

use crate::config::{AdminConfig, RegisterArgs};
use crate::error::AdminError;

pub fn list() -> Result<(), AdminError> {
    for (name, json) in CATALOG {
        match Schema::parse_str(json) {
            Ok(schema) => println!("{name}\t{}", schema.canonical_form()),
            Err(e) => println!("{name}\t<invalid: {e}>"),
        }
    }
    Ok(())
}

pub async fn register(config_path: Option<&str>, args: RegisterArgs) -> Result<(), AdminError> {
    let schema = lookup(&args.name).ok_or_else(|| AdminError::UnknownSchema(args.name.clone()))?;

    let config = AdminConfig::load(config_path)?;
    let registry = config.registry.ok_or_else(|| AdminError::Config {
        context: "registry",
        detail: "no [registry] section and CONFLUENT_SCHEMA_REGISTRY_URL is unset".into(),
    })?;
    tracing::info!(url = %registry.url, schema = %args.name, "registering schema");

    let client = SchemaRegistryClient::new(registry)?;
    let id = client.register(&args.name, schema).await?;
    println!("{} registered with id {id}", args.name);
    Ok(())
}
