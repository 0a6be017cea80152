use crate::config::AdminConfig;
use crate::error::AdminError;

/// Validate every section present and print it with secrets masked.
pub fn run(config_path: Option<&str>) -> Result<(), AdminError> {
    let config = AdminConfig::load(config_path)?;
    if config.is_empty() {
        return Err(AdminError::Config {
            context: "check",
            detail: "nothing to check: no [consumer], [producer] or [registry] section".into(),
        });
    }

    if let Some(consumer) = &config.consumer {
        consumer.validate().map_err(|e| e.with_context("consumer"))?;
        println!("{consumer:#?}");
    }
    if let Some(producer) = &config.producer {
        producer.validate().map_err(|e| e.with_context("producer"))?;
        println!("{producer:#?}");
    }
    if let Some(registry) = &config.registry {
        registry.validate()?;
        println!("{registry:#?}");
    }

    tracing::info!("configuration is valid");
    Ok(())
}
