use std::sync::Arc;

use courier_api::{MessageWriter, Record};

use crate::codec;
use crate::config::ProducerConfig;
use crate::error::EngineError;

/// Typed producer for one topic.
///
/// Any [`Record`] type can be published through the same publisher; the
/// record's own schema drives the encoding. No retry happens here: the first
/// encoding or transport error goes back to the caller.
pub struct Publisher {
    config: ProducerConfig,
    writer: Arc<dyn MessageWriter>,
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher").field("config", &self.config).finish()
    }
}

impl Publisher {
    /// Validate the configuration and take ownership of the write half.
    pub fn new(config: ProducerConfig, writer: Arc<dyn MessageWriter>) -> Result<Self, EngineError> {
        config.validate().map_err(|e| e.with_context("producer"))?;
        Ok(Self { config, writer })
    }

    pub fn topic(&self) -> &str {
        &self.config.topic
    }

    /// Encode `record` and write it keyed by its partition key.
    ///
    /// Nothing is written when encoding fails.
    pub async fn publish<T: Record>(&self, record: &T) -> Result<(), EngineError> {
        let payload = codec::encode(T::schema(), record)?;
        let key = record.partition_key();

        self.writer.write(key.as_bytes().to_vec(), payload).await?;

        tracing::debug!(topic = %self.config.topic, key = %key, "message published");
        Ok(())
    }

    pub async fn close(&self) -> Result<(), EngineError> {
        self.writer.close().await?;
        tracing::debug!(topic = %self.config.topic, "publisher closed");
        Ok(())
    }
}
