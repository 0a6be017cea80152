//! Avro wire codec: bare datums, no container header and no registry framing.

use apache_avro::Schema;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::EngineError;

/// Serialize `record` as a single Avro datum laid out by `schema`.
///
/// The record is first resolved against the schema, so a missing field
/// without a default or a field of the wrong type fails here and nothing is
/// produced.
pub fn encode<T: Serialize>(schema: &Schema, record: &T) -> Result<Vec<u8>, EngineError> {
    let value = apache_avro::to_value(record)
        .map_err(|e| EngineError::Encoding(format!("avro serialize: {e}")))?;
    let value = value
        .resolve(schema)
        .map_err(|e| EngineError::Encoding(format!("avro resolve: {e}")))?;
    apache_avro::to_avro_datum(schema, value)
        .map_err(|e| EngineError::Encoding(format!("avro encode: {e}")))
}

/// Read one Avro datum laid out by `schema` and deserialize it into `T`.
///
/// Trailing bytes after the datum are rejected.
pub fn decode<T: DeserializeOwned>(schema: &Schema, data: &[u8]) -> Result<T, EngineError> {
    let mut reader = data;
    let value = apache_avro::from_avro_datum(schema, &mut reader, None)
        .map_err(|e| EngineError::Decoding(format!("avro decode: {e}")))?;
    if !reader.is_empty() {
        return Err(EngineError::Decoding(format!(
            "{} trailing bytes after datum",
            reader.len()
        )));
    }
    apache_avro::from_value::<T>(&value)
        .map_err(|e| EngineError::Decoding(format!("avro deserialize: {e}")))
}
