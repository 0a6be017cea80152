use apache_avro::Schema;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A message type that can travel through a topic.
///
/// The schema is fixed per concrete type and must match what every producer
/// on the same topic writes. The partition key only routes the message, it
/// is not an identity.
///
/// Implementations usually keep the parsed schema in a `LazyLock`:
///
/// ```ignore
/// static SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
///     Schema::parse_str(USER_CREATED).expect("valid avro schema literal")
/// });
///
/// impl Record for UserCreated {
///     fn schema() -> &'static Schema { &SCHEMA }
///     fn partition_key(&self) -> String { self.id.clone() }
/// }
/// ```
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Avro schema describing the wire layout of this type.
    fn schema() -> &'static Schema;

    /// Key used by the broker to pick a partition.
    fn partition_key(&self) -> String;
}
