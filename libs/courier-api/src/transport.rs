use std::future::Future;
use std::pin::Pin;

use crate::error::TransportError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A message as stored by the broker: routing key, opaque payload and its
/// position in the topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub partition: i32,
    pub offset: i64,
}

/// Read half of a broker connection, bound to one topic and consumer group.
///
/// Shared by every worker of a pool, so all methods take `&self` and must be
/// safe to call concurrently. `read_next` must be cancel-safe: dropping the
/// pending future must not lose a message.
pub trait MessageReader: Send + Sync {
    /// Wait for the next message assigned to this consumer group.
    fn read_next(&self) -> BoxFuture<'_, Result<Message, TransportError>>;

    /// Mark the message as processed for the consumer group.
    ///
    /// Transports that commit on read implement this as a no-op and give
    /// at-most-once delivery.
    fn commit(&self, message: &Message) -> BoxFuture<'_, Result<(), TransportError>>;

    /// Hand an uncommitted message back so it is delivered again.
    fn requeue(&self, message: Message) -> BoxFuture<'_, Result<(), TransportError>>;

    /// Release the connection. Pending and later reads fail with `Closed`.
    fn close(&self) -> BoxFuture<'_, Result<(), TransportError>>;
}

/// Write half of a broker connection, bound to one topic.
pub trait MessageWriter: Send + Sync {
    fn write(&self, key: Vec<u8>, value: Vec<u8>) -> BoxFuture<'_, Result<(), TransportError>>;

    fn close(&self) -> BoxFuture<'_, Result<(), TransportError>>;
}
