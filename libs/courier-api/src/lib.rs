pub mod error;
pub mod record;
pub mod transport;

pub use error::TransportError;
pub use record::Record;
pub use transport::{BoxFuture, Message, MessageReader, MessageWriter};
