pub mod codec;
pub mod config;
pub mod error;
pub mod gate;
pub mod handler;
pub mod pool;
pub mod publisher;

pub use config::{ConsumerConfig, Credentials, ProducerConfig};
pub use error::EngineError;
pub use gate::{AdmissionGate, Clock, ManualClock, Schedule, SystemClock};
pub use handler::{BoxError, Handler};
pub use pool::{ConsumerPool, PoolState};
pub use publisher::Publisher;

pub use tokio_util::sync::CancellationToken;
