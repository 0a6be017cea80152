/// Failure reported by a broker transport.
///
/// On the read side the engine stops a worker on a terminal error (see
/// [`TransportError::is_terminal`]) and logs and retries everything else.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The transport (or the broker behind it) has been closed.
    #[error("transport closed")]
    Closed,

    #[error("unknown topic '{0}'")]
    UnknownTopic(String),

    #[error("io: {0}")]
    Io(String),

    #[error("broker rejected request: {0}")]
    Rejected(String),
}

impl TransportError {
    pub fn io(msg: impl Into<String>) -> Self {
        TransportError::Io(msg.into())
    }

    /// True when retrying the same call can never succeed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransportError::Closed | TransportError::UnknownTopic(_))
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::Io(e.to_string())
    }
}
