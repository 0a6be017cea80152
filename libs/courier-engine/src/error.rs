use courier_api::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Rejected configuration; nothing was constructed.
    #[error("config error: {0}")]
    Config(String),

    /// The record does not fit its schema.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The payload is not a valid datum for the schema, or does not fit the
    /// target type.
    #[error("decoding error: {0}")]
    Decoding(String),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Lifecycle misuse, e.g. starting a pool twice.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl EngineError {
    /// Add context to the error.
    ///
    /// Message-carrying variants get the context prepended; `Transport` and
    /// `InvalidState` are returned unchanged.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            EngineError::Config(msg) => EngineError::Config(format!("{ctx}: {msg}")),
            EngineError::Encoding(msg) => EngineError::Encoding(format!("{ctx}: {msg}")),
            EngineError::Decoding(msg) => EngineError::Decoding(format!("{ctx}: {msg}")),
            other => other,
        }
    }
}
