#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("config error: {0}")]
    Config(String),

    /// The schema text is not valid Avro; no request was sent.
    #[error("invalid schema '{name}': {reason}")]
    InvalidSchema { name: String, reason: String },

    #[error("http error: {0}")]
    Http(String),

    /// The registry answered with a non-success status.
    #[error("registry rejected '{subject}' ({status}): {body}")]
    Rejected {
        subject: String,
        status: u16,
        body: String,
    },

    #[error("unexpected registry response: {0}")]
    Response(String),
}

impl From<reqwest::Error> for RegistryError {
    fn from(e: reqwest::Error) -> Self {
        RegistryError::Http(e.to_string())
    }
}
