#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("no schema named '{0}' in the catalog")]
    UnknownSchema(String),

    #[error("{0}")]
    Engine(#[from] courier_engine::EngineError),

    #[error("{0}")]
    Registry(#[from] courier_registry::RegistryError),

    #[error("transport: {0}")]
    Transport(#[from] courier_api::TransportError),

    #[error("demo: {0}")]
    Demo(String),

    #[error("signal: {0}")]
    Signal(#[from] std::io::Error),
}
