//! Client for a Confluent-compatible schema registry.

pub mod client;
pub mod config;
pub mod error;

pub use client::SchemaRegistryClient;
pub use config::RegistryConfig;
pub use error::RegistryError;
