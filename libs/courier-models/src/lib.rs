//! Record types shared by producers and consumers, and the catalog of their
//! Avro schemas by name.

pub mod schemas;
pub mod user;

pub use schemas::{CATALOG, lookup};
pub use user::UserCreated;
