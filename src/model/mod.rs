//! Data model for the clustering pipeline
//!
//! Serialized field names are a wire contract with the planning stages that
//! consume these structures as prompt context.

pub mod clustered;
pub mod orders;
pub mod reference;
pub mod routes;

pub use clustered::*;
pub use orders::*;
pub use reference::*;
pub use routes::*;
