//! Repository modules - wrappers around port traits.
//!
//! Use cases reach external services only through these.

pub mod backend;

pub use backend::BackendClient;
