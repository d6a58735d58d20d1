//! Use cases - User story orchestration.

pub mod generation;

pub use generation::GenerationUseCases;
