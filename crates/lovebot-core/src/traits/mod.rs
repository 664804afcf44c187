//! Core traits for lovebot collaborators.

mod llm;

pub use llm::*;
