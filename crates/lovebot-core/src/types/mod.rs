//! Core types shared across the decision pipeline.

mod conversation;
mod message;

pub use conversation::*;
pub use message::*;
