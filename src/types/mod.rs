//! Data types for the chat relay
//!
//! This module contains the core data structures shared by the relay and the API layer.

mod connection;
mod message;

pub use connection::ConnectionId;
pub use message::{Message, Target};

/// Result type for top-level server operations
pub type ChatResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;
