//! API module for HTTP and WebSocket endpoints
//!
//! Serves the signup/login/chat pages, the account form handlers and the
//! WebSocket chat transport.

pub mod account;
pub mod http;
pub mod websocket;
