//! WebSocket transport for the chat relay
//!
//! Endpoint `/ws?user=<name>`. Each socket becomes one relay connection; the
//! first frame the client receives is `{"type":"connected","connectionId":...}`.

pub mod events;
pub mod handler;
pub mod state;

pub use events::ClientMessage;
pub use handler::ws_handler;
pub use state::AppState;
