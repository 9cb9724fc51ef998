//! Chat Relay Server
//!
//! A small signup/login web application with a real-time chat relay over
//! WebSockets.
//!
//! # Features
//!
//! - **Accounts**: signup with optional profile picture, bcrypt-hashed
//!   passwords in a flat JSON file, form login
//! - **Rooms**: created on first join, member join/leave notifications,
//!   room-wide chat
//! - **Private messages**: direct delivery by connection id, best-effort
//! - **Thread-Safe**: registry and room table mutate under one lock
//!
//! # Modules
//!
//! - `relay`: connection registry, room table, router and session gateway
//! - `auth`: credential store
//! - `api`: HTTP pages, form handlers and the WebSocket transport
//! - `config`: environment configuration
//! - `logging`: tracing subscriber setup
//! - `types`: connection ids and messages
//! - `utils`: atomic file writes
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chat_relay::{AppState, CredentialStore, ServerConfig};
//! use chat_relay::api::http::create_router;
//!
//! # async fn run() -> chat_relay::types::ChatResult<()> {
//! let config = ServerConfig::from_env()?;
//! let store = CredentialStore::open(&config.db_path, config.bcrypt_cost)?;
//! let addr = config.socket_addr()?;
//! let app = create_router(Arc::new(AppState::new(config, store)));
//! let listener = tokio::net::TcpListener::bind(addr).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod logging;
pub mod relay;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use api::websocket::AppState;
pub use auth::{AuthError, CredentialStore, UserRecord};
pub use config::ServerConfig;
pub use relay::{Gateway, GatewayEvent, Hub, RelayError, RelayEvent};
pub use types::{ChatResult, ConnectionId, Message, Target};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
