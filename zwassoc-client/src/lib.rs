//! # zwassoc-client
//!
//! Client library for zwave-js-server.
//!
//! This crate provides:
//! - A WebSocket connection that performs the schema/listen handshake
//! - Request/response correlation by message id
//! - Event forwarding through a pluggable [`EventHandler`]
//! - Typed command class calls and per-node association helpers

pub mod client;
pub mod connection;
pub mod error;
pub mod events;
pub mod node;
pub mod once;
pub mod pending;

pub use client::Client;
pub use connection::{Connection, ConnectionConfig};
pub use error::ClientError;
pub use events::{DiscardEvents, EventHandler};
pub use node::Node;
pub use once::OnceSignal;
