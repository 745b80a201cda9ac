//! # zwassoc-protocol
//!
//! Wire protocol types for talking to a zwave-js-server instance.
//!
//! This crate provides:
//! - Outgoing request envelopes with a closed command set
//! - Incoming `version` / `event` / `result` envelopes
//! - A text codec for WebSocket frames
//! - Statically typed command class API calls (Association, AGI)

pub mod cc;
pub mod codec;
pub mod error;
pub mod message;

pub use cc::{CcApiMethod, CommandClass, GroupId, NodeId};
pub use codec::{Decoder, Encoder};
pub use error::ProtocolError;
pub use message::{
    Command, EventMessage, IncomingMessage, Request, ResultMessage, ServerFailure, VersionInfo,
};

/// API schema version requested during the handshake.
pub const API_SCHEMA_VERSION: u32 = 5;

/// Default zwave-js-server port.
pub const DEFAULT_PORT: u16 = 3000;
