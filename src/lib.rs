#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

//! # Buzzer Server
//!
//! The authoritative multiplayer back end for a real-time trivia buzzer game.
//!
//! Everything lives in memory: no database, no cloud services. Each room is
//! an isolated state machine reached over HTTP commands and a WebSocket
//! channel that fans role-aware state snapshots out to the host and players.

/// Server configuration (JSON file + env overrides + defaults)
pub mod config;

/// Closed domain error taxonomy and HTTP status mapping
pub mod error;

/// Structured logging configuration
pub mod logging;

/// Wire protocol: message types, codes, validation
pub mod protocol;

/// Trivia question providers
pub mod questions;

/// Per-room state machine, snapshots, connection set
pub mod room;

/// Registry, command dispatch, and the HTTP surface
pub mod server;

/// WebSocket connection handling
pub mod websocket;
