//! # bravia-client
//!
//! Client library for the display control protocol.
//!
//! This crate provides:
//! - A connection engine owning one TCP socket with automatic reconnection
//! - Background reader that routes answers and notifications
//! - Serialized request/response execution with a command timeout
//! - High-level API for power, volume, input, mute, scene and IR commands
//! - YAML/environment configuration

pub mod client;
pub mod config;
pub mod connection;
pub mod error;

pub use client::Client;
pub use config::{Config, ConfigError};
pub use connection::{Connection, ConnectionConfig, ConnectionState};
pub use error::ClientError;
