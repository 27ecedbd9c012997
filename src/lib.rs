#![forbid(unsafe_code)]

//! Client core for the LCDd text protocol.
//!
//! [`Client`] manages the connection, handshake, request/acknowledgement
//! correlation and event dispatch; [`protocol`] holds the wire types.

pub mod client;
pub mod config;
pub mod errors;
pub mod protocol;

pub use client::Client;
pub use config::ClientConfig;
pub use errors::{AppError, Result};
