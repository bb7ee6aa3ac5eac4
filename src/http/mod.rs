//! HTTP server module.
//!
//! Binds the configured address, serves the router with peer address info
//! for request logging, and drains connections on SIGTERM/SIGINT.

mod server;
mod shutdown;

pub use server::{start_server, ServerError};
