//! Web form server module
//!
//! Serves the entry form, upload/download and a small JSON API.
//! Run with `contract-intake`.

pub mod form;
pub mod handlers;
pub mod page;
pub mod server;

pub use server::{build_router, run_server, ServerConfig};
