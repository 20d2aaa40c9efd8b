//! REST API module for mailer-rs
//!
//! Provides HTTP endpoints for template preview and campaign sends

pub mod handlers;
pub mod server;

pub use server::ApiServer;
