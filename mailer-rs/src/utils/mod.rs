//! Utility modules
//!
//! - [`email`]: Email address validation

pub mod email;

pub use email::{email_domain, validate_email};
