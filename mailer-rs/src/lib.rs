//! mailer-rs: campaign mail rendering and delivery
//!
//! Renders phishing-simulation and marketing templates per recipient,
//! instruments them for open/click tracking and relays them over SMTP.
//!
//! # Features
//!
//! - **Templates**: `{{placeholder}}` substitution for recipient names, email,
//!   tracking links and arbitrary custom fields
//! - **Tracking**: click-tracking links and an open-tracking pixel per send
//! - **Delivery**: SMTP via `lettre`, or a dry-run log transport
//! - **Batches**: bounded-concurrency dispatch with per-recipient reports
//!
//! # Example
//!
//! ```
//! use mailer_rs::templates::{Recipient, TemplateRenderer};
//!
//! let recipient = Recipient::new("ann@example.com").with_first_name("Ann");
//! let text = TemplateRenderer::render_text(
//!     "Hi {{firstName}}, click {{link}}",
//!     &recipient,
//!     "t1",
//!     "https://x.test",
//! );
//! assert_eq!(text, "Hi Ann, click https://x.test/api/track/click/t1");
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration management
//! - [`error`]: Error types and handling
//! - [`templates`]: Template rendering
//! - [`tracking`]: Tracking URLs and pixel
//! - [`transport`]: Mail transports
//! - [`sender`]: Send orchestration
//! - [`dispatch`]: Batch dispatch
//! - [`api`]: HTTP API
//! - [`utils`]: Utility functions (validation, etc.)

pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod sender;
pub mod templates;
pub mod tracking;
pub mod transport;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{MailerError, Result};
