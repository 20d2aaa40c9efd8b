//! Campaign templates
//!
//! Renders subject lines and bodies for one recipient: built-in and custom
//! variable substitution, click-tracking links and the open-tracking pixel.

pub mod placeholder;
pub mod renderer;
pub mod types;

pub use renderer::{TemplateRenderer, BUILTIN_PLACEHOLDERS, LINK_ALIASES};
pub use types::{Campaign, EmailTemplate, Recipient, RenderedEmail};
