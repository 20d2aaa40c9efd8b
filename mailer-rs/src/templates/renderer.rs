//! Template rendering with variable substitution and tracking injection

use crate::templates::placeholder::{placeholders, replace_named, replace_placeholders};
use crate::templates::{Campaign, EmailTemplate, Recipient, RenderedEmail};
use crate::tracking::TrackingLinks;
use std::collections::HashMap;
use tracing::debug;

/// Placeholder names that all resolve to the click-tracking link
pub const LINK_ALIASES: [&str; 3] = ["url", "phishingUrl", "link"];

/// Built-in placeholder names, in substitution order
pub const BUILTIN_PLACEHOLDERS: [&str; 7] = [
    "firstName",
    "lastName",
    "email",
    "fullName",
    "url",
    "phishingUrl",
    "link",
];

const BODY_CLOSE: &str = "</body>";

/// Renders campaign content for a single recipient
///
/// # Placeholders
/// - `{{firstName}}`, `{{lastName}}` - Recipient names (empty when missing)
/// - `{{email}}` - Recipient address, inserted raw
/// - `{{fullName}}` - First and last name, or the address when both are missing
/// - `{{url}}`, `{{phishingUrl}}`, `{{link}}` - Click-tracking link
/// - `{{<custom field>}}` - Any key of the recipient's custom fields
///
/// Names match case-insensitively. Unknown placeholders are left in place so
/// partially filled templates can still be previewed.
pub struct TemplateRenderer;

impl TemplateRenderer {
    /// Render HTML content: substitute variables, then inject the open-tracking pixel
    ///
    /// A trailing `/` on `base_url` is dropped, so `https://x.test/` and
    /// `https://x.test` produce the same tracking URLs.
    pub fn render(
        content: &str,
        recipient: &Recipient,
        tracking_id: &str,
        base_url: &str,
    ) -> String {
        let links = TrackingLinks::new(base_url, tracking_id);
        let substituted = Self::substitute(content, recipient, &links);
        Self::inject_pixel(&substituted, &links)
    }

    /// Render plain text content. Never carries a tracking pixel.
    pub fn render_text(
        content: &str,
        recipient: &Recipient,
        tracking_id: &str,
        base_url: &str,
    ) -> String {
        Self::substitute(content, recipient, &TrackingLinks::new(base_url, tracking_id))
    }

    /// Render a subject line. Never carries a tracking pixel.
    pub fn render_subject(
        subject: &str,
        recipient: &Recipient,
        tracking_id: &str,
        base_url: &str,
    ) -> String {
        Self::render_text(subject, recipient, tracking_id, base_url)
    }

    /// Render subject, HTML body and optional text body independently
    pub fn render_email(
        template: &EmailTemplate,
        recipient: &Recipient,
        campaign: &Campaign,
        tracking_id: &str,
        base_url: &str,
    ) -> RenderedEmail {
        debug!(
            campaign_id = %campaign.id,
            tracking_id = %tracking_id,
            "Rendering email for recipient"
        );

        RenderedEmail {
            subject: Self::render_subject(&template.subject, recipient, tracking_id, base_url),
            html: Self::render(&template.body_html, recipient, tracking_id, base_url),
            text: template
                .body_text
                .as_deref()
                .map(|text| Self::render_text(text, recipient, tracking_id, base_url)),
        }
    }

    /// Extract all placeholder names from a template string
    pub fn extract_variables(template_str: &str) -> Vec<String> {
        placeholders(template_str)
    }

    /// Placeholders in `template` that no built-in or custom field of
    /// `recipient` fills, in first-seen order across subject, HTML and text
    pub fn unresolved_placeholders(template: &EmailTemplate, recipient: &Recipient) -> Vec<String> {
        let custom_keys: Vec<String> = recipient
            .custom_fields
            .keys()
            .map(|key| key.to_lowercase())
            .collect();

        let parts = [
            Some(template.subject.as_str()),
            Some(template.body_html.as_str()),
            template.body_text.as_deref(),
        ];

        let mut unresolved: Vec<String> = Vec::new();
        for name in parts.into_iter().flatten().flat_map(placeholders) {
            let known = Self::is_builtin(&name) || custom_keys.contains(&name.to_lowercase());
            if !known && !unresolved.contains(&name) {
                unresolved.push(name);
            }
        }
        unresolved
    }

    /// Whether `name` is one of the built-in placeholders
    pub fn is_builtin(name: &str) -> bool {
        BUILTIN_PLACEHOLDERS
            .iter()
            .any(|builtin| builtin.eq_ignore_ascii_case(name))
    }

    fn substitute(content: &str, recipient: &Recipient, links: &TrackingLinks) -> String {
        let first_name = recipient.first_name.as_deref().unwrap_or("");
        let last_name = recipient.last_name.as_deref().unwrap_or("");

        let mut result = replace_named(content, "firstName", first_name);
        result = replace_named(&result, "lastName", last_name);
        result = replace_named(&result, "email", &recipient.email);
        result = replace_named(&result, "fullName", &recipient.full_name());

        let click_url = links.click_url();
        for alias in LINK_ALIASES {
            result = replace_named(&result, alias, &click_url);
        }

        Self::substitute_custom_fields(&result, recipient)
    }

    /// Single pass over the content so inserted values are never re-scanned
    /// and field order cannot change the output.
    fn substitute_custom_fields(content: &str, recipient: &Recipient) -> String {
        if recipient.custom_fields.is_empty() {
            return content.to_string();
        }

        let exact: HashMap<&str, &str> = recipient
            .custom_fields
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_deref().unwrap_or("")))
            .collect();

        // Keys iterate in sorted order, so the first key wins when two differ only by case.
        let mut folded: HashMap<String, &str> = HashMap::new();
        for (key, value) in &recipient.custom_fields {
            folded
                .entry(key.to_lowercase())
                .or_insert_with(|| value.as_deref().unwrap_or(""));
        }

        replace_placeholders(content, |name| {
            exact
                .get(name)
                .or_else(|| folded.get(&name.to_lowercase()))
                .copied()
        })
    }

    fn inject_pixel(content: &str, links: &TrackingLinks) -> String {
        let pixel = links.pixel_html();
        let mut result = String::with_capacity(content.len() + pixel.len());

        // ASCII lowercasing keeps byte offsets aligned with the original.
        match content.to_ascii_lowercase().find(BODY_CLOSE) {
            Some(index) => {
                result.push_str(&content[..index]);
                result.push_str(&pixel);
                result.push_str(&content[index..]);
            }
            None => {
                result.push_str(content);
                result.push_str(&pixel);
            }
        }

        result
    }
}
