//! Open and click tracking
//!
//! Builds the tracking URLs embedded in outgoing mail. The endpoints behind
//! these URLs are served elsewhere:
//!
//! - `GET {base_url}/api/track/open/{tracking_id}` (pixel)
//! - `GET {base_url}/api/track/click/{tracking_id}` (link redirect)

use uuid::Uuid;

/// Generate a new tracking identifier for one recipient of one send
pub fn new_tracking_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Tracking URLs for a single recipient of a single send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingLinks {
    base_url: String,
    tracking_id: String,
}

impl TrackingLinks {
    /// A trailing `/` on `base_url` is dropped so paths never double up.
    pub fn new(base_url: &str, tracking_id: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            tracking_id: tracking_id.to_string(),
        }
    }

    /// Link substituted for `{{url}}`, `{{phishingUrl}}` and `{{link}}`
    pub fn click_url(&self) -> String {
        format!("{}/api/track/click/{}", self.base_url, self.tracking_id)
    }

    pub fn open_url(&self) -> String {
        format!("{}/api/track/open/{}", self.base_url, self.tracking_id)
    }

    /// Invisible 1x1 image pointing at the open-tracking endpoint
    pub fn pixel_html(&self) -> String {
        format!(
            r#"<img src="{}" width="1" height="1" alt="" style="display:none;border:0;" />"#,
            self.open_url()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let links = TrackingLinks::new("https://x.test", "t1");
        assert_eq!(links.click_url(), "https://x.test/api/track/click/t1");
        assert_eq!(links.open_url(), "https://x.test/api/track/open/t1");
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        let links = TrackingLinks::new("https://x.test/", "t1");
        assert_eq!(links.click_url(), "https://x.test/api/track/click/t1");
    }

    #[test]
    fn test_pixel_points_at_open_url() {
        let links = TrackingLinks::new("https://x.test", "abc");
        let pixel = links.pixel_html();
        assert!(pixel.starts_with("<img "));
        assert!(pixel.contains(r#"src="https://x.test/api/track/open/abc""#));
        assert!(pixel.contains(r#"width="1""#));
        assert!(pixel.contains(r#"height="1""#));
    }

    #[test]
    fn test_tracking_ids_are_unique() {
        let a = new_tracking_id();
        let b = new_tracking_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
    }
}
