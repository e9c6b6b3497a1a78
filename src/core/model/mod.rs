//! Canonical photo item value types.
//!
//! A `PhotoItem` is the engine's view of one photograph: opaque id, capture
//! instant, optional dimensions and content URL. Items are compared and
//! hashed by id alone so caches and groupings key on identity, not metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// GPS coordinates attached to a photo
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// One photograph described by picker metadata.
///
/// Capture times are always absolute instants in UTC. Items without a
/// `download_url` take part in candidate narrowing but are skipped by both
/// hashing stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoItem {
    pub id: String,
    pub create_time: DateTime<Utc>,
    pub filename: Option<String>,
    pub mime_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub gps: Option<GpsLocation>,
    pub download_url: Option<String>,
    pub deep_link: Option<String>,
}

impl PhotoItem {
    /// Create an item with only the required fields set
    pub fn new(id: impl Into<String>, create_time: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            create_time,
            filename: None,
            mime_type: None,
            width: None,
            height: None,
            gps: None,
            download_url: None,
            deep_link: None,
        }
    }

    /// Set pixel dimensions
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set the content download URL
    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = Some(url.into());
        self
    }

    /// Set the provider deep link
    pub fn with_deep_link(mut self, link: impl Into<String>) -> Self {
        self.deep_link = Some(link.into());
        self
    }
}

impl PartialEq for PhotoItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PhotoItem {}

impl Hash for PhotoItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn equality_is_by_id_only() {
        let a = PhotoItem::new("same", base_time()).with_dimensions(100, 100);
        let b = PhotoItem::new("same", base_time()).with_dimensions(200, 50);

        assert_eq!(a, b);
    }

    #[test]
    fn different_ids_are_not_equal() {
        let a = PhotoItem::new("a", base_time());
        let b = PhotoItem::new("b", base_time());

        assert_ne!(a, b);
    }

    #[test]
    fn items_hash_by_id() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(PhotoItem::new("same", base_time()));
        set.insert(PhotoItem::new("same", base_time()).with_dimensions(1, 1));

        assert_eq!(set.len(), 1);
    }

    #[test]
    fn builder_sets_optional_fields() {
        let item = PhotoItem::new("x", base_time())
            .with_dimensions(4000, 3000)
            .with_download_url("https://photos.google.com/x")
            .with_deep_link("https://photos.google.com/photo/x");

        assert_eq!(item.width, Some(4000));
        assert_eq!(item.height, Some(3000));
        assert!(item.download_url.is_some());
        assert!(item.deep_link.is_some());
    }
}
