//! # Normalize Module
//!
//! Lifts inbound request payloads into canonical [`PhotoItem`]s.
//!
//! Two input shapes are accepted: a flat `photoItems` list that maps 1:1
//! onto items, and a nested provider `pickerPayload` whose fields are
//! extracted with first-match-wins precedence (top level, then
//! `mediaFile`, then `mediaFile.mediaFileMetadata`). Picker entries
//! missing an id or create time are silently dropped; malformed numbers
//! and timestamps degrade to `None`/epoch instead of failing the request.

use crate::core::model::{GpsLocation, PhotoItem};
use crate::error::InputError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Flat photo item payload from the request body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoItemPayload {
    pub id: String,
    pub create_time: DateTime<Utc>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub gps_latitude: Option<f64>,
    #[serde(default)]
    pub gps_longitude: Option<f64>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default, rename = "googlePhotosDeepLink")]
    pub deep_link: Option<String>,
}

/// Inbound scan request: exactly one payload shape must be non-empty
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    #[serde(default)]
    pub photo_items: Option<Vec<PhotoItemPayload>>,
    #[serde(default)]
    pub picker_payload: Option<Value>,
    #[serde(default)]
    pub consent_confirmed: bool,
}

/// Normalize a request into photo items, validating the payload shape
pub fn normalize_request(request: &ScanRequest) -> Result<Vec<PhotoItem>, InputError> {
    let has_photo_items = request
        .photo_items
        .as_ref()
        .is_some_and(|items| !items.is_empty());
    let has_picker = request
        .picker_payload
        .as_ref()
        .is_some_and(|payload| !payload.is_null());

    if !has_photo_items && !has_picker {
        return Err(InputError::MissingPayload);
    }

    let items = if has_photo_items {
        normalize_photo_items(request.photo_items.as_deref().unwrap_or_default())
    } else {
        normalize_picker_payload(request.picker_payload.as_ref().unwrap_or(&Value::Null))
    };

    if items.is_empty() {
        return Err(InputError::EmptyInput);
    }
    Ok(items)
}

/// Map flat payloads 1:1 onto photo items
pub fn normalize_photo_items(payloads: &[PhotoItemPayload]) -> Vec<PhotoItem> {
    payloads
        .iter()
        .map(|payload| PhotoItem {
            id: payload.id.clone(),
            create_time: payload.create_time,
            filename: payload.filename.clone(),
            mime_type: payload.mime_type.clone(),
            width: payload.width,
            height: payload.height,
            gps: build_gps(payload.gps_latitude, payload.gps_longitude),
            download_url: payload.download_url.clone(),
            deep_link: payload.deep_link.clone(),
        })
        .collect()
}

/// Extract photo items from a nested provider picker payload
pub fn normalize_picker_payload(payload: &Value) -> Vec<PhotoItem> {
    let mut items = Vec::new();
    for entry in picker_entries(payload) {
        if !entry.is_object() {
            continue;
        }
        let Some(id) = first_string(entry, &[&["id"], &["mediaFile", "id"]]) else {
            debug!("dropping picker entry without id");
            continue;
        };
        let Some(create_time_raw) = first_string(
            entry,
            &[
                &["createTime"],
                &["mediaFile", "createTime"],
                &["mediaFile", "mediaFileMetadata", "creationTime"],
            ],
        ) else {
            debug!(id = %id, "dropping picker entry without create time");
            continue;
        };

        items.push(PhotoItem {
            id,
            create_time: parse_create_time(&create_time_raw),
            filename: first_string(entry, &[&["filename"], &["mediaFile", "filename"]]),
            mime_type: first_string(entry, &[&["mimeType"], &["mediaFile", "mimeType"]]),
            width: first_u32(
                entry,
                &[
                    &["width"],
                    &["mediaFile", "width"],
                    &["mediaFile", "mediaFileMetadata", "width"],
                ],
            ),
            height: first_u32(
                entry,
                &[
                    &["height"],
                    &["mediaFile", "height"],
                    &["mediaFile", "mediaFileMetadata", "height"],
                ],
            ),
            gps: extract_gps(entry),
            download_url: first_string(entry, &[&["baseUrl"], &["mediaFile", "baseUrl"]]),
            deep_link: first_string(entry, &[&["productUrl"], &["mediaFile", "productUrl"]]),
        });
    }
    items
}

/// Parse a picker timestamp leniently.
///
/// RFC 3339 values normalize to UTC, naive values are assigned UTC, and
/// anything unparsable maps to the Unix epoch.
pub fn parse_create_time(raw: &str) -> DateTime<Utc> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Utc);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return naive.and_utc();
        }
    }
    DateTime::<Utc>::UNIX_EPOCH
}

fn picker_entries(payload: &Value) -> impl Iterator<Item = &Value> {
    ["mediaItems", "items", "media_items"]
        .iter()
        .find_map(|key| payload.get(key).and_then(Value::as_array))
        .map(|entries| entries.iter())
        .unwrap_or_default()
}

/// Walk each dotted path in order; the first value present wins
fn first_value<'a>(entry: &'a Value, paths: &[&[&str]]) -> Option<&'a Value> {
    paths.iter().find_map(|path| {
        let mut cursor = entry;
        for key in *path {
            cursor = cursor.get(key)?;
        }
        if cursor.is_null() {
            None
        } else {
            Some(cursor)
        }
    })
}

fn first_string(entry: &Value, paths: &[&[&str]]) -> Option<String> {
    first_value(entry, paths).map(value_to_string)
}

fn first_u32(entry: &Value, paths: &[&[&str]]) -> Option<u32> {
    first_value(entry, paths).and_then(coerce_u32)
}

/// Scalars render like their JSON form; strings drop the quotes
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn coerce_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text.parse().ok(),
        _ => None,
    }
}

fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.parse().ok(),
        _ => None,
    }
}

fn extract_gps(entry: &Value) -> Option<GpsLocation> {
    let latitude = first_value(
        entry,
        &[
            &["mediaFile", "mediaFileMetadata", "location", "latitude"],
            &["location", "latitude"],
        ],
    )
    .and_then(coerce_f64);
    let longitude = first_value(
        entry,
        &[
            &["mediaFile", "mediaFileMetadata", "location", "longitude"],
            &["location", "longitude"],
        ],
    )
    .and_then(coerce_f64);
    build_gps(latitude, longitude)
}

fn build_gps(latitude: Option<f64>, longitude: Option<f64>) -> Option<GpsLocation> {
    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(GpsLocation {
            latitude,
            longitude,
        }),
        _ => None,
    }
}
