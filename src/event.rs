//! Normalization of inbound content events.
//!
//! The webhook body is produced by a user-editable template on the media
//! server, so nothing about its shape is trusted. Fields are pulled out of a
//! loose [`serde_json::Value`] and collapsed into a [`NormalizedRecord`] with
//! fixed fallbacks; anything unexpected is ignored rather than rejected.

use serde_json::{Map, Value};

use crate::error::RelayError;

pub const DEFAULT_EVENT_TYPE: &str = "New Content Added";
const NOT_AVAILABLE: &str = "N/A";

/// Flat, fallback-filled view of one content event.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub event_type: String,
    pub name: String,
    pub item_type: String,
    pub series_name: String,
    pub season_number: String,
    pub episode_number: String,
    pub year: String,
    pub overview: String,
    pub runtime: String,
    /// Base URL of the media server, without its trailing slash.
    pub server_url: String,
    pub item_id: String,
    pub imdb_id: Option<String>,
    pub tmdb_id: Option<String>,
    pub community_rating: Option<f64>,
}

/// Parse a raw request body and normalize it.
///
/// An empty body or invalid JSON is treated the same as a payload without an
/// item.
pub fn parse(body: &[u8], default_event_type: &str) -> Result<NormalizedRecord, RelayError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(RelayError::MissingItem);
    }
    let payload: Value = serde_json::from_slice(body).map_err(|_| RelayError::MissingItem)?;
    normalize(&payload, default_event_type)
}

/// Build a [`NormalizedRecord`] from a parsed payload.
///
/// `default_event_type` is used when the payload carries no `EventType`.
pub fn normalize(payload: &Value, default_event_type: &str) -> Result<NormalizedRecord, RelayError> {
    let item = payload
        .get("Item")
        .and_then(Value::as_object)
        .ok_or(RelayError::MissingItem)?;

    let provider_ids = item.get("ProviderIds").and_then(Value::as_object);
    let provider = |key: &str| provider_ids.and_then(|ids| text(ids.get(key)));

    Ok(NormalizedRecord {
        event_type: text(payload.get("EventType")).unwrap_or_else(|| default_event_type.to_string()),
        name: field(item, &["Name"]).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        item_type: field(item, &["Type"]).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        series_name: field(item, &["SeriesName"]).unwrap_or_default(),
        season_number: field(item, &["SeasonNumber"]).unwrap_or_default(),
        episode_number: field(item, &["EpisodeNumber"]).unwrap_or_default(),
        year: field(item, &["Year"]).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        overview: field(item, &["Overview"]).unwrap_or_default(),
        runtime: field(item, &["RunTime", "Runtime"]).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        server_url: field(item, &["ServerUrl"])
            .map(|url| strip_trailing_slash(&url).to_string())
            .unwrap_or_default(),
        item_id: field(item, &["ItemId"]).unwrap_or_default(),
        imdb_id: provider("Imdb"),
        tmdb_id: provider("Tmdb"),
        community_rating: number(item.get("CommunityRating")),
    })
}

/// Remove a single trailing `/`, if there is one.
pub fn strip_trailing_slash(url: &str) -> &str {
    url.strip_suffix('/').unwrap_or(url)
}

fn field(item: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| text(item.get(*key)))
}

/// Render a scalar as text. Empty strings, zero, `false` and non-scalars are
/// treated as missing.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(number_text(n)),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// Integral floats (`2021.0`) render without a fractional part.
fn number_text(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (n != 0.0 && n.is_finite()).then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_item_rejected() {
        for payload in [
            json!({}),
            json!({"EventType": "New Content Added"}),
            json!({"Item": null}),
            json!({"Item": "Dune"}),
            json!([]),
        ] {
            assert!(matches!(
                normalize(&payload, DEFAULT_EVENT_TYPE),
                Err(RelayError::MissingItem)
            ));
        }
    }

    #[test]
    fn test_empty_or_invalid_body_rejected() {
        assert!(matches!(parse(b"", DEFAULT_EVENT_TYPE), Err(RelayError::MissingItem)));
        assert!(matches!(parse(b"  \n", DEFAULT_EVENT_TYPE), Err(RelayError::MissingItem)));
        assert!(matches!(parse(b"{not json", DEFAULT_EVENT_TYPE), Err(RelayError::MissingItem)));
    }

    #[test]
    fn test_fallbacks_for_empty_item() {
        let record = normalize(&json!({"Item": {}}), DEFAULT_EVENT_TYPE).unwrap();
        assert_eq!(record.event_type, "New Content Added");
        assert_eq!(record.name, "N/A");
        assert_eq!(record.item_type, "N/A");
        assert_eq!(record.year, "N/A");
        assert_eq!(record.runtime, "N/A");
        assert_eq!(record.series_name, "");
        assert_eq!(record.season_number, "");
        assert_eq!(record.episode_number, "");
        assert_eq!(record.overview, "");
        assert_eq!(record.server_url, "");
        assert_eq!(record.item_id, "");
        assert_eq!(record.imdb_id, None);
        assert_eq!(record.tmdb_id, None);
        assert_eq!(record.community_rating, None);
    }

    #[test]
    fn test_numbers_rendered_as_text() {
        let payload = json!({"Item": {"Year": 2021, "SeasonNumber": 2, "EpisodeNumber": 5}});
        let record = normalize(&payload, DEFAULT_EVENT_TYPE).unwrap();
        assert_eq!(record.year, "2021");
        assert_eq!(record.season_number, "2");
        assert_eq!(record.episode_number, "5");
    }

    #[test]
    fn test_integral_floats_rendered_without_fraction() {
        let payload = json!({"Item": {"Year": 2021.0, "SeasonNumber": 3.0, "EpisodeNumber": 4.5}});
        let record = normalize(&payload, DEFAULT_EVENT_TYPE).unwrap();
        assert_eq!(record.year, "2021");
        assert_eq!(record.season_number, "3");
        assert_eq!(record.episode_number, "4.5");
    }

    #[test]
    fn test_zero_and_empty_values_count_as_missing() {
        let payload = json!({"Item": {"Name": "", "SeasonNumber": 0, "CommunityRating": 0}});
        let record = normalize(&payload, DEFAULT_EVENT_TYPE).unwrap();
        assert_eq!(record.name, "N/A");
        assert_eq!(record.season_number, "");
        assert_eq!(record.community_rating, None);
    }

    #[test]
    fn test_malformed_extra_fields_ignored() {
        let payload = json!({
            "Item": {
                "Name": "Dune",
                "Overview": {"nested": true},
                "ProviderIds": "not-a-map",
                "CommunityRating": "high",
                "Unknown": [1, 2, 3]
            },
            "Extra": {"x": 1}
        });
        let record = normalize(&payload, DEFAULT_EVENT_TYPE).unwrap();
        assert_eq!(record.name, "Dune");
        assert_eq!(record.overview, "");
        assert_eq!(record.imdb_id, None);
        assert_eq!(record.community_rating, None);
    }

    #[test]
    fn test_provider_ids_and_rating() {
        let payload = json!({
            "Item": {
                "ProviderIds": {"Imdb": "tt1160419", "Tmdb": 438631},
                "CommunityRating": "7.8"
            }
        });
        let record = normalize(&payload, DEFAULT_EVENT_TYPE).unwrap();
        assert_eq!(record.imdb_id.as_deref(), Some("tt1160419"));
        assert_eq!(record.tmdb_id.as_deref(), Some("438631"));
        assert_eq!(record.community_rating, Some(7.8));
    }

    #[test]
    fn test_runtime_alias() {
        let payload = json!({"Item": {"Runtime": "02:35:00"}});
        let record = normalize(&payload, DEFAULT_EVENT_TYPE).unwrap();
        assert_eq!(record.runtime, "02:35:00");
    }

    #[test]
    fn test_server_url_trailing_slash_stripped() {
        let payload = json!({"Item": {"ServerUrl": "http://host:8096/"}});
        let record = normalize(&payload, DEFAULT_EVENT_TYPE).unwrap();
        assert_eq!(record.server_url, "http://host:8096");
    }

    #[test]
    fn test_strip_trailing_slash_idempotent() {
        let once = strip_trailing_slash("http://host:8096/");
        assert_eq!(strip_trailing_slash(once), once);
        assert_eq!(strip_trailing_slash("http://host:8096"), "http://host:8096");
    }

    #[test]
    fn test_configured_default_event_type() {
        let record = normalize(&json!({"Item": {}}), "Library Updated").unwrap();
        assert_eq!(record.event_type, "Library Updated");

        let payload = json!({"EventType": "ItemAdded", "Item": {}});
        let record = normalize(&payload, "Library Updated").unwrap();
        assert_eq!(record.event_type, "ItemAdded");
    }
}
