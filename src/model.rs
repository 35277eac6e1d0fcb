//! Location record model and storage key derivation.
//!
//! A [`LocationRecord`] is one participant's check-in.  Records are parsed
//! from JSON request bodies at the boundary and validated with `garde`
//! before anything touches the store.

use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ApiError;

/// Filename segment shared by every stored record.
pub const RECORD_FILENAME: &str = "location.json";

/// One geolocation check-in.
///
/// The `date` field is optional on input; when absent it is filled with the
/// current server time at parse time.  The default is computed per call, not
/// once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LocationRecord {
    /// Latitude in decimal degrees.
    #[garde(range(min = -90.0, max = 90.0))]
    pub lat: f64,

    /// Longitude in decimal degrees.
    #[garde(range(min = -180.0, max = 180.0))]
    pub lon: f64,

    /// Participant name.
    #[garde(length(min = 1))]
    pub name: String,

    /// Team name.
    #[garde(length(min = 1))]
    pub team: String,

    /// Client/browser descriptor as reported by the submitter.
    #[garde(skip)]
    pub browser_info: String,

    /// Submission timestamp; server-assigned when the caller omits it.
    #[serde(default = "Utc::now")]
    #[garde(skip)]
    pub date: DateTime<Utc>,

    /// Optional identifier (e.g. from a scanned QR code).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(skip)]
    pub qr_id: Option<String>,
}

impl LocationRecord {
    /// Parse and validate a record from a raw JSON body.
    pub fn parse(raw: &[u8]) -> Result<Self, ApiError> {
        let record: LocationRecord =
            serde_json::from_slice(raw).map_err(|e| ApiError::Validation {
                message: format!("Invalid location record: {e}"),
            })?;
        record.validate().map_err(|e| ApiError::Validation {
            message: format!("Invalid location record: {e}"),
        })?;
        Ok(record)
    }

    /// Derive the storage key for this record:
    /// `<sanitized-team>/<sanitized-name>/location.json`.
    pub fn storage_key(&self) -> String {
        format!(
            "{}/{}/{}",
            sanitize_segment(&self.team),
            sanitize_segment(&self.name),
            RECORD_FILENAME
        )
    }
}

/// Sanitize a user-supplied string into a safe path segment.
///
/// Whitespace becomes `_`; only ASCII alphanumerics, `.`, `-` and `_`
/// survive; leading/trailing dots and underscores are trimmed so the
/// result can never be empty, hidden, or a traversal component.  An empty
/// result falls back to `"unnamed"`.
pub fn sanitize_segment(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some('_')
            } else if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                Some(c)
            } else {
                None
            }
        })
        .collect();

    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed.to_string()
    }
}

// -- Tests ---------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_record() {
        let body = br#"{"lat":52.1,"lon":4.3,"name":"Ann","team":"Red","browser_info":"ua"}"#;
        let record = LocationRecord::parse(body).unwrap();
        assert_eq!(record.lat, 52.1);
        assert_eq!(record.lon, 4.3);
        assert_eq!(record.name, "Ann");
        assert_eq!(record.team, "Red");
        assert_eq!(record.browser_info, "ua");
        assert!(record.qr_id.is_none());
    }

    #[test]
    fn test_parse_fills_date_per_call() {
        let body = br#"{"lat":1.0,"lon":2.0,"name":"a","team":"b","browser_info":"ua"}"#;
        let before = Utc::now();
        let record = LocationRecord::parse(body).unwrap();
        let after = Utc::now();
        assert!(record.date >= before && record.date <= after);
    }

    #[test]
    fn test_parse_keeps_explicit_date() {
        let body = br#"{"lat":1.0,"lon":2.0,"name":"a","team":"b","browser_info":"ua","date":"2024-05-01T12:00:00Z"}"#;
        let record = LocationRecord::parse(body).unwrap();
        assert_eq!(record.date.to_rfc3339(), "2024-05-01T12:00:00+00:00");
    }

    #[test]
    fn test_parse_missing_field_names_it() {
        let body = br#"{"lat":1.0,"name":"a","team":"b","browser_info":"ua"}"#;
        let err = LocationRecord::parse(body).unwrap_err();
        assert!(err.to_string().contains("lon"));
    }

    #[test]
    fn test_parse_wrong_type_fails() {
        let body = br#"{"lat":"north","lon":2.0,"name":"a","team":"b","browser_info":"ua"}"#;
        assert!(LocationRecord::parse(body).is_err());
    }

    #[test]
    fn test_parse_rejects_out_of_range_latitude() {
        let body = br#"{"lat":120.0,"lon":2.0,"name":"a","team":"b","browser_info":"ua"}"#;
        assert!(LocationRecord::parse(body).is_err());
    }

    #[test]
    fn test_parse_rejects_empty_name() {
        let body = br#"{"lat":1.0,"lon":2.0,"name":"","team":"b","browser_info":"ua"}"#;
        assert!(LocationRecord::parse(body).is_err());
    }

    #[test]
    fn test_json_roundtrip_preserves_fields() {
        let body = br#"{"lat":52.1,"lon":4.3,"name":"Ann","team":"Red","browser_info":"ua","qr_id":"qr-7"}"#;
        let record = LocationRecord::parse(body).unwrap();
        let serialized = serde_json::to_vec(&record).unwrap();
        let back = LocationRecord::parse(&serialized).unwrap();
        assert_eq!(back.lat, record.lat);
        assert_eq!(back.lon, record.lon);
        assert_eq!(back.name, record.name);
        assert_eq!(back.team, record.team);
        assert_eq!(back.browser_info, record.browser_info);
        assert_eq!(back.date, record.date);
        assert_eq!(back.qr_id, record.qr_id);
    }

    #[test]
    fn test_storage_key_shape() {
        let body = br#"{"lat":1.0,"lon":2.0,"name":"Ann","team":"Red","browser_info":"ua"}"#;
        let record = LocationRecord::parse(body).unwrap();
        assert_eq!(record.storage_key(), "Red/Ann/location.json");
    }

    #[test]
    fn test_sanitize_plain() {
        assert_eq!(sanitize_segment("Red"), "Red");
        assert_eq!(sanitize_segment("team-42_a.b"), "team-42_a.b");
    }

    #[test]
    fn test_sanitize_spaces() {
        assert_eq!(sanitize_segment("Team Rocket"), "Team_Rocket");
    }

    #[test]
    fn test_sanitize_strips_separators_and_traversal() {
        assert_eq!(sanitize_segment("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_segment(".."), "unnamed");
        assert_eq!(sanitize_segment("a/b"), "ab");
        assert_eq!(sanitize_segment("a\\b"), "ab");
    }

    #[test]
    fn test_sanitize_strips_control_and_unicode() {
        assert_eq!(sanitize_segment("Ann\x00e"), "Anne");
        assert_eq!(sanitize_segment("équipe"), "quipe");
    }

    #[test]
    fn test_sanitize_empty_fallback() {
        assert_eq!(sanitize_segment(""), "unnamed");
        assert_eq!(sanitize_segment("///"), "unnamed");
    }

    #[test]
    fn test_sanitize_no_hidden_files() {
        assert_eq!(sanitize_segment(".hidden"), "hidden");
        assert_eq!(sanitize_segment("_x_"), "x");
    }
}
