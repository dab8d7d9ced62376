use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::geo::{is_valid_latitude, is_valid_longitude, LngLat};

pub const DEFAULT_MARKER_COLOR: &str = "#3b82f6";
pub const MAX_TITLE_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// A persisted point marker, owned by the backend store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

impl Marker {
    #[must_use]
    pub fn position(&self) -> LngLat {
        LngLat::new(self.longitude, self.latitude)
    }
}

/// Payload for `POST /api/markers`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMarker {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    DEFAULT_MARKER_COLOR.to_string()
}

/// Payload for `PUT /api/markers/:id`. Absent fields are left untouched; an explicit
/// `"description": null` clears the description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

fn explicit_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every field-level problem found in a marker payload
#[derive(Debug, Clone, PartialEq, Eq, Default, thiserror::Error)]
#[error("invalid marker data: {}", summary(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationErrors {
    fn push(&mut self, field: &str, message: &str) {
        self.0.push(FieldError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    fn into_result(self) -> Result<(), Self> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.field.as_str()).collect()
    }
}

/// `#RRGGBB`, exactly seven characters
#[must_use]
pub fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

fn check_title(errors: &mut ValidationErrors, title: &str) {
    if title.trim().is_empty() {
        errors.push("title", "must not be empty");
    } else if title.chars().count() > MAX_TITLE_LENGTH {
        errors.push("title", "must be at most 100 characters");
    }
}

fn check_description(errors: &mut ValidationErrors, description: Option<&str>) {
    if description.is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LENGTH) {
        errors.push("description", "must be at most 500 characters");
    }
}

fn check_latitude(errors: &mut ValidationErrors, latitude: f64) {
    if !is_valid_latitude(latitude) {
        errors.push("latitude", "must be between -90 and 90");
    }
}

fn check_longitude(errors: &mut ValidationErrors, longitude: f64) {
    if !is_valid_longitude(longitude) {
        errors.push("longitude", "must be between -180 and 180");
    }
}

fn check_color(errors: &mut ValidationErrors, color: &str) {
    if !is_hex_color(color) {
        errors.push("color", "must be a #RRGGBB hex color");
    }
}

impl NewMarker {
    #[must_use]
    pub fn new(title: impl Into<String>, position: LngLat) -> Self {
        Self {
            title: title.into(),
            description: None,
            latitude: position.lat,
            longitude: position.lng,
            color: default_color(),
        }
    }

    /// Check every field against the marker schema
    ///
    /// # Errors
    ///
    /// Returns every violated constraint at once
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        check_title(&mut errors, &self.title);
        check_description(&mut errors, self.description.as_deref());
        check_latitude(&mut errors, self.latitude);
        check_longitude(&mut errors, self.longitude);
        check_color(&mut errors, &self.color);
        errors.into_result()
    }
}

impl MarkerPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check the fields present in the patch
    ///
    /// # Errors
    ///
    /// Returns every violated constraint at once
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if let Some(title) = &self.title {
            check_title(&mut errors, title);
        }
        if let Some(description) = &self.description {
            check_description(&mut errors, description.as_deref());
        }
        if let Some(latitude) = self.latitude {
            check_latitude(&mut errors, latitude);
        }
        if let Some(longitude) = self.longitude {
            check_longitude(&mut errors, longitude);
        }
        if let Some(color) = &self.color {
            check_color(&mut errors, color);
        }
        errors.into_result()
    }

    /// Apply the patch to a stored marker
    pub fn apply_to(self, marker: &mut Marker) {
        if let Some(title) = self.title {
            marker.title = title;
        }
        if let Some(description) = self.description {
            marker.description = description;
        }
        if let Some(latitude) = self.latitude {
            marker.latitude = latitude;
        }
        if let Some(longitude) = self.longitude {
            marker.longitude = longitude;
        }
        if let Some(color) = self.color {
            marker.color = color;
        }
    }
}
