use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::geo::{Bounds, LngLat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Driving,
    Walking,
    #[default]
    Transit,
    Bicycling,
}

impl TravelMode {
    pub const ALL: [TravelMode; 4] = [
        TravelMode::Driving,
        TravelMode::Walking,
        TravelMode::Transit,
        TravelMode::Bicycling,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Walking => "walking",
            TravelMode::Transit => "transit",
            TravelMode::Bicycling => "bicycling",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            TravelMode::Driving => "Car",
            TravelMode::Walking => "Walk",
            TravelMode::Transit => "Transit",
            TravelMode::Bicycling => "Bike",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TravelMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| format!("unknown travel mode '{s}'"))
    }
}

/// Body of `POST /api/routes/search`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSearchRequest {
    pub start: String,
    pub end: String,
    pub mode: TravelMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitDetails {
    pub line: String,
    pub vehicle: String,
    pub stop: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStep {
    pub instruction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transit_details: Option<TransitDetails>,
}

/// One candidate itinerary. Results are ordered; the first is the primary route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub duration: String,
    pub distance: String,
    pub steps: Vec<RouteStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub geometry: Vec<LngLat>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_travel_mode_wire_names() {
        assert_eq!(serde_json::to_string(&TravelMode::Bicycling).expect("serializes"), "\"bicycling\"");
        assert_eq!("walking".parse::<TravelMode>(), Ok(TravelMode::Walking));
        assert!("flying".parse::<TravelMode>().is_err());
        assert!(serde_json::from_str::<TravelMode>("\"Transit\"").is_err());
    }

    #[test]
    fn test_route_result_parses_api_shape() {
        let json = r#"[{
            "duration": "25 min",
            "distance": "4.2 km",
            "steps": [
                {"instruction": "Walk to Place du 1er Novembre", "distance": "300 m", "duration": "4 min"},
                {"instruction": "Take tram T1", "transitDetails": {"line": "T1", "vehicle": "Tram", "stop": "Hai Sabah"}}
            ],
            "bounds": {"southwest": {"lat": 35.69, "lng": -0.65}, "northeast": {"lat": 35.70, "lng": -0.63}}
        }]"#;
        let routes: Vec<RouteResult> = serde_json::from_str(json).expect("valid json");
        assert_eq!(routes.len(), 1);
        let route = &routes[0];
        assert_eq!(route.steps.len(), 2);
        assert_eq!(route.steps[1].transit_details.as_ref().map(|t| t.line.as_str()), Some("T1"));
        assert!(route.geometry.is_empty());
        let bounds = route.bounds.expect("bounds present");
        assert_eq!(bounds.southwest, LngLat::new(-0.65, 35.69));
    }
}
