//! Canned itineraries across central Oran. The same routes come back for any pair of
//! endpoints; only the travel mode picks which family is returned.

use transit_map::models::{
    Bounds, FieldError, LngLat, RouteResult, RouteSearchRequest, RouteStep, TransitDetails, TravelMode,
    ValidationErrors,
};

const TRAM_PATH: [(f64, f64); 5] = [
    (-0.6300, 35.7000),
    (-0.6352, 35.6981),
    (-0.6405, 35.6957),
    (-0.6458, 35.6929),
    (-0.6500, 35.6900),
];

const BUS_PATH: [(f64, f64); 5] = [
    (-0.6300, 35.7000),
    (-0.6331, 35.6948),
    (-0.6389, 35.6921),
    (-0.6447, 35.6908),
    (-0.6500, 35.6900),
];

const STREET_PATH: [(f64, f64); 4] = [
    (-0.6300, 35.7000),
    (-0.6378, 35.6972),
    (-0.6441, 35.6934),
    (-0.6500, 35.6900),
];

/// Reject requests with a blank endpoint
pub fn validate(request: &RouteSearchRequest) -> Result<(), ValidationErrors> {
    let errors: Vec<FieldError> = [("start", &request.start), ("end", &request.end)]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| FieldError {
            field: field.to_string(),
            message: "must not be empty".to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

/// Sample routes for `request.mode`, best first
pub fn search(request: &RouteSearchRequest) -> Vec<RouteResult> {
    match request.mode {
        TravelMode::Transit => vec![tram_route(), bus_route()],
        TravelMode::Walking => vec![street_route(
            "32 min",
            "2.6 km",
            "Walk",
            &["Head southwest on Boulevard de la Soummam", "Continue onto Rue Larbi Ben M'hidi"],
        )],
        TravelMode::Bicycling => vec![street_route(
            "11 min",
            "2.8 km",
            "Ride",
            &["Head southwest on Boulevard de la Soummam", "Take the cycle lane along Boulevard Emir Abdelkader"],
        )],
        TravelMode::Driving => vec![street_route(
            "9 min",
            "3.1 km",
            "Drive",
            &["Head southwest on Boulevard de la Soummam", "Turn left onto Boulevard Emir Abdelkader"],
        )],
    }
}

fn path(points: &[(f64, f64)]) -> Vec<LngLat> {
    points.iter().map(|&(lng, lat)| LngLat::new(lng, lat)).collect()
}

fn route(duration: &str, distance: &str, steps: Vec<RouteStep>, geometry: Vec<LngLat>) -> RouteResult {
    RouteResult {
        duration: duration.to_string(),
        distance: distance.to_string(),
        steps,
        bounds: Bounds::covering(&geometry),
        geometry,
    }
}

fn step(instruction: &str, distance: &str, duration: &str) -> RouteStep {
    RouteStep {
        instruction: instruction.to_string(),
        distance: Some(distance.to_string()),
        duration: Some(duration.to_string()),
        transit_details: None,
    }
}

fn ride(instruction: &str, line: &str, vehicle: &str, stop: &str, duration: &str) -> RouteStep {
    RouteStep {
        instruction: instruction.to_string(),
        distance: None,
        duration: Some(duration.to_string()),
        transit_details: Some(TransitDetails {
            line: line.to_string(),
            vehicle: vehicle.to_string(),
            stop: stop.to_string(),
        }),
    }
}

fn tram_route() -> RouteResult {
    route(
        "25 min",
        "4.2 km",
        vec![
            step("Walk to Place du 1er Novembre", "300 m", "4 min"),
            ride("Take tram T1 towards Es Senia", "T1", "Tram", "Place du 1er Novembre", "16 min"),
            step("Walk to destination", "400 m", "5 min"),
        ],
        path(&TRAM_PATH),
    )
}

fn bus_route() -> RouteResult {
    route(
        "31 min",
        "3.8 km",
        vec![
            step("Walk to Boulevard Emir Abdelkader", "250 m", "3 min"),
            ride("Take bus 11 towards Hai Sabah", "11", "Bus", "Emir Abdelkader", "22 min"),
            step("Walk to destination", "450 m", "6 min"),
        ],
        path(&BUS_PATH),
    )
}

fn street_route(duration: &str, distance: &str, verb: &str, instructions: &[&str]) -> RouteResult {
    let mut steps: Vec<RouteStep> = instructions
        .iter()
        .map(|instruction| RouteStep {
            instruction: (*instruction).to_string(),
            distance: None,
            duration: None,
            transit_details: None,
        })
        .collect();
    steps.push(step(&format!("{verb} to destination"), "200 m", "1 min"));
    route(duration, distance, steps, path(&STREET_PATH))
}
