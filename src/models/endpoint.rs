use super::geo::LngLat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    Start,
    End,
}

impl EndpointKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            EndpointKind::Start => "Start",
            EndpointKind::End => "End",
        }
    }

    /// Fixed marker color: green for the start, red for the end
    #[must_use]
    pub fn marker_color(self) -> &'static str {
        match self {
            EndpointKind::Start => crate::constants::START_MARKER_COLOR,
            EndpointKind::End => crate::constants::END_MARKER_COLOR,
        }
    }

    #[must_use]
    pub fn picking_mode(self) -> InteractionMode {
        match self {
            EndpointKind::Start => InteractionMode::PickingStart,
            EndpointKind::End => InteractionMode::PickingEnd,
        }
    }
}

/// One of the two route-search locations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndpointSelection {
    pub coordinates: Option<LngLat>,
    pub display_text: String,
    /// Whether the registry currently shows an engine marker for this endpoint
    pub has_marker: bool,
}

impl EndpointSelection {
    #[must_use]
    pub fn from_point(point: LngLat) -> Self {
        Self {
            coordinates: Some(point),
            display_text: point.display_text(),
            has_marker: true,
        }
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.display_text.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    PickingStart,
    PickingEnd,
}

impl InteractionMode {
    #[must_use]
    pub fn target(self) -> Option<EndpointKind> {
        match self {
            InteractionMode::Idle => None,
            InteractionMode::PickingStart => Some(EndpointKind::Start),
            InteractionMode::PickingEnd => Some(EndpointKind::End),
        }
    }

    #[must_use]
    pub fn is_picking(self) -> bool {
        self != InteractionMode::Idle
    }
}
