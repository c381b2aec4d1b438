use serde::{Deserialize, Serialize};
use vanet_core::Location;

use crate::error::RoutingError;

/// An ordered list of waypoints from source to destination.
///
/// A path always holds at least two waypoints. The first is the source and
/// the last is the destination; everything in between is a relay position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Location>", into = "Vec<Location>")]
pub struct Path {
    waypoints: Vec<Location>,
}

#[allow(clippy::len_without_is_empty)]
impl Path {
    /// The two-point fallback path.
    pub fn direct(source: Location, destination: Location) -> Self {
        Self {
            waypoints: vec![source, destination],
        }
    }

    /// Build a path from explicit waypoints.
    pub fn from_waypoints(waypoints: Vec<Location>) -> Result<Self, RoutingError> {
        if waypoints.len() < 2 {
            return Err(RoutingError::PathTooShort {
                len: waypoints.len(),
            });
        }
        Ok(Self { waypoints })
    }

    /// Strategies only assemble paths that start at the source and end at
    /// the destination.
    pub(crate) fn assembled(waypoints: Vec<Location>) -> Self {
        debug_assert!(waypoints.len() >= 2);
        Self { waypoints }
    }

    pub fn waypoints(&self) -> &[Location] {
        &self.waypoints
    }

    pub fn source(&self) -> &Location {
        &self.waypoints[0]
    }

    pub fn destination(&self) -> &Location {
        &self.waypoints[self.waypoints.len() - 1]
    }

    /// Number of waypoints, endpoints included.
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Number of links in the path.
    pub fn hop_count(&self) -> usize {
        self.waypoints.len() - 1
    }

    /// True for the two-point fallback shape.
    pub fn is_direct(&self) -> bool {
        self.waypoints.len() == 2
    }

    /// Consecutive waypoint pairs.
    pub fn links(&self) -> impl Iterator<Item = (&Location, &Location)> {
        self.waypoints.windows(2).map(|w| (&w[0], &w[1]))
    }

    /// Total length of the path in meters.
    pub fn length(&self) -> f64 {
        self.links().map(|(a, b)| a.distance_to(b)).sum()
    }

    /// Every link except the final one into the destination lies within
    /// `range`. The last link may be a best-effort jump.
    pub fn respects_range(&self, range: f64) -> bool {
        let relay_links = self.hop_count().saturating_sub(1);
        self.links()
            .take(relay_links)
            .all(|(a, b)| a.is_within(b, range))
    }
}

impl TryFrom<Vec<Location>> for Path {
    type Error = RoutingError;

    fn try_from(waypoints: Vec<Location>) -> Result<Self, Self::Error> {
        Self::from_waypoints(waypoints)
    }
}

impl From<Path> for Vec<Location> {
    fn from(path: Path) -> Self {
        path.waypoints
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self.waypoints.iter().map(|w| w.to_string()).collect();
        write!(f, "{}", rendered.join(" -> "))
    }
}
