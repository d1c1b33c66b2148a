//! Marker roles and the two-slot marker pair used for regions and projections.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::render::{ArtifactId, Orientation, RenderSurface};

/// Coordinate axis of a 2-D view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
        }
    }
}

/// What an analyst-placed marker is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MarkerRole {
    /// Bounds of a peak fit.
    Region,
    /// Sample point of the dedicated background fit.
    Background,
    /// Center hint for a peak fit.
    Peak,
    /// Bound of an x-projection (horizontal line at a y value).
    ProjectionX,
    /// Bound of a y-projection (vertical line at an x value).
    ProjectionY,
}

impl MarkerRole {
    /// Line orientation the role is drawn with.
    #[must_use]
    pub fn orientation(self) -> Orientation {
        match self {
            MarkerRole::ProjectionX => Orientation::Horizontal,
            _ => Orientation::Vertical,
        }
    }
}

/// A marker placed on a view, with the surface artifact drawing it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub role: MarkerRole,
    pub position: f64,
    pub artifact: ArtifactId,
}

impl Marker {
    /// Draws a new marker on `surface`.
    pub fn place<S: RenderSurface + ?Sized>(role: MarkerRole, position: f64, surface: &mut S) -> Self {
        let artifact = surface.add_marker(role.orientation(), position, role);
        Self {
            role,
            position,
            artifact,
        }
    }
}

/// Removes every marker in `markers` from the surface and empties the list.
pub(crate) fn remove_all<S: RenderSurface + ?Sized>(markers: &mut Vec<Marker>, surface: &mut S) {
    for marker in markers.drain(..) {
        surface.remove(marker.artifact);
    }
}

/// At most two markers of one role.
///
/// Placing a third marker clears the existing pair first.
#[derive(Debug, Clone)]
pub struct MarkerPair {
    role: MarkerRole,
    markers: Vec<Marker>,
}

impl MarkerPair {
    /// Creates an empty pair for `role`.
    #[must_use]
    pub fn new(role: MarkerRole) -> Self {
        Self {
            role,
            markers: Vec::with_capacity(2),
        }
    }

    /// Places a marker, clearing a complete pair first.
    pub fn place<S: RenderSurface + ?Sized>(&mut self, position: f64, surface: &mut S) {
        if self.markers.len() >= 2 {
            remove_all(&mut self.markers, surface);
        }
        self.markers.push(Marker::place(self.role, position, surface));
    }

    /// Removes both markers.
    pub fn clear<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) {
        remove_all(&mut self.markers, surface);
    }

    /// Number of markers currently placed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Returns true if no marker is placed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Marker positions in placement order.
    #[must_use]
    pub fn positions(&self) -> Vec<f64> {
        self.markers.iter().map(|m| m.position).collect()
    }

    /// Both positions sorted ascending, if the pair is complete.
    #[must_use]
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match self.markers.as_slice() {
            [a, b] => Some((a.position.min(b.position), a.position.max(b.position))),
            _ => None,
        }
    }
}
