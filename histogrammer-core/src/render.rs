//! The drawing surface a view renders onto.
//!
//! A view controller owns its surface and pushes drawing commands into it.
//! The surface never refers back to the controller: hosts translate raw
//! input into [`InputEvent`](crate::InputEvent)s and call the controller.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::histogram::Histogram2D;
use crate::marker::MarkerRole;

/// Handle of a removable artifact (marker line or curve) on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArtifactId(pub u64);

/// Direction of a marker line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Orientation {
    /// Spans the y axis at a fixed x.
    Vertical,
    /// Spans the x axis at a fixed y.
    Horizontal,
}

/// What a drawn curve represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CurveKind {
    /// Linear background estimate.
    Background,
    /// Fitted peak alone.
    Peak,
    /// Fitted peak on top of its background.
    PeakWithBackground,
    /// Peak shape of an externally produced fit record.
    FitRecordOverlay,
}

/// Drawing operations a histogram view needs.
pub trait RenderSurface {
    /// Draws or replaces the stepped line of 1-D counts.
    fn draw_steps(&mut self, edges: &[f64], counts: &[u64]);

    /// Draws or replaces the log-scaled colour map of 2-D counts.
    fn draw_color_map(&mut self, histogram: &Histogram2D);

    /// Adds a marker line.
    fn add_marker(&mut self, orientation: Orientation, position: f64, role: MarkerRole)
        -> ArtifactId;

    /// Adds a curve through `points`.
    fn add_curve(&mut self, points: Vec<[f64; 2]>, kind: CurveKind) -> ArtifactId;

    /// Removes a marker line or curve. Unknown ids are ignored.
    fn remove(&mut self, id: ArtifactId);

    /// Draws or replaces the statistics text box.
    fn set_text_box(&mut self, text: &str);

    /// Shows a message to the analyst.
    fn report(&mut self, message: &str);

    /// Sets the plot title.
    fn set_title(&mut self, _title: &str) {}

    /// Sets the axis labels.
    fn set_axis_labels(&mut self, _x: &str, _y: &str) {}
}

/// Everything a [`RecordingSurface`] currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Marker {
        orientation: Orientation,
        position: f64,
        role: MarkerRole,
    },
    Curve {
        kind: CurveKind,
        points: Vec<[f64; 2]>,
    },
}

/// Headless surface that keeps the live scene in memory.
///
/// Used by the command-line tools and in tests.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    next_id: u64,
    artifacts: BTreeMap<ArtifactId, Artifact>,
    /// Last stepped line drawn, as `(edges, counts)`.
    pub steps: Option<(Vec<f64>, Vec<u64>)>,
    /// Integral and bin counts of the last colour map drawn.
    pub color_map: Option<(u64, (usize, usize))>,
    /// Current text box contents.
    pub text_box: Option<String>,
    /// Every message reported, oldest first.
    pub messages: Vec<String>,
    /// Current title.
    pub title: Option<String>,
    /// Current x and y labels.
    pub labels: Option<(String, String)>,
}

impl RecordingSurface {
    /// Live artifacts in creation order.
    pub fn artifacts(&self) -> impl Iterator<Item = (&ArtifactId, &Artifact)> {
        self.artifacts.iter()
    }

    /// Number of live marker lines with `role`.
    #[must_use]
    pub fn marker_count(&self, role: MarkerRole) -> usize {
        self.artifacts
            .values()
            .filter(|a| matches!(a, Artifact::Marker { role: r, .. } if *r == role))
            .count()
    }

    /// Number of live curves of `kind`.
    #[must_use]
    pub fn curve_count(&self, kind: CurveKind) -> usize {
        self.curves(kind).count()
    }

    /// Live curves of `kind`.
    pub fn curves(&self, kind: CurveKind) -> impl Iterator<Item = &[[f64; 2]]> {
        self.artifacts.values().filter_map(move |a| match a {
            Artifact::Curve { kind: k, points } if *k == kind => Some(points.as_slice()),
            _ => None,
        })
    }

    /// Number of live marker lines and curves.
    #[must_use]
    pub fn artifact_count(&self) -> usize {
        self.artifacts.len()
    }

    fn insert(&mut self, artifact: Artifact) -> ArtifactId {
        let id = ArtifactId(self.next_id);
        self.next_id += 1;
        self.artifacts.insert(id, artifact);
        id
    }
}

impl RenderSurface for RecordingSurface {
    fn draw_steps(&mut self, edges: &[f64], counts: &[u64]) {
        self.steps = Some((edges.to_vec(), counts.to_vec()));
    }

    fn draw_color_map(&mut self, histogram: &Histogram2D) {
        self.color_map = Some((histogram.integral(), histogram.bin_counts()));
    }

    fn add_marker(
        &mut self,
        orientation: Orientation,
        position: f64,
        role: MarkerRole,
    ) -> ArtifactId {
        self.insert(Artifact::Marker {
            orientation,
            position,
            role,
        })
    }

    fn add_curve(&mut self, points: Vec<[f64; 2]>, kind: CurveKind) -> ArtifactId {
        self.insert(Artifact::Curve { kind, points })
    }

    fn remove(&mut self, id: ArtifactId) {
        self.artifacts.remove(&id);
    }

    fn set_text_box(&mut self, text: &str) {
        self.text_box = Some(text.to_string());
    }

    fn report(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }

    fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    fn set_axis_labels(&mut self, x: &str, y: &str) {
        self.labels = Some((x.to_string(), y.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_surface_tracks_artifacts() {
        let mut surface = RecordingSurface::default();
        let a = surface.add_marker(Orientation::Vertical, 1.0, MarkerRole::Peak);
        let b = surface.add_curve(vec![[0.0, 0.0], [1.0, 1.0]], CurveKind::Background);
        assert_ne!(a, b);
        assert_eq!(surface.artifact_count(), 2);
        assert_eq!(surface.marker_count(MarkerRole::Peak), 1);
        assert_eq!(surface.curve_count(CurveKind::Background), 1);

        surface.remove(a);
        surface.remove(a);
        assert_eq!(surface.artifact_count(), 1);
        assert_eq!(surface.marker_count(MarkerRole::Peak), 0);
    }
}
