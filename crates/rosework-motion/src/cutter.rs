//! Cutter geometry.
//!
//! The cutter-profile library is an external collaborator; the motion core
//! needs only the frame kind, mounting location, and enough geometry to
//! compute width-of-cut and drawing hints.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared handle to a cutter description.
pub type CutterRef = Arc<Cutter>;

/// Geometric mounting mode of the cutter, determining which motion and
/// drawing rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CutterFrame {
    /// Horizontal cutting frame.
    Hcf,
    /// Universal cutting frame.
    Ucf,
    /// Eccentric cutting frame.
    Ecf,
    /// Drill spindle.
    Drill,
    /// Fixed (non-rotating) tool.
    Fixed,
}

/// Which side of the workpiece the cutter is mounted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CutterLocation {
    /// In front of the piece, cutting the outside surface.
    FrontOutside,
    /// In front of the piece, cutting an inside (bored) surface.
    FrontInside,
    /// Behind the piece, cutting the outside surface.
    BackOutside,
    /// Behind the piece, cutting an inside surface.
    BackInside,
}

impl CutterLocation {
    /// True for front-of-piece mountings.
    pub fn is_front(&self) -> bool {
        matches!(self, CutterLocation::FrontOutside | CutterLocation::FrontInside)
    }

    /// True for inside (boring) mountings.
    pub fn is_inside(&self) -> bool {
        matches!(self, CutterLocation::FrontInside | CutterLocation::BackInside)
    }
}

/// A cutter as seen by the motion core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cutter {
    /// Display name.
    pub name: String,
    /// Swing radius of the cutting frame.
    pub radius: f64,
    /// Width of the cutting tip.
    pub tip_width: f64,
    /// Frame kind.
    pub frame: CutterFrame,
    /// Mounting location relative to the piece.
    pub location: CutterLocation,
    /// Whether the renderer may use the fast idealized profile.
    pub ideal_fast_render: bool,
}

impl Cutter {
    /// Create a cutter with the given geometry.
    pub fn new(
        name: impl Into<String>,
        radius: f64,
        tip_width: f64,
        frame: CutterFrame,
        location: CutterLocation,
    ) -> Self {
        Self {
            name: name.into(),
            radius: radius.max(0.0),
            tip_width: tip_width.max(0.0),
            frame,
            location,
            ideal_fast_render: true,
        }
    }

    /// Width of the kerf left by this cutter at the given depth of cut.
    ///
    /// For swung frames this is the chord of the swing circle at that depth
    /// plus the tip width; drills and fixed tools cut their tip width.
    pub fn width_of_cut(&self, depth: f64) -> f64 {
        let depth = depth.max(0.0);
        match self.frame {
            CutterFrame::Drill | CutterFrame::Fixed => self.tip_width,
            CutterFrame::Hcf | CutterFrame::Ucf | CutterFrame::Ecf => {
                let d = depth.min(self.radius);
                let chord = 2.0 * (d * (2.0 * self.radius - d)).max(0.0).sqrt();
                chord + self.tip_width
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_of_cut_swung_frame() {
        let cutter = Cutter::new("UCF 1/2", 0.5, 0.0, CutterFrame::Ucf, CutterLocation::FrontOutside);
        // Full-radius depth cuts the full diameter.
        assert!((cutter.width_of_cut(0.5) - 1.0).abs() < 1e-12);
        // Shallow cuts are narrower.
        assert!(cutter.width_of_cut(0.05) < cutter.width_of_cut(0.2));
        assert_eq!(cutter.width_of_cut(-1.0), 0.0);
    }

    #[test]
    fn test_width_of_cut_drill() {
        let drill = Cutter::new("Drill", 0.25, 0.125, CutterFrame::Drill, CutterLocation::FrontOutside);
        assert_eq!(drill.width_of_cut(0.3), 0.125);
    }

    #[test]
    fn test_location_predicates() {
        assert!(CutterLocation::FrontInside.is_front());
        assert!(CutterLocation::FrontInside.is_inside());
        assert!(!CutterLocation::BackOutside.is_inside());
        assert!(!CutterLocation::BackOutside.is_front());
    }
}
