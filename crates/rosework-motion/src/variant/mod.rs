//! Cut-motion variants.
//!
//! A variant is one cutting strategy: how the cutter's XZ position is
//! computed as a function of spindle angle and depth. Variants are a
//! closed set dispatched by exhaustive match; spiral-wrapped kinds own
//! their begin variant rather than inheriting from it.

mod collection;
mod kinds;

pub use collection::VariantCollection;
pub use kinds::{
    CutDirection, IndexPayload, LinePayload, OffsetGroupPayload, OffsetPayload, PatternPayload,
    RosetteMotion, RosettePayload, SampledBar, SpiralPayload, Twist, TwistStyle, VariantKind,
    VariantTag,
};

use serde::{Deserialize, Serialize};

use rosework_core::event_bus::{event_bus, CamEvent, ChangeEvent, PropertyId, PropertyValue};
use rosework_core::types::{EntityId, LathePoint};
use rosework_rosette::RosetteSource;

use crate::curve::{CurveSide, OutlineCurve};
use crate::cutter::CutterRef;

/// State common to every cut-motion variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantBase {
    pub(crate) id: EntityId,
    pub(crate) position: LathePoint,
    pub(crate) sequence: usize,
    pub(crate) snap: bool,
    #[serde(skip, default = "kinds::default_cutter")]
    pub(crate) cutter: CutterRef,
    pub(crate) depth: f64,
}

impl VariantBase {
    /// Create base state at a position with a cutter.
    pub fn new(position: LathePoint, cutter: CutterRef, depth: f64) -> Self {
        Self {
            id: EntityId::new(),
            position,
            sequence: 0,
            snap: true,
            cutter,
            depth: depth.max(0.0),
        }
    }
}

/// One cut-motion variant: common base state plus a kind-specific payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutVariant {
    pub(crate) base: VariantBase,
    pub(crate) kind: VariantKind,
}

impl CutVariant {
    /// Create a variant of the given kind.
    pub fn new(base: VariantBase, kind: VariantKind) -> Self {
        Self { base, kind }
    }

    /// Entity ID for change-notification subscriptions.
    pub fn id(&self) -> EntityId {
        self.base.id
    }

    /// Position in the lathe plane (Y is identically zero).
    pub fn position(&self) -> LathePoint {
        self.base.position
    }

    /// Sequence number within the owning collection.
    pub fn sequence(&self) -> usize {
        self.base.sequence
    }

    /// Whether the point is locked to the outline curve.
    pub fn snap(&self) -> bool {
        self.base.snap
    }

    /// The cutter this variant cuts with.
    pub fn cutter(&self) -> &CutterRef {
        &self.base.cutter
    }

    /// Target cut depth.
    pub fn depth(&self) -> f64 {
        self.base.depth
    }

    /// The kind-specific payload.
    pub fn kind(&self) -> &VariantKind {
        &self.kind
    }

    /// The tag identifying this variant's kind.
    pub fn tag(&self) -> VariantTag {
        self.kind.tag()
    }

    /// An independent copy with a fresh entity ID and unset sequence,
    /// the factory used when adding or duplicating variants generically.
    pub fn duplicate(&self) -> CutVariant {
        let mut copy = self.clone();
        copy.base.id = EntityId::new();
        copy.base.sequence = 0;
        copy
    }

    // -- setters ------------------------------------------------------------

    fn publish(&self, property: &'static str, old: PropertyValue, new: PropertyValue) {
        event_bus()
            .publish(CamEvent::Changed(ChangeEvent::variant(
                self.base.id,
                PropertyId::new(property),
                old,
                new,
            )))
            .ok();
    }

    /// Move the variant. Non-finite coordinates are rejected.
    pub fn set_position(&mut self, position: LathePoint) -> bool {
        if !position.x.is_finite() || !position.z.is_finite() {
            return false;
        }
        let old = self.base.position;
        self.base.position = position;
        self.publish(
            "variant.position",
            PropertyValue::Point(old),
            PropertyValue::Point(position),
        );
        true
    }

    /// Set the cut depth. Negative depths are rejected.
    pub fn set_depth(&mut self, depth: f64) -> bool {
        if !depth.is_finite() || depth < 0.0 {
            tracing::debug!(depth, "Rejected negative cut depth");
            return false;
        }
        let old = self.base.depth;
        self.base.depth = depth;
        self.publish(
            "variant.depth",
            PropertyValue::Number(old),
            PropertyValue::Number(depth),
        );
        true
    }

    /// Lock or free the point relative to the outline curve.
    pub fn set_snap(&mut self, snap: bool) {
        let old = self.base.snap;
        if old == snap {
            return;
        }
        self.base.snap = snap;
        self.publish(
            "variant.snap",
            PropertyValue::Flag(old),
            PropertyValue::Flag(snap),
        );
    }

    /// Replace the cutter.
    pub fn set_cutter(&mut self, cutter: CutterRef) {
        self.base.cutter = cutter;
        self.publish(
            "variant.cutter",
            PropertyValue::Structural,
            PropertyValue::Structural,
        );
    }

    /// Re-position a snapped variant onto the outline curve.
    pub fn snap_to(&mut self, curve: &dyn OutlineCurve) {
        if !self.base.snap {
            return;
        }
        let snapped = curve.nearest_point(self.base.position);
        if snapped != self.base.position {
            self.set_position(snapped);
        }
    }

    pub(crate) fn set_sequence(&mut self, sequence: usize) {
        if self.base.sequence == sequence {
            return;
        }
        let old = self.base.sequence;
        self.base.sequence = sequence;
        self.publish(
            "variant.sequence",
            PropertyValue::Integer(old as i64),
            PropertyValue::Integer(sequence as i64),
        );
    }

    // -- geometry -----------------------------------------------------------

    /// Unit perpendicular pointing from the surface toward this variant's
    /// cutter, or the zero vector for a degenerate curve.
    pub fn outward_perp(&self, curve: &dyn OutlineCurve) -> LathePoint {
        let side = if self.base.cutter.location.is_inside() {
            CurveSide::Inside
        } else {
            CurveSide::Outside
        };
        curve
            .perpendicular(self.base.position, side)
            .unwrap_or_default()
            .snapped()
    }

    /// Unit vector into the material at this variant's position.
    pub fn inward_perp(&self, curve: &dyn OutlineCurve) -> LathePoint {
        (-self.outward_perp(curve)).snapped()
    }

    /// The normalized direction of cutter travel realizing this variant's
    /// pattern, scaled by `scale`.
    pub fn move_vector(&self, curve: &dyn OutlineCurve, scale: f64) -> LathePoint {
        self.kind
            .cut_direction(&self.base, curve)
            .scaled(scale)
            .snapped()
    }

    /// Absolute cutter-center position at a spindle angle for the given
    /// pass depth.
    pub fn position_at(&self, curve: &dyn OutlineCurve, angle: f64, pass_depth: f64) -> LathePoint {
        self.kind
            .position_at(&self.base, curve, angle, pass_depth)
            .snapped()
    }

    /// Position at a spindle angle at this variant's full target depth.
    pub fn position_at_depth(&self, curve: &dyn OutlineCurve, angle: f64) -> LathePoint {
        self.position_at(curve, angle, self.base.depth)
    }

    /// Width of the kerf at this variant's target depth.
    pub fn cut_width(&self) -> f64 {
        self.base.cutter.width_of_cut(self.base.depth)
    }

    /// The point on the outline nearest this variant: its tangent point.
    pub fn tangent_point(&self, curve: &dyn OutlineCurve) -> LathePoint {
        curve.nearest_point(self.base.position)
    }

    /// Angle of the local surface tangent, degrees in `[0, 360)`.
    pub fn tangent_angle(&self, curve: &dyn OutlineCurve) -> f64 {
        let perp = self.outward_perp(curve);
        let tangent = perp.perp();
        rosework_core::types::angle_check(tangent.z.atan2(tangent.x).to_degrees())
    }

    /// The primary amplitude source swept during synthesis, if this kind
    /// has one.
    pub fn sweep_rosette(&self) -> Option<&RosetteSource> {
        self.kind.sweep_rosette()
    }

    /// Required amplitude displacement at a spindle angle, used by the
    /// air-avoidance check.
    pub fn amplitude_required(&self, angle: f64) -> f64 {
        self.kind.amplitude_required(angle)
    }

    /// Whether the cutting motion is collinear with the surface
    /// perpendicular (a straight plunge): PUMP on a horizontal surface,
    /// ROCK on a vertical one, or any PERP cut. Only these cuts qualify
    /// for the depth-gated circle shortcut and air avoidance.
    pub fn is_axis_restricted(&self, curve: &dyn OutlineCurve) -> bool {
        self.kind.is_axis_restricted(&self.base, curve)
    }
}
