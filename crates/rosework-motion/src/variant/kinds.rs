//! Kind-specific payloads and the position/direction dispatch.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use rosework_core::event_bus::{event_bus, CamEvent, ChangeEvent, PropertyId, PropertyValue};
use rosework_core::types::LathePoint;
use rosework_rosette::RosetteSource;

use crate::curve::OutlineCurve;
use crate::cutter::{Cutter, CutterFrame, CutterLocation, CutterRef};
use crate::wheel::IndexWheel;

use super::{CutVariant, VariantBase};

pub(crate) fn default_cutter() -> CutterRef {
    Arc::new(Cutter::new(
        "UCF",
        0.25,
        0.02,
        CutterFrame::Ucf,
        CutterLocation::FrontOutside,
    ))
}

/// Travel direction of an index or pierce cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CutDirection {
    /// Straight along the X axis.
    LiteralX,
    /// Straight along the Z axis, sign from the local perpendicular.
    LiteralZ,
    /// Along the local curve perpendicular.
    Perpendicular,
}

/// Motion mode of a rosette cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RosetteMotion {
    /// Deflect purely along X.
    Rock,
    /// Deflect purely along Z.
    Pump,
    /// Deflect along the curve perpendicular.
    Perp,
    /// Deflect along the curve tangent.
    Tangent,
    /// Primary rosette on the rock axis, secondary on the pump axis.
    Both,
    /// Primary rosette on the perpendicular, secondary on the tangent.
    PerpTan,
}

impl RosetteMotion {
    /// Whether this motion reads a second amplitude source.
    pub fn is_dual(&self) -> bool {
        matches!(self, RosetteMotion::Both | RosetteMotion::PerpTan)
    }
}

/// Depth/phase progression style of a spiral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TwistStyle {
    /// Rotation proportional to arc length.
    Uniform,
    /// Rotation density increasing quadratically toward the end.
    Accelerate,
    /// Rotation following a half-sine ease.
    Sine,
}

/// The twist applied along a spiral cut.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Twist {
    /// Total spindle rotation over the spiral, degrees.
    pub total_rotation: f64,
    /// Amplitude parameter of the style (unused by `Uniform`).
    pub amplitude: f64,
    /// Progression style.
    pub style: TwistStyle,
}

impl Default for Twist {
    fn default() -> Self {
        Self {
            total_rotation: 360.0,
            amplitude: 1.0,
            style: TwistStyle::Uniform,
        }
    }
}

/// Amplitude as a function of distance along a pattern bar.
///
/// Line cuts are modulated by a straight physical bar instead of a
/// rotational rosette; the bar arrives as sampled (distance, amplitude)
/// pairs and is interpolated linearly between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampledBar {
    samples: Vec<(f64, f64)>,
    p_to_p: f64,
}

impl SampledBar {
    /// Build from (distance, amplitude) pairs sorted by distance.
    pub fn new(mut samples: Vec<(f64, f64)>) -> Self {
        samples.sort_by(|a, b| a.0.total_cmp(&b.0));
        let p_to_p = samples.iter().map(|s| s.1).fold(0.0, f64::max);
        Self { samples, p_to_p }
    }

    /// A bar of constant zero amplitude over the given length.
    pub fn flat(length: f64) -> Self {
        Self::new(vec![(0.0, 0.0), (length.max(0.0), 0.0)])
    }

    /// Peak amplitude over the bar.
    pub fn p_to_p(&self) -> f64 {
        self.p_to_p
    }

    /// Total bar length.
    pub fn length(&self) -> f64 {
        self.samples.last().map(|s| s.0).unwrap_or(0.0)
    }

    /// Linearly interpolated amplitude at a distance, clamped to the ends.
    pub fn amplitude_at(&self, distance: f64) -> f64 {
        let Some(first) = self.samples.first() else {
            return 0.0;
        };
        if distance <= first.0 {
            return first.1;
        }
        for pair in self.samples.windows(2) {
            let (d0, a0) = pair[0];
            let (d1, a1) = pair[1];
            if distance <= d1 {
                if d1 - d0 <= 0.0 {
                    return a1;
                }
                let t = (distance - d0) / (d1 - d0);
                return a0 + (a1 - a0) * t;
            }
        }
        self.samples.last().map(|s| s.1).unwrap_or(0.0)
    }
}

/// Payload of an index or pierce cut.
///
/// The cut positions come from the rosette's repeat, phase, and mask; the
/// amplitude modulates per-position depth the same way it does for swept
/// cuts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexPayload {
    pub direction: CutDirection,
    pub rosette: RosetteSource,
}

/// Payload of a rosette cut.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosettePayload {
    pub motion: RosetteMotion,
    pub rosette: RosetteSource,
    /// Secondary source, read by `Both` and `PerpTan`.
    pub rosette2: Option<RosetteSource>,
}

/// Payload of a pattern-follow cut.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternPayload {
    pub rosette: RosetteSource,
    /// Curvature compensation on curved surfaces.
    pub optimize: bool,
}

/// Payload of a line cut.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinePayload {
    pub bar: SampledBar,
}

/// Payload of an offset cut: one child re-expressed about a secondary
/// origin on the outline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffsetPayload {
    pub(crate) repeat: u32,
    pub(crate) index_offset: i32,
    pub(crate) offset_scale: f64,
    pub child: Box<CutVariant>,
}

impl OffsetPayload {
    /// Wrap a child variant with the given repeat.
    pub fn new(child: CutVariant, repeat: u32) -> Self {
        Self {
            repeat: repeat.max(1),
            index_offset: 0,
            offset_scale: 1.0,
            child: Box::new(child),
        }
    }

    /// The index wheel serving this repeat.
    pub fn wheel(&self) -> IndexWheel {
        IndexWheel::for_repeat(self.repeat)
    }
}

/// Payload of an offset group: several children sharing one offset origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffsetGroupPayload {
    pub(crate) repeat: u32,
    pub(crate) index_offset: i32,
    pub(crate) offset_scale: f64,
    pub children: Vec<CutVariant>,
}

impl OffsetGroupPayload {
    /// An empty group with the given repeat.
    pub fn new(repeat: u32) -> Self {
        Self {
            repeat: repeat.max(1),
            index_offset: 0,
            offset_scale: 1.0,
            children: Vec::new(),
        }
    }

    /// The index wheel serving this repeat.
    pub fn wheel(&self) -> IndexWheel {
        IndexWheel::for_repeat(self.repeat)
    }
}

/// Payload of a spiral-wrapped cut: the begin variant plus how the cut
/// evolves on the way to the end point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpiralPayload {
    /// The begin variant, of the matching simple kind.
    pub begin: Box<CutVariant>,
    /// Position of the end of the spiral.
    pub end_position: LathePoint,
    /// Depth at the end of the spiral.
    pub end_depth: f64,
    /// Twist descriptor.
    pub twist: Twist,
    /// Rapid waypoints traversed between repeats.
    pub waypoints: Vec<LathePoint>,
}

/// Discriminant of a variant kind; the key used by duplication factories
/// and dispatch tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariantTag {
    GoTo,
    Index,
    Pierce,
    Rosette,
    Pattern,
    Line,
    OffsetCut,
    OffsetGroup,
    SpiralIndex,
    SpiralRosette,
    SpiralLine,
}

/// Kind-specific payload of a cut-motion variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VariantKind {
    /// A plain positioning point; cuts nothing.
    GoTo,
    /// Discrete plunge cuts at indexed spindle angles.
    Index(IndexPayload),
    /// Like index, but piercing through to a fixed depth per position.
    Pierce(IndexPayload),
    /// A swept rosette cut.
    Rosette(RosettePayload),
    /// A cut following the pattern along the surface tangent.
    Pattern(PatternPayload),
    /// A cut modulated by a straight pattern bar.
    Line(LinePayload),
    /// One child about a secondary indexed origin.
    OffsetCut(OffsetPayload),
    /// Several children about a shared secondary origin.
    OffsetGroup(OffsetGroupPayload),
    /// An index cut spiraling between two points.
    SpiralIndex(SpiralPayload),
    /// A rosette cut spiraling between two points.
    SpiralRosette(SpiralPayload),
    /// A line cut spiraling between two points.
    SpiralLine(SpiralPayload),
}

impl VariantKind {
    /// The discriminant tag.
    pub fn tag(&self) -> VariantTag {
        match self {
            VariantKind::GoTo => VariantTag::GoTo,
            VariantKind::Index(_) => VariantTag::Index,
            VariantKind::Pierce(_) => VariantTag::Pierce,
            VariantKind::Rosette(_) => VariantTag::Rosette,
            VariantKind::Pattern(_) => VariantTag::Pattern,
            VariantKind::Line(_) => VariantTag::Line,
            VariantKind::OffsetCut(_) => VariantTag::OffsetCut,
            VariantKind::OffsetGroup(_) => VariantTag::OffsetGroup,
            VariantKind::SpiralIndex(_) => VariantTag::SpiralIndex,
            VariantKind::SpiralRosette(_) => VariantTag::SpiralRosette,
            VariantKind::SpiralLine(_) => VariantTag::SpiralLine,
        }
    }

    /// The primary amplitude source swept during synthesis.
    pub fn sweep_rosette(&self) -> Option<&RosetteSource> {
        match self {
            VariantKind::Index(p) | VariantKind::Pierce(p) => Some(&p.rosette),
            VariantKind::Rosette(p) => Some(&p.rosette),
            VariantKind::Pattern(p) => Some(&p.rosette),
            VariantKind::SpiralIndex(p)
            | VariantKind::SpiralRosette(p)
            | VariantKind::SpiralLine(p) => p.begin.kind.sweep_rosette(),
            _ => None,
        }
    }

    /// Peak amplitude of the swept source, zero for kinds that sweep
    /// nothing.
    pub fn sweep_p_to_p(&self) -> f64 {
        match self {
            VariantKind::Line(p) => p.bar.p_to_p(),
            VariantKind::SpiralIndex(p)
            | VariantKind::SpiralRosette(p)
            | VariantKind::SpiralLine(p) => p.begin.kind.sweep_p_to_p(),
            _ => self.sweep_rosette().map(|r| r.p_to_p()).unwrap_or(0.0),
        }
    }

    /// Whether the swept source cannot deflect the cutter at all.
    pub fn sweep_degenerate(&self) -> bool {
        match self {
            VariantKind::Line(p) => p.bar.p_to_p() <= 0.0,
            VariantKind::SpiralIndex(p)
            | VariantKind::SpiralRosette(p)
            | VariantKind::SpiralLine(p) => p.begin.kind.sweep_degenerate(),
            _ => self.sweep_rosette().map(|r| r.is_degenerate()).unwrap_or(true),
        }
    }

    /// Required displacement at a spindle angle, for the air check.
    pub fn amplitude_required(&self, angle: f64) -> f64 {
        match self {
            VariantKind::Index(p) | VariantKind::Pierce(p) => p.rosette.amplitude_at(angle),
            VariantKind::Rosette(p) => p.rosette.amplitude_at(angle),
            VariantKind::Pattern(p) => p.rosette.amplitude_at(angle),
            VariantKind::Line(p) => {
                let dist = rosework_core::types::angle_check(angle) / 360.0 * p.bar.length();
                p.bar.amplitude_at(dist)
            }
            VariantKind::SpiralIndex(p)
            | VariantKind::SpiralRosette(p)
            | VariantKind::SpiralLine(p) => p.begin.kind.amplitude_required(angle),
            _ => 0.0,
        }
    }

    // -- direction branches -------------------------------------------------

    fn inward(base: &VariantBase, curve: &dyn OutlineCurve) -> LathePoint {
        let side = if base.cutter.location.is_inside() {
            crate::curve::CurveSide::Inside
        } else {
            crate::curve::CurveSide::Outside
        };
        (-curve
            .perpendicular(base.position, side)
            .unwrap_or_default())
        .snapped()
    }

    fn rock_direction(base: &VariantBase, curve: &dyn OutlineCurve) -> LathePoint {
        let inward = Self::inward(base, curve);
        let sign = if inward.x != 0.0 {
            inward.x.signum()
        } else if base.cutter.location.is_inside() {
            // Inside cutters cut away from the axis, outside toward it.
            1.0
        } else {
            -1.0
        };
        LathePoint::new(sign, 0.0)
    }

    fn pump_direction(base: &VariantBase, curve: &dyn OutlineCurve) -> LathePoint {
        let inward = Self::inward(base, curve);
        let sign = if inward.z != 0.0 {
            inward.z.signum()
        } else {
            // On a vertical face the plunge sign depends on which half of
            // the shape the point sits on.
            let mid = (curve.top().z + curve.bottom().z) / 2.0;
            if base.position.z >= mid {
                -1.0
            } else {
                1.0
            }
        };
        LathePoint::new(0.0, sign)
    }

    fn perp_direction(base: &VariantBase, curve: &dyn OutlineCurve) -> LathePoint {
        let inward = Self::inward(base, curve);
        if inward == LathePoint::origin() {
            Self::rock_direction(base, curve)
        } else {
            inward
        }
    }

    fn tangent_direction(base: &VariantBase, curve: &dyn OutlineCurve) -> LathePoint {
        let inward = Self::inward(base, curve);
        let mut tangent = inward.perp().snapped();
        if tangent == LathePoint::origin() {
            return tangent;
        }
        if tangent.z != 0.0 {
            // Front cutters deflect toward the top of the shape, back
            // cutters toward the bottom.
            let up = base.cutter.location.is_front();
            if (tangent.z > 0.0) != up {
                tangent = -tangent;
            }
        } else if tangent.x < 0.0 {
            tangent = -tangent;
        }
        tangent
    }

    /// The normalized direction of cutter travel for this kind.
    pub(crate) fn cut_direction(&self, base: &VariantBase, curve: &dyn OutlineCurve) -> LathePoint {
        match self {
            VariantKind::GoTo => LathePoint::origin(),
            VariantKind::Index(p) | VariantKind::Pierce(p) => match p.direction {
                CutDirection::LiteralX => Self::rock_direction(base, curve),
                CutDirection::LiteralZ => Self::pump_direction(base, curve),
                CutDirection::Perpendicular => Self::perp_direction(base, curve),
            },
            VariantKind::Rosette(p) => match p.motion {
                RosetteMotion::Rock | RosetteMotion::Both => Self::rock_direction(base, curve),
                RosetteMotion::Pump => Self::pump_direction(base, curve),
                RosetteMotion::Perp | RosetteMotion::PerpTan => Self::perp_direction(base, curve),
                RosetteMotion::Tangent => Self::tangent_direction(base, curve),
            },
            VariantKind::Pattern(_) => Self::tangent_direction(base, curve),
            VariantKind::Line(_) => Self::perp_direction(base, curve),
            VariantKind::OffsetCut(p) => p.child.kind.cut_direction(&p.child.base, curve),
            VariantKind::OffsetGroup(p) => p
                .children
                .first()
                .map(|c| c.kind.cut_direction(&c.base, curve))
                .unwrap_or_default(),
            VariantKind::SpiralIndex(p)
            | VariantKind::SpiralRosette(p)
            | VariantKind::SpiralLine(p) => p.begin.kind.cut_direction(&p.begin.base, curve),
        }
    }

    /// Cutter-center position at a spindle angle for a pass depth.
    pub(crate) fn position_at(
        &self,
        base: &VariantBase,
        curve: &dyn OutlineCurve,
        angle: f64,
        pass_depth: f64,
    ) -> LathePoint {
        match self {
            VariantKind::GoTo => base.position,
            VariantKind::Index(p) | VariantKind::Pierce(p) => {
                let dir = self.cut_direction(base, curve);
                base.position + dir.scaled(pass_depth - p.rosette.amplitude_at(angle))
            }
            VariantKind::Rosette(p) => {
                let amp = p.rosette.amplitude_at(angle);
                match p.motion {
                    RosetteMotion::Both => {
                        let rock = Self::rock_direction(base, curve);
                        let pump = Self::pump_direction(base, curve);
                        let mut pos = base.position + rock.scaled(pass_depth - amp);
                        if let Some(second) = &p.rosette2 {
                            pos = pos + pump.scaled(pass_depth - second.amplitude_at(angle));
                        }
                        pos
                    }
                    RosetteMotion::PerpTan => {
                        let perp = Self::perp_direction(base, curve);
                        let tangent = Self::tangent_direction(base, curve);
                        let mut pos = base.position + perp.scaled(pass_depth - amp);
                        if let Some(second) = &p.rosette2 {
                            // The tangent source is pure modulation, no
                            // depth component.
                            pos = pos - tangent.scaled(second.amplitude_at(angle));
                        }
                        pos
                    }
                    _ => {
                        let dir = self.cut_direction(base, curve);
                        base.position + dir.scaled(pass_depth - amp)
                    }
                }
            }
            VariantKind::Pattern(p) => {
                let tangent = Self::tangent_direction(base, curve);
                let amp = p.rosette.amplitude_at(angle);
                let flat = base.position + tangent.scaled(amp);
                if p.optimize {
                    // Re-project the flat-geometry point onto the curved
                    // surface, then plunge along the local perpendicular.
                    let on_curve = curve.nearest_point(flat);
                    let side = if base.cutter.location.is_inside() {
                        crate::curve::CurveSide::Inside
                    } else {
                        crate::curve::CurveSide::Outside
                    };
                    let inward = (-curve
                        .perpendicular(on_curve, side)
                        .unwrap_or_default())
                    .snapped();
                    on_curve + inward.scaled(pass_depth)
                } else {
                    flat + Self::perp_direction(base, curve).scaled(pass_depth)
                }
            }
            VariantKind::Line(p) => {
                let dir = Self::perp_direction(base, curve);
                let dist = rosework_core::types::angle_check(angle) / 360.0 * p.bar.length();
                base.position + dir.scaled(pass_depth - p.bar.amplitude_at(dist))
            }
            VariantKind::OffsetCut(_) | VariantKind::OffsetGroup(_) => base.position,
            VariantKind::SpiralIndex(p)
            | VariantKind::SpiralRosette(p)
            | VariantKind::SpiralLine(p) => p
                .begin
                .kind
                .position_at(&p.begin.base, curve, angle, pass_depth),
        }
    }

    /// Whether the motion is collinear with the surface perpendicular.
    pub(crate) fn is_axis_restricted(&self, base: &VariantBase, curve: &dyn OutlineCurve) -> bool {
        match self {
            VariantKind::Rosette(p) => {
                let inward = Self::inward(base, curve);
                match p.motion {
                    RosetteMotion::Perp => true,
                    RosetteMotion::Pump => inward.x == 0.0 && inward.z != 0.0,
                    RosetteMotion::Rock => inward.z == 0.0 && inward.x != 0.0,
                    _ => false,
                }
            }
            VariantKind::Line(_) => true,
            VariantKind::SpiralRosette(p) => {
                p.begin.kind.is_axis_restricted(&p.begin.base, curve)
            }
            _ => false,
        }
    }

    /// Whether the curvature-compensated cut stays within the shape.
    ///
    /// The compensation re-projects onto the outline; if either amplitude
    /// extreme lands clamped at the curve's top or bottom endpoint there is
    /// no geometric solution past it.
    pub(crate) fn optimize_feasible(&self, base: &VariantBase, curve: &dyn OutlineCurve) -> bool {
        let VariantKind::Pattern(p) = self else {
            return true;
        };
        let tangent = Self::tangent_direction(base, curve);
        let top = curve.top();
        let bottom = curve.bottom();
        for amp in [0.0, p.rosette.p_to_p()] {
            let flat = base.position + tangent.scaled(amp);
            let on_curve = curve.nearest_point(flat);
            if on_curve.distance_to(&top) < 1e-9 || on_curve.distance_to(&bottom) < 1e-9 {
                return false;
            }
        }
        true
    }
}

// Kind-specific accessors and validated setters.
impl CutVariant {
    fn publish_kind(&self, property: &'static str, old: PropertyValue, new: PropertyValue) {
        event_bus()
            .publish(CamEvent::Changed(ChangeEvent::variant(
                self.base.id,
                PropertyId::new(property),
                old,
                new,
            )))
            .ok();
    }

    /// The primary rosette, for kinds that carry one.
    pub fn rosette(&self) -> Option<&RosetteSource> {
        self.kind.sweep_rosette()
    }

    /// Mutable access to the primary rosette. Nested rosette setters
    /// publish their own change events.
    pub fn rosette_mut(&mut self) -> Option<&mut RosetteSource> {
        match &mut self.kind {
            VariantKind::Index(p) | VariantKind::Pierce(p) => Some(&mut p.rosette),
            VariantKind::Rosette(p) => Some(&mut p.rosette),
            VariantKind::Pattern(p) => Some(&mut p.rosette),
            VariantKind::SpiralIndex(p)
            | VariantKind::SpiralRosette(p)
            | VariantKind::SpiralLine(p) => p.begin.rosette_mut(),
            _ => None,
        }
    }

    /// Change the index/pierce direction.
    pub fn set_direction(&mut self, direction: CutDirection) -> bool {
        match &mut self.kind {
            VariantKind::Index(p) | VariantKind::Pierce(p) => {
                p.direction = direction;
                self.publish_kind(
                    "variant.direction",
                    PropertyValue::Structural,
                    PropertyValue::Structural,
                );
                true
            }
            _ => false,
        }
    }

    /// Change the rosette motion mode.
    pub fn set_motion(&mut self, motion: RosetteMotion) -> bool {
        match &mut self.kind {
            VariantKind::Rosette(p) => {
                p.motion = motion;
                self.publish_kind(
                    "variant.motion",
                    PropertyValue::Structural,
                    PropertyValue::Structural,
                );
                true
            }
            _ => false,
        }
    }

    /// The curvature-compensation flag, for pattern cuts.
    pub fn optimize(&self) -> bool {
        matches!(&self.kind, VariantKind::Pattern(p) if p.optimize)
    }

    /// Enable or disable curvature compensation.
    pub fn set_optimize(&mut self, optimize: bool) -> bool {
        match &mut self.kind {
            VariantKind::Pattern(p) => {
                let old = p.optimize;
                if old == optimize {
                    return true;
                }
                p.optimize = optimize;
                self.publish_kind(
                    "variant.optimize",
                    PropertyValue::Flag(old),
                    PropertyValue::Flag(optimize),
                );
                true
            }
            _ => false,
        }
    }

    fn offset_fields_mut(&mut self) -> Option<(&mut u32, &mut i32, &mut f64)> {
        match &mut self.kind {
            VariantKind::OffsetCut(p) => {
                Some((&mut p.repeat, &mut p.index_offset, &mut p.offset_scale))
            }
            VariantKind::OffsetGroup(p) => {
                Some((&mut p.repeat, &mut p.index_offset, &mut p.offset_scale))
            }
            _ => None,
        }
    }

    /// Repeat count of an offset cut or group.
    pub fn offset_repeat(&self) -> Option<u32> {
        match &self.kind {
            VariantKind::OffsetCut(p) => Some(p.repeat),
            VariantKind::OffsetGroup(p) => Some(p.repeat),
            _ => None,
        }
    }

    /// Index offset of an offset cut or group.
    pub fn index_offset(&self) -> Option<i32> {
        match &self.kind {
            VariantKind::OffsetCut(p) => Some(p.index_offset),
            VariantKind::OffsetGroup(p) => Some(p.index_offset),
            _ => None,
        }
    }

    /// Scale factor of an offset cut or group.
    pub fn offset_scale(&self) -> Option<f64> {
        match &self.kind {
            VariantKind::OffsetCut(p) => Some(p.offset_scale),
            VariantKind::OffsetGroup(p) => Some(p.offset_scale),
            _ => None,
        }
    }

    /// Change the offset repeat. A repeat of zero is rejected; an index
    /// offset made incompatible by the new wheel is reset to zero.
    pub fn set_offset_repeat(&mut self, repeat: u32) -> bool {
        if repeat == 0 {
            return false;
        }
        let Some((r, idx, _)) = self.offset_fields_mut() else {
            return false;
        };
        let old = *r;
        *r = repeat;
        if !IndexWheel::for_repeat(repeat).valid_offset(repeat, *idx) {
            *idx = 0;
        }
        self.publish_kind(
            "variant.offset_repeat",
            PropertyValue::Integer(old as i64),
            PropertyValue::Integer(repeat as i64),
        );
        true
    }

    /// Change the index offset. Offsets the current wheel cannot realize
    /// at the current repeat are silently ignored.
    pub fn set_index_offset(&mut self, offset: i32) -> bool {
        let Some((r, idx, _)) = self.offset_fields_mut() else {
            return false;
        };
        let repeat = *r;
        if !IndexWheel::for_repeat(repeat).valid_offset(repeat, offset) {
            tracing::debug!(offset, repeat, "Rejected incompatible index offset");
            return false;
        }
        let old = *idx;
        *idx = offset;
        self.publish_kind(
            "variant.index_offset",
            PropertyValue::Integer(old as i64),
            PropertyValue::Integer(offset as i64),
        );
        true
    }

    /// Change the offset scale. Values outside `0.1..=10.0` are silently
    /// ignored.
    pub fn set_offset_scale(&mut self, scale: f64) -> bool {
        if !scale.is_finite() || !(0.1..=10.0).contains(&scale) {
            tracing::debug!(scale, "Rejected out-of-range offset scale");
            return false;
        }
        let Some((_, _, s)) = self.offset_fields_mut() else {
            return false;
        };
        let old = *s;
        *s = scale;
        self.publish_kind(
            "variant.offset_scale",
            PropertyValue::Number(old),
            PropertyValue::Number(scale),
        );
        true
    }

    /// Children of an offset group.
    pub fn group_children(&self) -> Option<&[CutVariant]> {
        match &self.kind {
            VariantKind::OffsetGroup(p) => Some(&p.children),
            _ => None,
        }
    }

    /// Append a child to an offset group, renumbering sequences.
    pub fn group_add_child(&mut self, child: CutVariant) -> bool {
        let VariantKind::OffsetGroup(p) = &mut self.kind else {
            return false;
        };
        p.children.push(child);
        for (i, c) in p.children.iter_mut().enumerate() {
            c.set_sequence(i);
        }
        self.publish_kind(
            "variant.group_children",
            PropertyValue::Structural,
            PropertyValue::Structural,
        );
        true
    }

    /// Remove a child by entity ID, renumbering sequences.
    pub fn group_remove_child(&mut self, id: rosework_core::types::EntityId) -> bool {
        let VariantKind::OffsetGroup(p) = &mut self.kind else {
            return false;
        };
        let before = p.children.len();
        p.children.retain(|c| c.id() != id);
        if p.children.len() == before {
            return false;
        }
        for (i, c) in p.children.iter_mut().enumerate() {
            c.set_sequence(i);
        }
        self.publish_kind(
            "variant.group_children",
            PropertyValue::Structural,
            PropertyValue::Structural,
        );
        true
    }

    /// Spiral payload, for the spiral kinds.
    pub fn spiral(&self) -> Option<&SpiralPayload> {
        match &self.kind {
            VariantKind::SpiralIndex(p)
            | VariantKind::SpiralRosette(p)
            | VariantKind::SpiralLine(p) => Some(p),
            _ => None,
        }
    }

    fn spiral_mut(&mut self) -> Option<&mut SpiralPayload> {
        match &mut self.kind {
            VariantKind::SpiralIndex(p)
            | VariantKind::SpiralRosette(p)
            | VariantKind::SpiralLine(p) => Some(p),
            _ => None,
        }
    }

    /// Change the spiral end depth. Negative depths are rejected.
    pub fn set_end_depth(&mut self, depth: f64) -> bool {
        if !depth.is_finite() || depth < 0.0 {
            return false;
        }
        let Some(p) = self.spiral_mut() else {
            return false;
        };
        let old = p.end_depth;
        p.end_depth = depth;
        self.publish_kind(
            "variant.end_depth",
            PropertyValue::Number(old),
            PropertyValue::Number(depth),
        );
        true
    }

    /// Replace the spiral twist descriptor.
    pub fn set_twist(&mut self, twist: Twist) -> bool {
        let Some(p) = self.spiral_mut() else {
            return false;
        };
        p.twist = twist;
        self.publish_kind(
            "variant.twist",
            PropertyValue::Structural,
            PropertyValue::Structural,
        );
        true
    }

    /// Append a rapid waypoint to a spiral.
    pub fn push_waypoint(&mut self, point: LathePoint) -> bool {
        let Some(p) = self.spiral_mut() else {
            return false;
        };
        p.waypoints.push(point);
        self.publish_kind(
            "variant.waypoints",
            PropertyValue::Structural,
            PropertyValue::Structural,
        );
        true
    }

    /// Force curvature compensation off when it has no geometric solution,
    /// surfacing a notice. Returns true when the flag was cleared.
    pub fn disable_infeasible_optimize(&mut self, curve: &dyn OutlineCurve) -> bool {
        if !self.optimize() || self.kind.optimize_feasible(&self.base, curve) {
            return false;
        }
        self.set_optimize(false);
        event_bus()
            .publish(CamEvent::Notice(
                rosework_core::event_bus::NoticeEvent::OptimizeDisabled {
                    entity: self.base.id,
                    reason: "curvature compensation exceeds the shape outline".into(),
                },
            ))
            .ok();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::PolylineCurve;
    use crate::variant::VariantBase;
    use rosework_rosette::{FlatPattern, SimpleRosette};

    fn flat_rosette(p_to_p: f64, repeat: u32) -> RosetteSource {
        RosetteSource::Simple(SimpleRosette::with_amplitude(
            Arc::new(FlatPattern),
            p_to_p,
            repeat,
        ))
    }

    fn offset_group(repeat: u32) -> CutVariant {
        CutVariant::new(
            VariantBase::new(LathePoint::new(1.0, 1.0), default_cutter(), 0.05),
            VariantKind::OffsetGroup(OffsetGroupPayload::new(repeat)),
        )
    }

    #[test]
    fn test_sampled_bar_interpolates() {
        let bar = SampledBar::new(vec![(0.0, 0.0), (1.0, 0.1), (2.0, 0.0)]);
        assert_eq!(bar.amplitude_at(0.0), 0.0);
        assert!((bar.amplitude_at(0.5) - 0.05).abs() < 1e-12);
        assert!((bar.amplitude_at(1.0) - 0.1).abs() < 1e-12);
        assert_eq!(bar.amplitude_at(5.0), 0.0);
        assert_eq!(bar.p_to_p(), 0.1);
        assert_eq!(bar.length(), 2.0);
    }

    #[test]
    fn test_offset_scale_rejects_out_of_range() {
        let mut v = offset_group(6);
        assert!(v.set_offset_scale(2.5));
        assert!(!v.set_offset_scale(0.05));
        assert!(!v.set_offset_scale(11.0));
        assert_eq!(v.offset_scale(), Some(2.5));
    }

    #[test]
    fn test_index_offset_rejects_incompatible() {
        let mut v = offset_group(6);
        // 24-hole wheel, 6 repeats: offsets 0..3 only.
        assert!(v.set_index_offset(3));
        assert!(!v.set_index_offset(4));
        assert_eq!(v.index_offset(), Some(3));
    }

    #[test]
    fn test_repeat_change_resets_incompatible_offset() {
        let mut v = offset_group(2);
        // 24-hole wheel, 2 repeats: offsets 0..11.
        assert!(v.set_index_offset(10));
        assert!(v.set_offset_repeat(6));
        assert_eq!(v.index_offset(), Some(0));
    }

    #[test]
    fn test_group_children_renumber() {
        let mut group = offset_group(4);
        let child = CutVariant::new(
            VariantBase::new(LathePoint::new(1.0, 0.5), default_cutter(), 0.02),
            VariantKind::Rosette(RosettePayload {
                motion: RosetteMotion::Rock,
                rosette: flat_rosette(0.02, 4),
                rosette2: None,
            }),
        );
        let id0 = child.id();
        group.group_add_child(child.duplicate());
        group.group_add_child(child.duplicate());
        group.group_add_child(child);
        let children = group.group_children().unwrap();
        assert_eq!(children.len(), 3);
        assert_eq!(
            children.iter().map(|c| c.sequence()).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert!(group.group_remove_child(id0));
        let children = group.group_children().unwrap();
        assert_eq!(
            children.iter().map(|c| c.sequence()).collect::<Vec<_>>(),
            vec![0, 1]
        );
    }

    #[test]
    fn test_flat_pattern_on_vertical_face_positions() {
        let curve = PolylineCurve::vertical(1.0, 0.0, 2.0, 4);
        let v = CutVariant::new(
            VariantBase::new(LathePoint::new(1.0, 1.0), default_cutter(), 0.05),
            VariantKind::Index(IndexPayload {
                direction: CutDirection::Perpendicular,
                rosette: flat_rosette(0.0, 4),
            }),
        );
        // Zero pToP: position is a pure plunge along -X.
        let pos = v.position_at(&curve, 90.0, 0.05);
        assert!((pos.x - 0.95).abs() < 1e-12);
        assert!((pos.z - 1.0).abs() < 1e-12);
    }
}
