//! Toolpath synthesis.
//!
//! Converts one cut-motion variant plus a depth-pass plan into an ordered
//! motion-command stream. Commands are generated strictly in increasing
//! traversal order (angle, then repeat); later commands assume the machine
//! state left by earlier ones.

use rosework_core::types::{angle_check, LathePoint};
use rosework_rosette::RosetteSource;

use crate::cutlist::{CutList, Speed};
use crate::curve::OutlineCurve;
use crate::error::MotionError;
use crate::passes::{Pass, PassPlan};
use crate::spiral;
use crate::variant::{CutVariant, VariantKind, VariantTag};

/// Angles closer than this are the same waypoint.
const ANGLE_EPSILON: f64 = 1e-9;

/// Amplitudes closer than this are flat for waypoint collapsing.
const AMPLITUDE_EPSILON: f64 = 1e-9;

/// Synthesizes motion commands for variants against one outline curve.
pub struct Synthesizer<'a> {
    curve: &'a dyn OutlineCurve,
}

impl<'a> Synthesizer<'a> {
    /// Create a synthesizer over the given outline.
    pub fn new(curve: &'a dyn OutlineCurve) -> Self {
        Self { curve }
    }

    /// Synthesize the full command stream for one variant.
    ///
    /// Pattern variants whose curvature compensation has no geometric
    /// solution get their optimize flag forced off (with a notice) before
    /// synthesis; everything downstream sees the settled state.
    pub fn make_instructions(
        &self,
        variant: &mut CutVariant,
        plan: &PassPlan,
        out: &mut dyn CutList,
    ) -> Result<(), MotionError> {
        self.settle_optimize(variant);
        self.emit_variant(variant, plan, 0.0, out)
    }

    fn settle_optimize(&self, variant: &mut CutVariant) {
        variant.disable_infeasible_optimize(self.curve);
        match &mut variant.kind {
            VariantKind::OffsetCut(p) => self.settle_optimize(&mut p.child),
            VariantKind::OffsetGroup(p) => {
                for child in &mut p.children {
                    self.settle_optimize(child);
                }
            }
            VariantKind::SpiralIndex(p)
            | VariantKind::SpiralRosette(p)
            | VariantKind::SpiralLine(p) => self.settle_optimize(&mut p.begin),
            _ => {}
        }
    }

    fn emit_variant(
        &self,
        variant: &CutVariant,
        plan: &PassPlan,
        angle_offset: f64,
        out: &mut dyn CutList,
    ) -> Result<(), MotionError> {
        match variant.tag() {
            VariantTag::GoTo => {
                let p = variant.position();
                out.go_to(Speed::Fast, p.x, p.z, angle_offset);
                Ok(())
            }
            VariantTag::Index | VariantTag::Pierce => {
                self.emit_indexed(variant, plan, angle_offset, out)
            }
            VariantTag::Rosette | VariantTag::Pattern | VariantTag::Line => {
                self.emit_swept(variant, plan, angle_offset, out)
            }
            VariantTag::OffsetCut | VariantTag::OffsetGroup => {
                self.emit_offset_group(variant, plan, angle_offset, out)
            }
            VariantTag::SpiralIndex | VariantTag::SpiralRosette | VariantTag::SpiralLine => {
                spiral::emit_instructions(self.curve, variant, plan, out)
            }
        }
    }

    // -- indexed cuts -------------------------------------------------------

    /// Discrete plunge cuts at indexed spindle angles: per angle a group of
    /// rapid-out, velocity/rpm in-strokes through the depth passes, and a
    /// rapid back out; then a trailing realignment rapid to angle 0.
    fn emit_indexed(
        &self,
        variant: &CutVariant,
        plan: &PassPlan,
        angle_offset: f64,
        out: &mut dyn CutList,
    ) -> Result<(), MotionError> {
        let dir = variant.move_vector(self.curve, 1.0);
        let start = variant.position() + dir.scaled(-plan.safe_offset);
        let rosette = variant
            .rosette()
            .ok_or(MotionError::NoCutPoints)?;
        let angles = index_angles(rosette);
        if angles.is_empty() {
            return Err(MotionError::NoCutPoints);
        }
        out.comment(&format!("index cut {}", variant.sequence()));

        let pierce = variant.tag() == VariantTag::Pierce;
        for angle in &angles {
            let c = angle + angle_offset;
            out.go_to(Speed::Fast, start.x, start.z, c);
            if pierce {
                let pos = variant.position_at(self.curve, *angle, variant.depth());
                out.go_to(Speed::Velocity, pos.x, pos.z, c);
            } else {
                let mut first = true;
                for pass in plan.passes(variant.depth()) {
                    let pos = variant.position_at(self.curve, *angle, pass.depth);
                    let speed = if first { Speed::Velocity } else { Speed::Rpm };
                    out.go_to(speed, pos.x, pos.z, c);
                    first = false;
                }
            }
            out.go_to(Speed::Fast, start.x, start.z, c);
        }
        // Realign the spindle for whatever follows.
        out.go_to(Speed::Fast, start.x, start.z, angle_offset);
        Ok(())
    }

    // -- swept cuts ---------------------------------------------------------

    fn emit_swept(
        &self,
        variant: &CutVariant,
        plan: &PassPlan,
        angle_offset: f64,
        out: &mut dyn CutList,
    ) -> Result<(), MotionError> {
        let dir = variant.move_vector(self.curve, 1.0);
        let start = variant.position() + dir.scaled(-plan.safe_offset);
        let target = variant.depth();
        let p_to_p = variant.kind().sweep_p_to_p();
        let degenerate = variant.kind().sweep_degenerate();
        let axis_restricted = variant.is_axis_restricted(self.curve);

        out.comment(&format!("swept cut {}", variant.sequence()));
        out.go_to(Speed::Fast, start.x, start.z, angle_offset);

        let passes = plan.passes(target);
        let mut last_pass = None;
        for pass in &passes {
            let shortcut = degenerate
                || (axis_restricted && pass.depth <= target - p_to_p - plan.safe_offset);
            if shortcut {
                let pos = variant.position() + dir.scaled(pass.depth);
                out.go_to(Speed::Velocity, pos.x, pos.z, angle_offset);
                let degrees = if plan.reversed(pass) { -360.0 } else { 360.0 };
                out.turn(degrees);
            } else {
                self.sweep_pass(variant, plan, pass, axis_restricted, angle_offset, out);
            }
            out.spindle_wrap_check();
            last_pass = Some(*pass);
        }

        if let (Some(lift), Some(pass)) = (plan.soft_lift, last_pass) {
            if !degenerate {
                self.soft_lift(variant, plan, &pass, lift.degrees, angle_offset, out);
            }
        }

        out.go_to(Speed::Fast, start.x, start.z, angle_offset);
        Ok(())
    }

    /// One angle-swept pass with air avoidance.
    fn sweep_pass(
        &self,
        variant: &CutVariant,
        plan: &PassPlan,
        pass: &Pass,
        axis_restricted: bool,
        angle_offset: f64,
        out: &mut dyn CutList,
    ) {
        let mut angles = self.sweep_angles(variant, plan, pass);
        if plan.reversed(pass) {
            angles.reverse();
        }

        let avoid_air = axis_restricted;
        let mut first = true;
        let mut in_air = false;
        let mut last_air: Option<(LathePoint, f64)> = None;

        for angle in angles {
            let pos = variant.position_at(self.curve, angle_check(angle), pass.depth);
            let c = angle + angle_offset;
            let airborne = avoid_air
                && pass.depth + AMPLITUDE_EPSILON
                    < variant.amplitude_required(angle_check(angle));
            if airborne {
                if !in_air {
                    // Entering air: rapid to the first airborne point.
                    out.go_to(Speed::Fast, pos.x, pos.z, c);
                    in_air = true;
                }
                last_air = Some((pos, c));
            } else {
                if in_air {
                    // Leaving air: rapid back to the last airborne point so
                    // re-entry into the material is clean.
                    if let Some((pos, c)) = last_air.take() {
                        out.go_to(Speed::Fast, pos.x, pos.z, c);
                    }
                    in_air = false;
                    first = true;
                }
                let speed = if first { Speed::Velocity } else { Speed::Rpm };
                out.go_to(speed, pos.x, pos.z, c);
                first = false;
            }
        }
    }

    /// The machine angles sampled over one pass, ascending, spanning
    /// exactly 0..steps_per_rev.
    fn sweep_angles(&self, variant: &CutVariant, plan: &PassPlan, pass: &Pass) -> Vec<f64> {
        if let Some(rosette) = variant.rosette() {
            if let Some(fractions) = rosette.line_segments() {
                let mut angles = straight_pattern_angles(rosette, &fractions, plan.steps_per_rev);
                if variant.tag() == VariantTag::Rosette {
                    collapse_flat_middles(&mut angles, |a| {
                        variant.amplitude_required(angle_check(a))
                    });
                }
                return angles;
            }
        }
        uniform_angles(plan.steps_per_rev, pass.step)
    }

    /// Continue the sweep over a short window while lifting linearly from
    /// the final depth out to the safety clearance.
    fn soft_lift(
        &self,
        variant: &CutVariant,
        plan: &PassPlan,
        pass: &Pass,
        window: f64,
        angle_offset: f64,
        out: &mut dyn CutList,
    ) {
        if window <= 0.0 || pass.step <= 0.0 {
            return;
        }
        let reversed = plan.reversed(pass);
        let (end, sign) = if reversed {
            (0.0, -1.0)
        } else {
            (plan.steps_per_rev, 1.0)
        };
        let steps = (window / pass.step).ceil().max(1.0) as u32;
        for i in 1..=steps {
            let swept = (i as f64 * pass.step).min(window);
            let t = swept / window;
            let depth = pass.depth * (1.0 - t) - plan.safe_offset * t;
            let angle = end + sign * swept;
            let pos = variant.position_at(self.curve, angle_check(angle), depth);
            out.go_to(Speed::Rpm, pos.x, pos.z, angle + angle_offset);
        }
        out.spindle_wrap_check();
    }

    // -- offset repeats -----------------------------------------------------

    /// The outer loop for offset cuts and groups: run the child synthesis
    /// once per repeat, rotating the frame of reference by `360/repeat`
    /// (plus the index-wheel phase) each iteration, and restore the frame
    /// at the end.
    fn emit_offset_group(
        &self,
        variant: &CutVariant,
        plan: &PassPlan,
        angle_offset: f64,
        out: &mut dyn CutList,
    ) -> Result<(), MotionError> {
        let (repeat, phase, scale, children): (u32, f64, f64, Vec<&CutVariant>) =
            match variant.kind() {
                VariantKind::OffsetCut(p) => (
                    p.repeat,
                    p.wheel().offset_degrees(p.index_offset),
                    p.offset_scale,
                    vec![&p.child],
                ),
                VariantKind::OffsetGroup(p) => (
                    p.repeat,
                    p.wheel().offset_degrees(p.index_offset),
                    p.offset_scale,
                    p.children.iter().collect(),
                ),
                _ => return Err(MotionError::NoCutPoints),
            };
        if children.is_empty() {
            return Err(MotionError::NoCutPoints);
        }

        // Child motion is re-expressed about the group origin: XZ
        // displacement from the origin is multiplied by the offset scale.
        let mut sink = ScaledSink::new(out, variant.position(), scale);
        let span = 360.0 / repeat as f64;
        for i in 0..repeat {
            let frame = angle_offset + phase + i as f64 * span;
            for child in &children {
                self.emit_variant(child, plan, frame, &mut sink)?;
            }
        }
        // Restore the frame of reference.
        sink.spindle_wrap_check();
        if let Some(child) = children.first() {
            let dir = child.move_vector(self.curve, 1.0);
            let home = child.position() + dir.scaled(-plan.safe_offset);
            sink.go_to(Speed::Fast, home.x, home.z, angle_offset);
        }
        Ok(())
    }
}

/// Sink adapter scaling point moves about a secondary origin.
struct ScaledSink<'a> {
    inner: &'a mut dyn CutList,
    origin: LathePoint,
    scale: f64,
}

impl<'a> ScaledSink<'a> {
    fn new(inner: &'a mut dyn CutList, origin: LathePoint, scale: f64) -> Self {
        Self {
            inner,
            origin,
            scale,
        }
    }
}

impl CutList for ScaledSink<'_> {
    fn go_to(&mut self, speed: Speed, x: f64, z: f64, c: f64) {
        if self.scale == 1.0 {
            self.inner.go_to(speed, x, z, c);
            return;
        }
        self.inner.go_to(
            speed,
            self.origin.x + (x - self.origin.x) * self.scale,
            self.origin.z + (z - self.origin.z) * self.scale,
            c,
        );
    }

    fn turn(&mut self, degrees: f64) {
        self.inner.turn(degrees);
    }

    fn comment(&mut self, text: &str) {
        self.inner.comment(text);
    }

    fn spindle_wrap_check(&mut self) {
        self.inner.spindle_wrap_check();
    }
}

/// Machine angles of the index positions, ascending, masked repeats
/// skipped.
fn index_angles(rosette: &RosetteSource) -> Vec<f64> {
    let repeat = rosette.repeat().max(1);
    let span = 360.0 / repeat as f64;
    let shift = rosette.phase() / repeat as f64;
    let mut angles: Vec<f64> = (0..repeat)
        .filter(|i| !rosette.is_repeat_masked(*i))
        .map(|i| angle_check(i as f64 * span - shift))
        .collect();
    angles.sort_by(f64::total_cmp);
    angles
}

/// Uniform sweep angles, with a closing point at exactly the full span when
/// the step does not divide it evenly.
fn uniform_angles(span: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 {
        return vec![0.0, span];
    }
    let mut angles = Vec::new();
    let mut a = 0.0;
    while a < span - ANGLE_EPSILON {
        angles.push(a);
        a += step;
    }
    angles.push(span);
    angles
}

/// Waypoints of a piecewise-linear pattern: the breakpoints of every
/// repeat, phased into machine angles, deduplicated, spanning 0..span.
fn straight_pattern_angles(rosette: &RosetteSource, fractions: &[f64], span: f64) -> Vec<f64> {
    let repeat = rosette.repeat().max(1);
    let repeat_span = 360.0 / repeat as f64;
    let shift = rosette.phase() / repeat as f64;

    let mut angles: Vec<f64> = Vec::with_capacity(fractions.len() * repeat as usize + 2);
    for rep in 0..repeat {
        for fraction in fractions {
            angles.push(angle_check(
                (rep as f64 + fraction) * repeat_span - shift,
            ));
        }
    }
    angles.sort_by(f64::total_cmp);
    angles.dedup_by(|a, b| (*a - *b).abs() < ANGLE_EPSILON);

    if angles.first().map(|a| *a > ANGLE_EPSILON).unwrap_or(true) {
        angles.insert(0, 0.0);
    }
    angles.push(span);
    angles
}

/// Drop middle waypoints whose amplitude is flat against both neighbors.
fn collapse_flat_middles(angles: &mut Vec<f64>, amplitude: impl Fn(f64) -> f64) {
    let mut i = 1;
    while i + 1 < angles.len() {
        let a = amplitude(angles[i - 1]);
        let b = amplitude(angles[i]);
        let c = amplitude(angles[i + 1]);
        if (a - b).abs() < AMPLITUDE_EPSILON && (c - b).abs() < AMPLITUDE_EPSILON {
            angles.remove(i);
        } else {
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cutlist::{InstructionList, MotionCommand};
    use crate::curve::PolylineCurve;
    use crate::cutter::{Cutter, CutterFrame, CutterLocation};
    use crate::variant::{
        IndexPayload, OffsetPayload, RosetteMotion, RosettePayload, VariantBase, VariantKind,
    };
    use crate::CutDirection;
    use rosework_rosette::{FlatPattern, SimpleRosette, SinePattern, TrianglePattern};
    use std::sync::Arc;

    fn cutter() -> Arc<Cutter> {
        Arc::new(Cutter::new(
            "UCF",
            0.25,
            0.02,
            CutterFrame::Ucf,
            CutterLocation::FrontOutside,
        ))
    }

    fn curve() -> PolylineCurve {
        PolylineCurve::vertical(1.0, -1.0, 1.0, 8)
    }

    fn rock_variant(rosette: SimpleRosette, depth: f64) -> CutVariant {
        CutVariant::new(
            VariantBase::new(LathePoint::new(1.0, 0.0), cutter(), depth),
            VariantKind::Rosette(RosettePayload {
                motion: RosetteMotion::Rock,
                rosette: rosette.into(),
                rosette2: None,
            }),
        )
    }

    #[test]
    fn test_degenerate_rosette_is_one_full_turn_per_pass() {
        let curve = curve();
        let rosette = SimpleRosette::with_amplitude(Arc::new(SinePattern), 0.0, 4);
        let mut variant = rock_variant(rosette, 0.03);
        let plan = PassPlan {
            pass_depth: 0.02,
            last_depth: 0.01,
            ..Default::default()
        };
        let mut list = InstructionList::new();
        Synthesizer::new(&curve)
            .make_instructions(&mut variant, &plan, &mut list)
            .unwrap();

        let turns = list
            .commands()
            .iter()
            .filter(|c| matches!(c, MotionCommand::FullTurn { .. }))
            .count();
        // Two passes (0.02, 0.03), each a single full turn.
        assert_eq!(turns, 2);
        assert!(list.point_moves().all(|c| !matches!(c, MotionCommand::RpmTo { .. })));
    }

    #[test]
    fn test_swept_pass_starts_at_velocity_then_rpm() {
        let curve = curve();
        let rosette = SimpleRosette::with_amplitude(Arc::new(SinePattern), 0.02, 4);
        let mut variant = rock_variant(rosette, 0.1);
        let plan = PassPlan {
            pass_depth: 0.2,
            last_depth: 0.0,
            rotation: rosework_core::types::RotationPolicy::Forward,
            ..Default::default()
        };
        let mut list = InstructionList::new();
        Synthesizer::new(&curve)
            .make_instructions(&mut variant, &plan, &mut list)
            .unwrap();

        // Depth 0.1 exceeds every amplitude, so the pass has no air: one
        // velocity point, then rpm points through 360 degrees.
        let cuts: Vec<_> = list.commands().iter().filter(|c| c.is_cut()).collect();
        assert!(matches!(cuts[0], MotionCommand::VelocityTo { .. }));
        assert!(cuts[1..]
            .iter()
            .all(|c| matches!(c, MotionCommand::RpmTo { .. })));
        match cuts.last().unwrap() {
            MotionCommand::RpmTo { c, .. } => assert_eq!(*c, 360.0),
            other => panic!("unexpected closing command {other:?}"),
        }
    }

    #[test]
    fn test_air_avoidance_inserts_rapids() {
        let curve = curve();
        // Sine amplitude reaches 0.1; a 0.03 pass is airborne wherever
        // amplitude > 0.03.
        let rosette = SimpleRosette::with_amplitude(Arc::new(SinePattern), 0.1, 2);
        let mut variant = rock_variant(rosette, 0.03);
        let plan = PassPlan {
            pass_depth: 0.05,
            last_depth: 0.0,
            rotation: rosework_core::types::RotationPolicy::Forward,
            soft_lift: None,
            ..Default::default()
        };
        let mut list = InstructionList::new();
        Synthesizer::new(&curve)
            .make_instructions(&mut variant, &plan, &mut list)
            .unwrap();

        // No two consecutive synchronized moves may jump across an in-air
        // region: every angle gap wider than one step must be bridged by
        // rapids.
        let moves: Vec<_> = list.point_moves().collect();
        for pair in moves.windows(2) {
            let (c0, cut0) = match pair[0] {
                MotionCommand::RapidTo { c, .. } => (*c, false),
                MotionCommand::VelocityTo { c, .. } | MotionCommand::RpmTo { c, .. } => (*c, true),
                _ => unreachable!(),
            };
            let (c1, cut1) = match pair[1] {
                MotionCommand::RapidTo { c, .. } => (*c, false),
                MotionCommand::VelocityTo { c, .. } | MotionCommand::RpmTo { c, .. } => (*c, true),
                _ => unreachable!(),
            };
            if cut0 && cut1 {
                assert!(
                    (c1 - c0).abs() <= plan.last_step + 1e-9,
                    "synchronized jump from {c0} to {c1}"
                );
            }
        }
        // And there must actually be mid-sweep rapids.
        let mid_rapids = moves
            .iter()
            .filter(|m| matches!(m, MotionCommand::RapidTo { c, .. } if *c > 0.0 && *c < 360.0))
            .count();
        assert!(mid_rapids >= 2);
    }

    #[test]
    fn test_triangle_pattern_uses_breakpoints() {
        let curve = curve();
        let rosette = SimpleRosette::with_amplitude(Arc::new(TrianglePattern), 0.02, 4);
        let mut variant = rock_variant(rosette, 0.1);
        let plan = PassPlan {
            pass_depth: 0.2,
            last_depth: 0.0,
            rotation: rosework_core::types::RotationPolicy::Forward,
            ..Default::default()
        };
        let mut list = InstructionList::new();
        Synthesizer::new(&curve)
            .make_instructions(&mut variant, &plan, &mut list)
            .unwrap();

        // 4 repeats x 2 interior breakpoints + endpoints, far fewer than a
        // uniform 1-degree sweep.
        let cuts = list.commands().iter().filter(|c| c.is_cut()).count();
        assert!(cuts <= 16, "expected breakpoint waypoints, got {cuts}");
        let first = list.commands().iter().find(|c| c.is_cut()).unwrap();
        let last = list.commands().iter().filter(|c| c.is_cut()).last().unwrap();
        match (first, last) {
            (
                MotionCommand::VelocityTo { c: c0, .. },
                MotionCommand::RpmTo { c: c1, .. },
            ) => {
                assert_eq!(*c0, 0.0);
                assert_eq!(*c1, 360.0);
            }
            other => panic!("unexpected endpoints {other:?}"),
        }
    }

    #[test]
    fn test_index_end_to_end_groups() {
        let curve = curve();
        let rosette = SimpleRosette::with_amplitude(Arc::new(FlatPattern), 0.0, 4);
        let mut variant = CutVariant::new(
            VariantBase::new(LathePoint::new(1.0, 0.0), cutter(), 0.05),
            VariantKind::Index(IndexPayload {
                direction: CutDirection::LiteralX,
                rosette: rosette.into(),
            }),
        );
        let plan = PassPlan {
            pass_depth: 0.02,
            last_depth: 0.01,
            ..Default::default()
        };
        let mut list = InstructionList::new();
        Synthesizer::new(&curve)
            .make_instructions(&mut variant, &plan, &mut list)
            .unwrap();

        let moves: Vec<_> = list.point_moves().cloned().collect();
        // 4 groups of (rapid-out, velocity, rpm, rpm, rapid-out) plus the
        // trailing realignment rapid.
        assert_eq!(moves.len(), 4 * 5 + 1);
        for (g, angle) in [0.0, 90.0, 180.0, 270.0].iter().enumerate() {
            let group = &moves[g * 5..g * 5 + 5];
            assert!(
                matches!(&group[0], MotionCommand::RapidTo { c, .. } if c == angle),
                "group {g} does not open with a rapid at {angle}"
            );
            assert!(matches!(&group[1], MotionCommand::VelocityTo { c, .. } if c == angle));
            assert!(matches!(&group[2], MotionCommand::RpmTo { c, .. } if c == angle));
            assert!(matches!(&group[3], MotionCommand::RpmTo { c, .. } if c == angle));
            assert!(matches!(&group[4], MotionCommand::RapidTo { c, .. } if c == angle));
        }
        // Trailing realignment rapid at the safety offset, angle 0.
        match moves.last().unwrap() {
            MotionCommand::RapidTo { x, z, c } => {
                assert_eq!(*c, 0.0);
                assert!((x - 1.05).abs() < 1e-9);
                assert!(z.abs() < 1e-9);
            }
            other => panic!("expected trailing rapid, got {other:?}"),
        }
        // In-strokes descend through the pass depths 0.02, 0.04, 0.05.
        match (&moves[1], &moves[2], &moves[3]) {
            (
                MotionCommand::VelocityTo { x: x0, .. },
                MotionCommand::RpmTo { x: x1, .. },
                MotionCommand::RpmTo { x: x2, .. },
            ) => {
                assert!((x0 - 0.98).abs() < 1e-9);
                assert!((x1 - 0.96).abs() < 1e-9);
                assert!((x2 - 0.95).abs() < 1e-9);
            }
            other => panic!("unexpected in-strokes {other:?}"),
        }
    }

    #[test]
    fn test_masked_index_repeats_are_skipped() {
        let curve = curve();
        let mut rosette = SimpleRosette::with_amplitude(Arc::new(FlatPattern), 0.0, 4);
        // '0' skips a repeat: indices 1 and 3 are masked out.
        rosette.set_mask(Some("10".to_string()));
        let mut variant = CutVariant::new(
            VariantBase::new(LathePoint::new(1.0, 0.0), cutter(), 0.05),
            VariantKind::Index(IndexPayload {
                direction: CutDirection::LiteralX,
                rosette: rosette.into(),
            }),
        );
        let mut list = InstructionList::new();
        Synthesizer::new(&curve)
            .make_instructions(&mut variant, &PassPlan::default(), &mut list)
            .unwrap();

        let velocities: Vec<f64> = list
            .commands()
            .iter()
            .filter_map(|c| match c {
                MotionCommand::VelocityTo { c, .. } => Some(*c),
                _ => None,
            })
            .collect();
        assert_eq!(velocities, vec![0.0, 180.0]);
    }

    #[test]
    fn test_offset_scale_magnifies_child_displacement() {
        let curve = curve();
        let rosette = SimpleRosette::with_amplitude(Arc::new(SinePattern), 0.02, 4);
        let child = rock_variant(rosette, 0.05);
        let mut group = CutVariant::new(
            VariantBase::new(LathePoint::new(1.0, 0.0), cutter(), 0.05),
            VariantKind::OffsetCut(OffsetPayload::new(child, 1)),
        );
        let plan = PassPlan {
            pass_depth: 0.2,
            last_depth: 0.0,
            rotation: rosework_core::types::RotationPolicy::Forward,
            soft_lift: None,
            ..Default::default()
        };

        let mut unit = InstructionList::new();
        let mut unscaled = group.duplicate();
        Synthesizer::new(&curve)
            .make_instructions(&mut unscaled, &plan, &mut unit)
            .unwrap();

        assert!(group.set_offset_scale(2.0));
        let mut doubled = InstructionList::new();
        Synthesizer::new(&curve)
            .make_instructions(&mut group, &plan, &mut doubled)
            .unwrap();

        assert_ne!(
            unit.commands(),
            doubled.commands(),
            "offset scale must change the emitted motion"
        );
        // The child's approach rapid sits 0.05 off the origin at scale 1,
        // 0.10 at scale 2.
        match (
            unit.point_moves().next().unwrap(),
            doubled.point_moves().next().unwrap(),
        ) {
            (MotionCommand::RapidTo { x: x1, .. }, MotionCommand::RapidTo { x: x2, .. }) => {
                assert!((x1 - 1.05).abs() < 1e-9);
                assert!((x2 - 1.10).abs() < 1e-9);
            }
            other => panic!("unexpected opening moves {other:?}"),
        };
    }

    #[test]
    fn test_uniform_angles_closing_point() {
        let angles = uniform_angles(360.0, 7.0);
        assert_eq!(*angles.last().unwrap(), 360.0);
        let prior = angles[angles.len() - 2];
        assert!(360.0 - prior < 7.0);
    }

    #[test]
    fn test_collapse_flat_middles() {
        let mut angles = vec![0.0, 10.0, 20.0, 30.0];
        collapse_flat_middles(&mut angles, |a| if a < 25.0 { 1.0 } else { 2.0 });
        // 10 is flat between 0 and 20; 20 borders a change and stays.
        assert_eq!(angles, vec![0.0, 20.0, 30.0]);
    }
}
