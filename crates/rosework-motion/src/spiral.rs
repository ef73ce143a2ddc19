//! Spiral/twist generation.
//!
//! Maps a begin/end pair of cut points along the outline into a
//! continuously varying parameter set (depth, phase, position), consumed
//! either as discrete point variants or as direct motion commands.

use rosework_core::cancel::CancelToken;
use rosework_core::event_bus::{event_bus, CamEvent, NoticeEvent};
use rosework_core::types::{angle_check, LathePoint};

use crate::cutlist::{CutList, Speed};
use crate::curve::{CurveSide, OutlineCurve, PolylineCurve};
use crate::cutter::CutterFrame;
use crate::error::MotionError;
use crate::passes::PassPlan;
use crate::synth::Synthesizer;
use crate::variant::{CutVariant, SpiralPayload, Twist, TwistStyle};

/// Resample spacing used when re-projecting onto the cutter's path curve.
const FINE_SPACING: f64 = 0.005;

/// One sample of a twisted cut: where the surface point sits and how far
/// the spindle has wound to reach it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwistSample {
    /// Radial position of the surface point.
    pub radius: f64,
    /// Axial position of the surface point.
    pub axial: f64,
    /// Cumulative spindle rotation at this point, degrees.
    pub angle_accum: f64,
}

impl TwistSample {
    fn point(&self) -> LathePoint {
        LathePoint::new(self.radius, self.axial)
    }

    /// The sample in revolved 3D coordinates.
    fn spatial(&self) -> [f64; 3] {
        let theta = self.angle_accum.to_radians();
        [
            self.radius * theta.cos(),
            self.radius * theta.sin(),
            self.axial,
        ]
    }
}

/// Total 3D arc length over a twist sampling.
pub fn arc_length(samples: &[TwistSample]) -> f64 {
    samples
        .windows(2)
        .map(|pair| {
            let a = pair[0].spatial();
            let b = pair[1].spatial();
            ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
        })
        .sum()
}

fn twist_fraction(twist: &Twist, t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    match twist.style {
        TwistStyle::Uniform => t,
        TwistStyle::Accelerate => t * t,
        TwistStyle::Sine => {
            let ripple = twist.amplitude.clamp(0.0, 1.0);
            t - ripple * (std::f64::consts::TAU * t).sin() / std::f64::consts::TAU
        }
    }
}

/// Sample the outline between two points and wind the twist along it.
///
/// The rotation at each sample follows the twist style over the cumulative
/// planar arc fraction.
pub fn surface_twist(
    curve: &dyn OutlineCurve,
    begin: LathePoint,
    end: LathePoint,
    twist: &Twist,
) -> Vec<TwistSample> {
    let points = curve.subset_points(begin, end);
    if points.is_empty() {
        return Vec::new();
    }

    let mut planar = vec![0.0];
    for pair in points.windows(2) {
        planar.push(planar.last().unwrap() + pair[0].distance_to(&pair[1]));
    }
    let total = *planar.last().unwrap();

    points
        .iter()
        .zip(planar.iter())
        .map(|(p, s)| {
            let t = if total > 0.0 { s / total } else { 0.0 };
            TwistSample {
                radius: p.x,
                axial: p.z,
                angle_accum: twist.total_rotation * twist_fraction(twist, t),
            }
        })
        .collect()
}

/// Re-project surface samples onto the cutter's own path curve.
///
/// Each sample keeps its accumulated rotation but moves to the nearest
/// point of the finely resampled path. Identity when the cutter's path
/// lies on the surface itself.
pub fn cutter_twist(samples: &[TwistSample], path: &PolylineCurve) -> Vec<TwistSample> {
    samples
        .iter()
        .map(|s| {
            let q = crate::curve::OutlineCurve::nearest_point(path, s.point());
            TwistSample {
                radius: q.x,
                axial: q.z,
                angle_accum: s.angle_accum,
            }
        })
        .collect()
}

struct SpiralFrame<'a> {
    payload: &'a SpiralPayload,
    samples: Vec<TwistSample>,
    cumulative: Vec<f64>,
    total: f64,
}

fn build_frame<'a>(
    curve: &dyn OutlineCurve,
    variant: &'a CutVariant,
) -> Result<Option<SpiralFrame<'a>>, MotionError> {
    let payload = variant.spiral().ok_or(MotionError::NoCutPoints)?;
    let begin_pt = curve.nearest_point(payload.begin.position());
    let end_pt = curve.nearest_point(payload.end_position);
    let surface = surface_twist(curve, begin_pt, end_pt, &payload.twist);
    let total = arc_length(&surface);
    if total <= 0.0 {
        event_bus()
            .publish(CamEvent::Notice(NoticeEvent::SpiralDegenerate {
                entity: variant.id(),
            }))
            .ok();
        return Ok(None);
    }
    let samples = match payload.begin.cutter().frame {
        // These frames track the surface directly.
        CutterFrame::Hcf | CutterFrame::Ucf | CutterFrame::Fixed => surface,
        // Offset path: re-project onto the cutter's own curve.
        CutterFrame::Ecf | CutterFrame::Drill => {
            let path = PolylineCurve::new(curve.resample(FINE_SPACING));
            cutter_twist(&surface, &path)
        }
    };
    let mut cumulative = vec![0.0];
    for pair in samples.windows(2) {
        cumulative.push(cumulative.last().unwrap() + arc_length(pair));
    }
    // Re-projection can shrink the path; interpolate over what is cut.
    let total = cumulative.last().copied().unwrap_or(0.0).max(f64::MIN_POSITIVE);
    Ok(Some(SpiralFrame {
        payload,
        samples,
        cumulative,
        total,
    }))
}

impl SpiralFrame<'_> {
    /// Depth-interpolation fraction at sample `i`: proportional to
    /// cumulative arc length, or to the radius ratio when the spiral runs
    /// into a degenerate end radius.
    fn depth_fraction(&self, i: usize) -> f64 {
        let first = &self.samples[0];
        let last = &self.samples[self.samples.len() - 1];
        let radius_drop = first.radius - last.radius;
        if last.radius.abs() < 1e-9 && radius_drop.abs() > 1e-9 {
            return ((first.radius - self.samples[i].radius) / radius_drop).clamp(0.0, 1.0);
        }
        (self.cumulative[i] / self.total).clamp(0.0, 1.0)
    }

    fn depth_at(&self, i: usize) -> f64 {
        let begin = self.payload.begin.depth();
        begin + (self.payload.end_depth - begin) * self.depth_fraction(i)
    }
}

/// Break a spiral into concrete point variants, one per sample.
///
/// Depth interpolates with cumulative arc length, phase with accumulated
/// rotation times the repeat. Cancellation is checked per sample and
/// yields the points emitted so far.
pub fn discretize(
    curve: &dyn OutlineCurve,
    variant: &CutVariant,
    cancel: &CancelToken,
) -> Result<Vec<CutVariant>, MotionError> {
    let Some(frame) = build_frame(curve, variant)? else {
        // Zero-length spiral: the whole variant is its plain begin point.
        let payload = variant.spiral().ok_or(MotionError::NoCutPoints)?;
        return Ok(vec![payload.begin.duplicate()]);
    };

    let begin = &frame.payload.begin;
    let repeat = begin.rosette().map(|r| r.repeat()).unwrap_or(1).max(1);
    let phase0 = begin.rosette().map(|r| r.phase()).unwrap_or(0.0);

    let mut points = Vec::with_capacity(frame.samples.len());
    for (i, sample) in frame.samples.iter().enumerate() {
        if cancel.is_cancelled() {
            event_bus()
                .publish(CamEvent::Notice(NoticeEvent::OperationCancelled {
                    operation: "spiral discretization".to_string(),
                }))
                .ok();
            break;
        }
        let mut point = begin.duplicate();
        point.set_position(sample.point());
        point.set_depth(frame.depth_at(i));
        if let Some(rosette) = point.rosette_mut() {
            if let Some(simple) = rosette.as_simple_mut() {
                simple.set_phase(phase0 + sample.angle_accum * repeat as f64);
            }
        }
        points.push(point);
    }
    Ok(points)
}

/// Stream a spiral straight into motion commands.
///
/// Per repeat: rapid to the begin point at the safety offset, cut along
/// every sample deducting the locally interpolated depth along the curve
/// perpendicular, pull out, then rapid along the declared waypoints back
/// toward the start (skipped on the final repeat).
pub fn emit_instructions(
    curve: &dyn OutlineCurve,
    variant: &CutVariant,
    plan: &PassPlan,
    out: &mut dyn CutList,
) -> Result<(), MotionError> {
    let Some(frame) = build_frame(curve, variant)? else {
        let payload = variant.spiral().ok_or(MotionError::NoCutPoints)?;
        let mut begin = payload.begin.duplicate();
        return Synthesizer::new(curve).make_instructions(&mut begin, plan, out);
    };

    let begin = &frame.payload.begin;
    let rosette = begin.rosette();
    let repeat = rosette.map(|r| r.repeat()).unwrap_or(1).max(1);
    let span = 360.0 / repeat as f64;
    let side = if begin.cutter().location.is_inside() {
        CurveSide::Inside
    } else {
        CurveSide::Outside
    };
    let inward_at = |p: LathePoint| -> LathePoint {
        (-curve.perpendicular(p, side).unwrap_or_default()).snapped()
    };

    out.comment(&format!("spiral cut {}", variant.sequence()));
    for rep in 0..repeat {
        if rosette.map(|r| r.is_repeat_masked(rep)).unwrap_or(false) {
            continue;
        }
        let offset = rep as f64 * span;

        let first = &frame.samples[0];
        let inward = inward_at(first.point());
        let approach = first.point() + inward.scaled(-plan.safe_offset);
        out.go_to(Speed::Fast, approach.x, approach.z, offset);

        let mut last_pos = approach;
        let mut last_c = offset;
        for (i, sample) in frame.samples.iter().enumerate() {
            let c = offset + sample.angle_accum;
            let depth = frame.depth_at(i);
            let amp = variant.amplitude_required(angle_check(c));
            let inward = inward_at(sample.point());
            let pos = sample.point() + inward.scaled(depth - amp);
            let speed = if i == 0 { Speed::Velocity } else { Speed::Rpm };
            out.go_to(speed, pos.x, pos.z, c);
            last_pos = sample.point() + inward.scaled(-plan.safe_offset);
            last_c = c;
        }
        // Pull out at the safety offset.
        out.go_to(Speed::Fast, last_pos.x, last_pos.z, last_c);

        if rep + 1 < repeat {
            for wp in &frame.payload.waypoints {
                out.go_to(Speed::Fast, wp.x, wp.z, last_c);
            }
        }
        out.spindle_wrap_check();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cutlist::{InstructionList, MotionCommand};
    use crate::cutter::{Cutter, CutterLocation};
    use crate::variant::{
        RosetteMotion, RosettePayload, VariantBase, VariantKind,
    };
    use rosework_rosette::{SimpleRosette, SinePattern};
    use std::sync::Arc;

    fn curve() -> PolylineCurve {
        PolylineCurve::vertical(1.0, 0.0, 2.0, 20)
    }

    fn spiral_rosette(begin_depth: f64, end_depth: f64, rotation: f64) -> CutVariant {
        let cutter = Arc::new(Cutter::new(
            "UCF",
            0.25,
            0.02,
            CutterFrame::Ucf,
            CutterLocation::FrontOutside,
        ));
        let begin = CutVariant::new(
            VariantBase::new(LathePoint::new(1.0, 0.2), cutter, begin_depth),
            VariantKind::Rosette(RosettePayload {
                motion: RosetteMotion::Rock,
                rosette: SimpleRosette::with_amplitude(Arc::new(SinePattern), 0.01, 6).into(),
                rosette2: None,
            }),
        );
        CutVariant::new(
            VariantBase::new(LathePoint::new(1.0, 0.2), begin.cutter().clone(), begin_depth),
            VariantKind::SpiralRosette(SpiralPayload {
                begin: Box::new(begin),
                end_position: LathePoint::new(1.0, 1.8),
                end_depth,
                twist: Twist {
                    total_rotation: rotation,
                    amplitude: 1.0,
                    style: TwistStyle::Uniform,
                },
                waypoints: Vec::new(),
            }),
        )
    }

    #[test]
    fn test_surface_twist_monotone_rotation() {
        let c = curve();
        let twist = Twist {
            total_rotation: 720.0,
            amplitude: 1.0,
            style: TwistStyle::Uniform,
        };
        let samples = surface_twist(
            &c,
            LathePoint::new(1.0, 0.2),
            LathePoint::new(1.0, 1.8),
            &twist,
        );
        assert!(samples.len() >= 2);
        assert_eq!(samples[0].angle_accum, 0.0);
        assert!((samples.last().unwrap().angle_accum - 720.0).abs() < 1e-9);
        for pair in samples.windows(2) {
            assert!(pair[1].angle_accum >= pair[0].angle_accum);
        }
    }

    #[test]
    fn test_discretize_round_trips_depth_and_phase() {
        let c = curve();
        let variant = spiral_rosette(0.02, 0.06, 540.0);
        let cancel = CancelToken::new();
        let points = discretize(&c, &variant, &cancel).unwrap();
        assert!(points.len() >= 2);

        let first = points.first().unwrap();
        let last = points.last().unwrap();
        assert!((first.depth() - 0.02).abs() < 1e-6);
        assert!((last.depth() - 0.06).abs() < 1e-6);

        let phase0 = first.rosette().unwrap().phase();
        let phase1 = last.rosette().unwrap().phase();
        assert!(phase0.abs() < 1e-6);
        // 540 degrees of rotation at repeat 6.
        assert!((phase1 - 540.0 * 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_length_spiral_falls_back_to_begin_point() {
        let c = curve();
        let mut variant = spiral_rosette(0.02, 0.06, 360.0);
        // Collapse the spiral onto its begin point.
        if let VariantKind::SpiralRosette(p) = &mut variant.kind {
            p.end_position = LathePoint::new(1.0, 0.2);
        }
        let cancel = CancelToken::new();
        let points = discretize(&c, &variant, &cancel).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].depth(), 0.02);
        assert_eq!(points[0].tag(), crate::variant::VariantTag::Rosette);
    }

    #[test]
    fn test_cancel_returns_partial_points() {
        let c = curve();
        let variant = spiral_rosette(0.02, 0.06, 360.0);
        let cancel = CancelToken::new();
        cancel.cancel();
        let points = discretize(&c, &variant, &cancel).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn test_emit_cuts_every_sample_per_repeat() {
        let c = curve();
        let variant = spiral_rosette(0.02, 0.06, 360.0);
        let mut list = InstructionList::new();
        emit_instructions(&c, &variant, &PassPlan::default(), &mut list).unwrap();

        let velocities = list
            .commands()
            .iter()
            .filter(|m| matches!(m, MotionCommand::VelocityTo { .. }))
            .count();
        // One cut entry per repeat of the begin rosette.
        assert_eq!(velocities, 6);
        // Commands are strictly ordered by (repeat, angle).
        let mut last = f64::NEG_INFINITY;
        for m in list.commands() {
            if let MotionCommand::VelocityTo { c, .. } = m {
                assert!(*c > last);
                last = *c;
            }
        }
    }

    #[test]
    fn test_cutter_twist_projects_onto_path() {
        let path = PolylineCurve::vertical(0.9, 0.0, 2.0, 10);
        let samples = vec![
            TwistSample {
                radius: 1.0,
                axial: 0.5,
                angle_accum: 0.0,
            },
            TwistSample {
                radius: 1.0,
                axial: 1.5,
                angle_accum: 180.0,
            },
        ];
        let projected = cutter_twist(&samples, &path);
        assert!((projected[0].radius - 0.9).abs() < 1e-12);
        assert_eq!(projected[0].axial, 0.5);
        assert_eq!(projected[1].angle_accum, 180.0);
    }
}
