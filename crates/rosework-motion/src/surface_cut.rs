//! Surface-cut choreography.
//!
//! Replays a variant's cut against the external rotating-surface model:
//! incremental Z rotations between successive sample angles, one cut call
//! per sample, repeats sequenced in the same angular order toolpath
//! synthesis uses. Cancellation is cooperative, checked per cut point and
//! per repeat, and the surface is always left on a whole-revolution
//! boundary.

use rosework_core::cancel::CancelToken;
use rosework_core::event_bus::{event_bus, CamEvent, NoticeEvent};
use rosework_core::types::{angle_check, LathePoint};

use crate::curve::OutlineCurve;
use crate::error::MotionError;
use crate::spiral;
use crate::surface::RotatingSurface;
use crate::variant::{CutVariant, Twist, VariantKind, VariantTag};

/// Result of a surface-cut run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutOutcome {
    /// Every repeat was cut.
    Completed {
        /// Number of repeats cut.
        repeats: u32,
    },
    /// The run was cancelled partway through.
    Cancelled {
        /// Repeats fully cut before cancellation.
        completed_repeats: u32,
    },
}

/// XZ transform re-expressing child motion about an offset origin:
/// `p -> p * scale + offset`. Scale-about-origin transforms compose into
/// the same form, so nested offset groups stack.
#[derive(Debug, Clone, Copy)]
struct FrameTransform {
    scale: f64,
    offset: LathePoint,
}

impl FrameTransform {
    fn identity() -> Self {
        Self {
            scale: 1.0,
            offset: LathePoint::origin(),
        }
    }

    /// Scaling of displacement about a fixed origin point.
    fn scaled_about(origin: LathePoint, scale: f64) -> Self {
        Self {
            scale,
            offset: origin.scaled(1.0 - scale),
        }
    }

    /// Apply `inner` first, then `outer`.
    fn compose(outer: Self, inner: Self) -> Self {
        Self {
            scale: outer.scale * inner.scale,
            offset: inner.offset.scaled(outer.scale) + outer.offset,
        }
    }

    fn apply(&self, p: LathePoint) -> LathePoint {
        if self.scale == 1.0 && self.offset == LathePoint::origin() {
            return p;
        }
        p.scaled(self.scale) + self.offset
    }
}

/// Tracks the surface's accumulated Z rotation so only deltas are issued,
/// and so the frame can be restored to a revolution boundary afterwards.
struct Turntable<'s> {
    surface: &'s mut dyn RotatingSurface,
    current: f64,
}

impl<'s> Turntable<'s> {
    fn new(surface: &'s mut dyn RotatingSurface) -> Self {
        Self {
            surface,
            current: 0.0,
        }
    }

    fn rotate_to(&mut self, angle: f64) {
        let delta = angle - self.current;
        if delta != 0.0 {
            self.surface.rotate_z(delta);
            self.current = angle;
        }
    }

    /// Rotate forward to the next whole revolution, leaving net rotation a
    /// multiple of 360.
    fn restore(&mut self) {
        let residue = angle_check(self.current);
        if residue != 0.0 {
            self.surface.rotate_z(360.0 - residue);
            self.current += 360.0 - residue;
        }
    }
}

/// Cuts variants into a rotating-surface model.
pub struct SurfaceCutter<'a> {
    curve: &'a dyn OutlineCurve,
}

impl<'a> SurfaceCutter<'a> {
    /// Create a cutter over the given outline.
    pub fn new(curve: &'a dyn OutlineCurve) -> Self {
        Self { curve }
    }

    /// Cut one variant into the surface at its full target depth.
    pub fn cut_surface(
        &self,
        variant: &CutVariant,
        surface: &mut dyn RotatingSurface,
        cancel: &CancelToken,
    ) -> Result<CutOutcome, MotionError> {
        let mut table = Turntable::new(surface);
        let outcome =
            self.cut_variant(variant, &mut table, 0.0, FrameTransform::identity(), cancel)?;
        table.restore();
        if let CutOutcome::Cancelled { .. } = outcome {
            event_bus()
                .publish(CamEvent::Notice(NoticeEvent::OperationCancelled {
                    operation: "surface cut".to_string(),
                }))
                .ok();
        }
        Ok(outcome)
    }

    fn cut_variant(
        &self,
        variant: &CutVariant,
        table: &mut Turntable<'_>,
        frame: f64,
        xform: FrameTransform,
        cancel: &CancelToken,
    ) -> Result<CutOutcome, MotionError> {
        match variant.tag() {
            VariantTag::GoTo => Ok(CutOutcome::Completed { repeats: 0 }),
            VariantTag::Index | VariantTag::Pierce => {
                self.cut_indexed(variant, table, frame, xform, cancel)
            }
            VariantTag::Rosette | VariantTag::Pattern | VariantTag::Line => {
                self.cut_swept(variant, table, frame, xform, cancel)
            }
            VariantTag::OffsetCut | VariantTag::OffsetGroup => {
                self.cut_offset_group(variant, table, frame, xform, cancel)
            }
            VariantTag::SpiralIndex | VariantTag::SpiralRosette | VariantTag::SpiralLine => {
                self.cut_spiral(variant, table, frame, xform, cancel)
            }
        }
    }

    fn cut_swept(
        &self,
        variant: &CutVariant,
        table: &mut Turntable<'_>,
        frame: f64,
        xform: FrameTransform,
        cancel: &CancelToken,
    ) -> Result<CutOutcome, MotionError> {
        let sectors = table.surface.num_sectors().max(1);
        let step = 360.0 / sectors as f64;
        for i in 0..=sectors {
            if cancel.is_cancelled() {
                return Ok(CutOutcome::Cancelled {
                    completed_repeats: 0,
                });
            }
            let angle = (i as f64 * step).min(360.0);
            table.rotate_to(frame + angle);
            let pos =
                xform.apply(variant.position_at(self.curve, angle_check(angle), variant.depth()));
            table
                .surface
                .cut_surface(variant.cutter(), pos.x, pos.z);
        }
        Ok(CutOutcome::Completed { repeats: 1 })
    }

    fn cut_indexed(
        &self,
        variant: &CutVariant,
        table: &mut Turntable<'_>,
        frame: f64,
        xform: FrameTransform,
        cancel: &CancelToken,
    ) -> Result<CutOutcome, MotionError> {
        let rosette = variant.rosette().ok_or(MotionError::NoCutPoints)?;
        let repeat = rosette.repeat().max(1);
        let span = 360.0 / repeat as f64;
        let shift = rosette.phase() / repeat as f64;

        let mut done = 0;
        for i in 0..repeat {
            if cancel.is_cancelled() {
                return Ok(CutOutcome::Cancelled {
                    completed_repeats: done,
                });
            }
            if rosette.is_repeat_masked(i) {
                continue;
            }
            let angle = angle_check(i as f64 * span - shift);
            table.rotate_to(frame + angle);
            let pos = xform.apply(variant.position_at(self.curve, angle, variant.depth()));
            table
                .surface
                .cut_surface(variant.cutter(), pos.x, pos.z);
            done += 1;
        }
        Ok(CutOutcome::Completed { repeats: done })
    }

    fn cut_offset_group(
        &self,
        variant: &CutVariant,
        table: &mut Turntable<'_>,
        frame: f64,
        xform: FrameTransform,
        cancel: &CancelToken,
    ) -> Result<CutOutcome, MotionError> {
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

        // Child motion is re-expressed about the group origin, matching
        // toolpath synthesis.
        let child_xform = FrameTransform::compose(
            xform,
            FrameTransform::scaled_about(variant.position(), scale),
        );
        let span = 360.0 / repeat as f64;
        for i in 0..repeat {
            if cancel.is_cancelled() {
                return Ok(CutOutcome::Cancelled {
                    completed_repeats: i,
                });
            }
            let child_frame = frame + phase + i as f64 * span;
            for child in &children {
                let outcome = self.cut_variant(child, table, child_frame, child_xform, cancel)?;
                if let CutOutcome::Cancelled { .. } = outcome {
                    return Ok(CutOutcome::Cancelled {
                        completed_repeats: i,
                    });
                }
            }
        }
        Ok(CutOutcome::Completed { repeats: repeat })
    }

    fn cut_spiral(
        &self,
        variant: &CutVariant,
        table: &mut Turntable<'_>,
        frame: f64,
        xform: FrameTransform,
        cancel: &CancelToken,
    ) -> Result<CutOutcome, MotionError> {
        // The spiral's own discretization gives the cut points; each is a
        // plain variant cut at its interpolated depth and phase.
        let points = spiral::discretize(self.curve, variant, cancel)?;
        if points.is_empty() {
            return Ok(CutOutcome::Cancelled {
                completed_repeats: 0,
            });
        }
        let payload = variant.spiral().ok_or(MotionError::NoCutPoints)?;
        let Twist { total_rotation, .. } = payload.twist;
        let count = points.len();
        for (i, point) in points.iter().enumerate() {
            if cancel.is_cancelled() {
                return Ok(CutOutcome::Cancelled {
                    completed_repeats: 0,
                });
            }
            let angle = if count > 1 {
                total_rotation * i as f64 / (count - 1) as f64
            } else {
                0.0
            };
            table.rotate_to(frame + angle);
            let pos = xform.apply(point.position_at(self.curve, angle_check(angle), point.depth()));
            table.surface.cut_surface(point.cutter(), pos.x, pos.z);
        }
        Ok(CutOutcome::Completed { repeats: 1 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::PolylineCurve;
    use crate::cutter::{Cutter, CutterFrame, CutterLocation};
    use crate::surface::{RecordingSurface, SurfaceOp};
    use crate::variant::{
        CutDirection, IndexPayload, RosetteMotion, RosettePayload, VariantBase, VariantKind,
    };
    use rosework_core::types::LathePoint;
    use rosework_rosette::{FlatPattern, SimpleRosette, SinePattern};
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

    #[test]
    fn test_swept_cut_rotates_once_around() {
        let curve = curve();
        let variant = CutVariant::new(
            VariantBase::new(LathePoint::new(1.0, 0.0), cutter(), 0.05),
            VariantKind::Rosette(RosettePayload {
                motion: RosetteMotion::Rock,
                rosette: SimpleRosette::with_amplitude(Arc::new(SinePattern), 0.02, 4).into(),
                rosette2: None,
            }),
        );
        let mut surface = RecordingSurface::new(36);
        let outcome = SurfaceCutter::new(&curve)
            .cut_surface(&variant, &mut surface, &CancelToken::new())
            .unwrap();

        assert_eq!(outcome, CutOutcome::Completed { repeats: 1 });
        assert_eq!(surface.cut_count(), 37);
        // Net rotation lands on a whole revolution.
        assert!((surface.net_rotation() % 360.0).abs() < 1e-9);
    }

    #[test]
    fn test_indexed_cut_hits_each_position() {
        let curve = curve();
        let variant = CutVariant::new(
            VariantBase::new(LathePoint::new(1.0, 0.0), cutter(), 0.05),
            VariantKind::Index(IndexPayload {
                direction: CutDirection::LiteralX,
                rosette: SimpleRosette::with_amplitude(Arc::new(FlatPattern), 0.0, 4).into(),
            }),
        );
        let mut surface = RecordingSurface::new(36);
        let outcome = SurfaceCutter::new(&curve)
            .cut_surface(&variant, &mut surface, &CancelToken::new())
            .unwrap();

        assert_eq!(outcome, CutOutcome::Completed { repeats: 4 });
        assert_eq!(surface.cut_count(), 4);
        let rotations: Vec<f64> = surface
            .ops()
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::RotateZ(d) => Some(*d),
                _ => None,
            })
            .collect();
        // 90-degree steps between cuts, then the restoring rotation.
        assert_eq!(rotations, vec![90.0, 90.0, 90.0, 90.0]);
    }

    #[test]
    fn test_cancel_mid_run_reports_partial() {
        let curve = curve();
        let variant = CutVariant::new(
            VariantBase::new(LathePoint::new(1.0, 0.0), cutter(), 0.05),
            VariantKind::Rosette(RosettePayload {
                motion: RosetteMotion::Rock,
                rosette: SimpleRosette::with_amplitude(Arc::new(SinePattern), 0.02, 4).into(),
                rosette2: None,
            }),
        );
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut surface = RecordingSurface::new(36);
        let outcome = SurfaceCutter::new(&curve)
            .cut_surface(&variant, &mut surface, &cancel)
            .unwrap();

        assert_eq!(
            outcome,
            CutOutcome::Cancelled {
                completed_repeats: 0
            }
        );
        assert_eq!(surface.cut_count(), 0);
        assert!((surface.net_rotation() % 360.0).abs() < 1e-9);
    }

    #[test]
    fn test_offset_scale_moves_surface_cuts() {
        let curve = curve();
        let child = CutVariant::new(
            VariantBase::new(LathePoint::new(1.0, 0.0), cutter(), 0.04),
            VariantKind::Index(IndexPayload {
                direction: CutDirection::LiteralX,
                rosette: SimpleRosette::with_amplitude(Arc::new(FlatPattern), 0.0, 1).into(),
            }),
        );
        let mut group = CutVariant::new(
            VariantBase::new(LathePoint::new(1.0, 0.0), cutter(), 0.04),
            VariantKind::OffsetCut(crate::variant::OffsetPayload::new(child, 1)),
        );
        assert!(group.set_offset_scale(2.0));

        let mut surface = RecordingSurface::new(36);
        SurfaceCutter::new(&curve)
            .cut_surface(&group, &mut surface, &CancelToken::new())
            .unwrap();

        // One plunge to x = 1.0 - 0.04, doubled about the origin: 0.92.
        let cuts: Vec<(f64, f64)> = surface
            .ops()
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::Cut(x, z) => Some((*x, *z)),
                _ => None,
            })
            .collect();
        assert_eq!(cuts.len(), 1);
        assert!((cuts[0].0 - 0.92).abs() < 1e-9);
        assert!(cuts[0].1.abs() < 1e-9);
    }

    #[test]
    fn test_offset_group_sequences_repeats() {
        let curve = curve();
        let child = CutVariant::new(
            VariantBase::new(LathePoint::new(1.0, 0.0), cutter(), 0.03),
            VariantKind::Index(IndexPayload {
                direction: CutDirection::LiteralX,
                rosette: SimpleRosette::with_amplitude(Arc::new(FlatPattern), 0.0, 2).into(),
            }),
        );
        let mut group = CutVariant::new(
            VariantBase::new(LathePoint::new(1.0, 0.0), cutter(), 0.03),
            VariantKind::OffsetGroup(crate::variant::OffsetGroupPayload::new(3)),
        );
        group.group_add_child(child);

        let mut surface = RecordingSurface::new(36);
        let outcome = SurfaceCutter::new(&curve)
            .cut_surface(&group, &mut surface, &CancelToken::new())
            .unwrap();

        assert_eq!(outcome, CutOutcome::Completed { repeats: 3 });
        // 3 group repeats x 2 index positions.
        assert_eq!(surface.cut_count(), 6);
    }
}
