//! Rotating-surface simulator interface.
//!
//! The 3D mesh engine used for preview rendering is external; the motion
//! core only issues high-level rotate/offset/cut operations against it.
//! [`RecordingSurface`] captures the call sequence for tests.

use serde::{Deserialize, Serialize};

use crate::cutter::Cutter;

/// The rotating-surface model consumed by the surface-cut adapter.
pub trait RotatingSurface {
    /// Rotate the surface about the spindle (Z) axis.
    fn rotate_z(&mut self, degrees: f64);

    /// Rotate the surface about the Y axis (offset-cut frames).
    fn rotate_y(&mut self, degrees: f64);

    /// Translate the surface.
    fn offset(&mut self, dx: f64, dy: f64, dz: f64);

    /// Cut the surface with the cutter at the given lathe-plane position.
    fn cut_surface(&mut self, cutter: &Cutter, x: f64, z: f64);

    /// Cut with an explicit spindle angle (drill/ECF frames).
    fn cut_surface_at(&mut self, cutter: &Cutter, x: f64, z: f64, spindle: f64) {
        let _ = spindle;
        self.cut_surface(cutter, x, z);
    }

    /// Number of angular sectors in the surface mesh.
    fn num_sectors(&self) -> u32;
}

/// One recorded simulator call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SurfaceOp {
    /// A Z rotation.
    RotateZ(f64),
    /// A Y rotation.
    RotateY(f64),
    /// A translation.
    Offset(f64, f64, f64),
    /// A cut at (x, z).
    Cut(f64, f64),
}

/// A surface stub recording every operation, for tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    ops: Vec<SurfaceOp>,
    sectors: u32,
}

impl RecordingSurface {
    /// Create a recorder with the given sector count.
    pub fn new(sectors: u32) -> Self {
        Self {
            ops: Vec::new(),
            sectors: sectors.max(1),
        }
    }

    /// The recorded operations, in call order.
    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Net Z rotation accumulated over all recorded rotations.
    pub fn net_rotation(&self) -> f64 {
        self.ops
            .iter()
            .map(|op| match op {
                SurfaceOp::RotateZ(d) => *d,
                _ => 0.0,
            })
            .sum()
    }

    /// Number of cut calls recorded.
    pub fn cut_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, SurfaceOp::Cut(_, _)))
            .count()
    }
}

impl RotatingSurface for RecordingSurface {
    fn rotate_z(&mut self, degrees: f64) {
        self.ops.push(SurfaceOp::RotateZ(degrees));
    }

    fn rotate_y(&mut self, degrees: f64) {
        self.ops.push(SurfaceOp::RotateY(degrees));
    }

    fn offset(&mut self, dx: f64, dy: f64, dz: f64) {
        self.ops.push(SurfaceOp::Offset(dx, dy, dz));
    }

    fn cut_surface(&mut self, _cutter: &Cutter, x: f64, z: f64) {
        self.ops.push(SurfaceOp::Cut(x, z));
    }

    fn num_sectors(&self) -> u32 {
        self.sectors
    }
}
