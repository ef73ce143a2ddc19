//! The polymorphic amplitude source consumed by cut-motion variants.

use serde::{Deserialize, Serialize};

use rosework_core::types::EntityId;

use crate::compound::CompoundRosette;
use crate::simple::SimpleRosette;

/// An amplitude source: either a single patterned rosette or an algebraic
/// combination of several.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RosetteSource {
    /// A single patterned rosette.
    Simple(SimpleRosette),
    /// A combination of rosettes normalized to its own pToP.
    Compound(CompoundRosette),
}

impl RosetteSource {
    /// Deflection at a spindle angle, in `[0, pToP]`.
    pub fn amplitude_at(&self, angle: f64) -> f64 {
        match self {
            RosetteSource::Simple(r) => r.amplitude_at(angle),
            RosetteSource::Compound(r) => r.amplitude_at(angle),
        }
    }

    /// Deflection with an extra inversion applied on top of any configured
    /// invert flag.
    pub fn amplitude_at_inverted(&self, angle: f64, invert: bool) -> f64 {
        match self {
            RosetteSource::Simple(r) => r.amplitude_at_inverted(angle, invert),
            RosetteSource::Compound(r) => r.amplitude_at_inverted(angle, invert),
        }
    }

    /// Peak-to-peak amplitude.
    pub fn p_to_p(&self) -> f64 {
        match self {
            RosetteSource::Simple(r) => r.p_to_p(),
            RosetteSource::Compound(r) => r.p_to_p(),
        }
    }

    /// Pattern repeats per revolution (always 1 for compounds).
    pub fn repeat(&self) -> u32 {
        match self {
            RosetteSource::Simple(r) => r.repeat(),
            RosetteSource::Compound(r) => r.repeat(),
        }
    }

    /// Phase in degrees (compounds carry no phase of their own).
    pub fn phase(&self) -> f64 {
        match self {
            RosetteSource::Simple(r) => r.phase(),
            RosetteSource::Compound(_) => 0.0,
        }
    }

    /// Pattern name, or `"Compound"` for combinations.
    pub fn pattern_name(&self) -> &str {
        match self {
            RosetteSource::Simple(r) => r.pattern_name(),
            RosetteSource::Compound(_) => "Compound",
        }
    }

    /// Entity ID of the underlying rosette.
    pub fn id(&self) -> EntityId {
        match self {
            RosetteSource::Simple(r) => r.id(),
            RosetteSource::Compound(r) => r.id(),
        }
    }

    /// True when this source cannot deflect the cutter: zero amplitude or
    /// the `"NONE"` pattern. Triggers the synthesizer's circle shortcut.
    pub fn is_degenerate(&self) -> bool {
        match self {
            RosetteSource::Simple(r) => r.is_degenerate(),
            RosetteSource::Compound(r) => r.is_degenerate(),
        }
    }

    /// Whether a repeat index is masked out (compounds are never masked).
    pub fn is_repeat_masked(&self, index: u32) -> bool {
        match self {
            RosetteSource::Simple(r) => r.is_repeat_masked(index),
            RosetteSource::Compound(_) => false,
        }
    }

    /// Piecewise-linear breakpoints of one repeat, when the underlying
    /// pattern declares them. Compounds never qualify.
    pub fn line_segments(&self) -> Option<Vec<f64>> {
        match self {
            RosetteSource::Simple(r) => r.pattern().line_segments().map(|s| s.to_vec()),
            RosetteSource::Compound(_) => None,
        }
    }

    /// Access the simple rosette, if this source is one.
    pub fn as_simple(&self) -> Option<&SimpleRosette> {
        match self {
            RosetteSource::Simple(r) => Some(r),
            RosetteSource::Compound(_) => None,
        }
    }

    /// Mutable access to the simple rosette, if this source is one.
    pub fn as_simple_mut(&mut self) -> Option<&mut SimpleRosette> {
        match self {
            RosetteSource::Simple(r) => Some(r),
            RosetteSource::Compound(_) => None,
        }
    }
}

impl From<SimpleRosette> for RosetteSource {
    fn from(r: SimpleRosette) -> Self {
        RosetteSource::Simple(r)
    }
}

impl From<CompoundRosette> for RosetteSource {
    fn from(r: CompoundRosette) -> Self {
        RosetteSource::Compound(r)
    }
}
