//! # Rosework Rosette
//!
//! The amplitude model: pure functions mapping a spindle angle to a radial
//! or tangential cutter deflection, modeling the physical cam plates
//! ("rosettes") of an ornamental lathe.
//!
//! - [`pattern`] - the pattern-function collaborator trait plus built-ins
//! - [`simple`] - a single patterned rosette (repeat, phase, mask, symmetry)
//! - [`compound`] - algebraic combinations of rosettes with a memoized
//!   sampled maximum
//! - [`source`] - the polymorphic amplitude source consumed by cut variants

pub mod compound;
pub mod pattern;
pub mod simple;
pub mod source;

pub use compound::{Combine, CompoundRosette, RosetteNode};
pub use pattern::{
    FlatPattern, HarmonicPattern, NonePattern, Pattern, PatternRef, SinePattern, TrianglePattern,
};
pub use simple::{MaskStyle, SimpleRosette};
pub use source::RosetteSource;
