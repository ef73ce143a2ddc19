//! # Rosework Motion
//!
//! The motion layer of Rosework: cut-motion variants, depth-pass planning,
//! toolpath synthesis, spiral/twist generation, and surface-cut
//! choreography against the external rotating-surface model.
//!
//! - [`variant`] - the closed set of cutting strategies and their
//!   collection
//! - [`synth`] - variant + pass plan to an ordered motion-command stream
//! - [`spiral`] - twisted cuts between a begin and end point
//! - [`surface_cut`] - replaying cuts into a rotating-surface simulator
//! - [`cutter`], [`curve`], [`cutlist`], [`surface`] - collaborator
//!   interfaces consumed as black boxes
//! - [`wheel`] - the physical 24/35-hole index wheels offset cuts quantize
//!   to

pub mod cutlist;
pub mod curve;
pub mod cutter;
pub mod error;
pub mod passes;
pub mod spiral;
pub mod surface;
pub mod surface_cut;
pub mod synth;
pub mod variant;
pub mod wheel;

pub use cutlist::{CutList, InstructionList, MotionCommand, Speed};
pub use curve::{CurveSide, OutlineCurve, PolylineCurve};
pub use cutter::{Cutter, CutterFrame, CutterLocation, CutterRef};
pub use error::MotionError;
pub use passes::{Pass, PassPlan, SoftLift};
pub use spiral::TwistSample;
pub use surface::{RecordingSurface, RotatingSurface, SurfaceOp};
pub use surface_cut::{CutOutcome, SurfaceCutter};
pub use synth::Synthesizer;
pub use variant::{
    CutDirection, CutVariant, IndexPayload, LinePayload, OffsetGroupPayload, OffsetPayload,
    PatternPayload, RosetteMotion, RosettePayload, SampledBar, SpiralPayload, Twist, TwistStyle,
    VariantBase, VariantCollection, VariantKind, VariantTag,
};
pub use wheel::IndexWheel;
