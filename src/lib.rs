//! # Rosework
//!
//! Motion-synthesis core for ornamental (rose engine) lathe CAM:
//! - Rosette amplitude models (simple and compound, with masking,
//!   symmetry, and phase)
//! - Cut-motion variants (index, pierce, rosette, pattern, line, offset,
//!   spiral-wrapped)
//! - Toolpath synthesis with circle shortcuts, straight-pattern waypoints,
//!   and air avoidance
//! - Spiral/twist generation between begin and end cut points
//! - Surface-cut choreography against an external rotating-surface model
//!
//! ## Architecture
//!
//! Rosework is organized as a workspace with multiple crates:
//!
//! 1. **rosework-core** - Lathe-plane geometry, angle normalization, the
//!    change-notification event bus, cancellation, errors
//! 2. **rosework-rosette** - The amplitude model: pattern functions,
//!    simple and compound rosettes
//! 3. **rosework-motion** - Cut-motion variants, depth-pass planning,
//!    toolpath synthesis, spirals, surface cuts
//! 4. **rosework** - This umbrella crate, re-exporting the public surface
//!
//! Rendering, persistence, and the outline/cutter geometry libraries are
//! external collaborators consumed through the traits in
//! `rosework-motion`.

pub use rosework_core::{
    angle_check, event_bus, snap_zero, CamEvent, CancelToken, ChangeEvent, CoreError, EntityId,
    Error, EventBus, EventBusConfig, EventCategory, EventFilter, LathePoint, MotionError,
    NoticeEvent, PropertyId, PropertyValue, Result, RosetteError, RotationPolicy, SubscriptionId,
};

pub use rosework_rosette::{
    Combine, CompoundRosette, FlatPattern, HarmonicPattern, MaskStyle, NonePattern, Pattern,
    PatternRef, RosetteNode, RosetteSource, SimpleRosette, SinePattern, TrianglePattern,
};

pub use rosework_motion::{
    CutDirection, CutList, CutOutcome, CutVariant, Cutter, CutterFrame, CutterLocation, CutterRef,
    CurveSide, IndexPayload, IndexWheel, InstructionList, LinePayload, MotionCommand,
    OffsetGroupPayload, OffsetPayload, OutlineCurve, Pass, PassPlan, PatternPayload,
    PolylineCurve, RecordingSurface, RosetteMotion, RosettePayload, RotatingSurface, SampledBar,
    SoftLift, Speed, SpiralPayload, SurfaceCutter, SurfaceOp, Synthesizer, Twist, TwistSample,
    TwistStyle, VariantBase, VariantCollection, VariantKind, VariantTag,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}
