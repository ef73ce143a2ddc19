//! Error handling for Rosework
//!
//! Provides error types for all layers of the motion core:
//! - Rosette errors (amplitude-model configuration)
//! - Motion errors (variant geometry and toolpath synthesis)
//! - Core errors (events, numeric input)
//!
//! Most invalid configuration never surfaces as an error: setters reject
//! bad values silently and keep prior state, and degenerate geometry
//! degrades to a simpler well-defined case. These types exist for the API
//! boundaries where a `Result` is the honest signature (synthesis entry
//! points, surface-cut choreography).
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Amplitude-model error type.
#[derive(Error, Debug, Clone)]
pub enum RosetteError {
    /// Peak-to-peak amplitude must be non-negative.
    #[error("Invalid peak-to-peak amplitude: {value}")]
    InvalidAmplitude {
        /// The rejected amplitude.
        value: f64,
    },

    /// Repeat below the pattern's minimum.
    #[error("Repeat {requested} below pattern minimum {minimum}")]
    RepeatBelowMinimum {
        /// The requested repeat count.
        requested: u32,
        /// The pattern's minimum repeat.
        minimum: u32,
    },

    /// Width-symmetry factors incompatible with the repeat count.
    #[error("Width symmetry of {factors} factors incompatible with repeat {repeat}")]
    SymmetryMismatch {
        /// Number of symmetry factors supplied.
        factors: usize,
        /// Current repeat count.
        repeat: u32,
    },

    /// A compound rosette must hold N children and N-1 combiners.
    #[error("Compound rosette has {children} children but {combiners} combiners")]
    CombinerMismatch {
        /// Number of child sources.
        children: usize,
        /// Number of combine operators.
        combiners: usize,
    },

    /// Generic rosette error.
    #[error("Rosette error: {message}")]
    Other {
        /// The error message.
        message: String,
    },
}

/// Motion and toolpath error type.
#[derive(Error, Debug, Clone)]
pub enum MotionError {
    /// The outline curve cannot supply the requested geometry.
    #[error("Degenerate curve: {reason}")]
    DegenerateCurve {
        /// Why the curve is unusable.
        reason: String,
    },

    /// Offset magnitude outside the accepted 0.1-10.0 range.
    #[error("Offset {value} outside accepted range 0.1-10.0")]
    OffsetOutOfRange {
        /// The rejected offset.
        value: f64,
    },

    /// Index offset incompatible with the index wheel for this repeat.
    #[error("Index offset {offset} invalid for {holes}-hole wheel at repeat {repeat}")]
    InvalidIndexOffset {
        /// The rejected index offset.
        offset: i32,
        /// Holes on the selected index wheel.
        holes: u32,
        /// Current repeat count.
        repeat: u32,
    },

    /// Curvature compensation could not locate a geometric solution.
    #[error("Curvature compensation infeasible: {reason}")]
    OptimizeInfeasible {
        /// Why the solve failed.
        reason: String,
    },

    /// Synthesis produced no cut points.
    #[error("No cut points produced for variant")]
    NoCutPoints,

    /// Generic motion error.
    #[error("Motion error: {message}")]
    Other {
        /// The error message.
        message: String,
    },
}

/// Core infrastructure error type.
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// A spindle angle was NaN or infinite.
    #[error("Non-finite angle: {value}")]
    NonFiniteAngle {
        /// The offending value.
        value: f64,
    },

    /// Event bus failure.
    #[error("Event bus error: {reason}")]
    EventBus {
        /// The underlying reason.
        reason: String,
    },
}

/// Main error type for Rosework.
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Rosette error
    #[error(transparent)]
    Rosette(#[from] RosetteError),

    /// Motion error
    #[error(transparent)]
    Motion(#[from] MotionError),

    /// Core error
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message.
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a rosette error.
    pub fn is_rosette_error(&self) -> bool {
        matches!(self, Error::Rosette(_))
    }

    /// Check if this is a motion error.
    pub fn is_motion_error(&self) -> bool {
        matches!(self, Error::Motion(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
