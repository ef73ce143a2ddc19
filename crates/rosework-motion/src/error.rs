//! Motion-layer error type, shared with the core crate.

pub use rosework_core::error::MotionError;
