//! # Rosework Core
//!
//! Core types, traits, and utilities for Rosework.
//! Provides the fundamental abstractions shared by the amplitude-model and
//! motion-synthesis crates: lathe-plane geometry, angle normalization,
//! the change-notification event bus, cancellation, and error types.

pub mod cancel;
pub mod error;
pub mod event_bus;
pub mod types;

pub use cancel::CancelToken;

pub use error::{CoreError, Error, MotionError, Result, RosetteError};

// Re-export event bus for convenience
pub use event_bus::{
    event_bus, CamEvent, ChangeEvent, EventBus, EventBusConfig, EventCategory, EventFilter,
    NoticeEvent, PropertyId, PropertyValue, SubscriptionId,
};

pub use types::{
    angle_check, snap_zero, EntityId, LathePoint, RotationPolicy, Shared, SharedOption, SharedVec,
    ThreadSafe, ThreadSafeRw,
};
