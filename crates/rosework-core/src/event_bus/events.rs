//! Event type definitions for the change-notification bus.
//!
//! Every mutating setter on a rosette or cut variant publishes exactly one
//! [`ChangeEvent`] carrying the old and new values and a property
//! identifier, so that dependent state (drawables, snapped positions,
//! persisted forms, cached amplitude maxima) can be recomputed by
//! collaborators. Events are cloneable and serializable for logging/replay.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::types::{EntityId, LathePoint};

/// Identifier for a mutated property, e.g. `"rosette.pToP"`.
///
/// Publishers name properties with static strings; the identifier owns its
/// text so deserialized events carry the name too.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyId(pub Cow<'static, str>);

impl PropertyId {
    /// Wrap a static property name without allocating.
    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// The property name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PropertyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Old/new value payload of a change event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// A floating-point property.
    Number(f64),
    /// An integral property (repeat counts, sequence numbers, offsets).
    Integer(i64),
    /// A textual property (mask strings, pattern names).
    Text(String),
    /// A boolean property (invert, snap, optimize flags).
    Flag(bool),
    /// A lathe-plane position.
    Point(LathePoint),
    /// A structural change with no scalar representation (child list edits).
    Structural,
    /// The property had no previous value.
    None,
}

/// Root event enum for the motion core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CamEvent {
    /// A property of an entity changed through a setter.
    Changed(ChangeEvent),
    /// A user-visible notice surfaced by the core.
    Notice(NoticeEvent),
}

impl CamEvent {
    /// Get the category of this event.
    pub fn category(&self) -> EventCategory {
        match self {
            CamEvent::Changed(e) => e.category,
            CamEvent::Notice(_) => EventCategory::Notice,
        }
    }

    /// Get a short description of this event for logging.
    pub fn description(&self) -> String {
        match self {
            CamEvent::Changed(e) => {
                format!("{} {} changed", e.entity, e.property)
            }
            CamEvent::Notice(e) => e.description(),
        }
    }
}

/// Event category for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Amplitude-model changes (simple and compound rosettes).
    Rosette,
    /// Cut-motion variant changes.
    Variant,
    /// Toolpath synthesis events.
    Toolpath,
    /// Surface-simulation events.
    Surface,
    /// User-visible notices.
    Notice,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Rosette => write!(f, "Rosette"),
            EventCategory::Variant => write!(f, "Variant"),
            EventCategory::Toolpath => write!(f, "Toolpath"),
            EventCategory::Surface => write!(f, "Surface"),
            EventCategory::Notice => write!(f, "Notice"),
        }
    }
}

/// A single property mutation on an identified entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// The entity whose property changed.
    pub entity: EntityId,
    /// Which kind of entity it is.
    pub category: EventCategory,
    /// The property that changed.
    pub property: PropertyId,
    /// Value before the mutation.
    pub old: PropertyValue,
    /// Value after the mutation.
    pub new: PropertyValue,
}

impl ChangeEvent {
    /// Create a change event for a rosette property.
    pub fn rosette(
        entity: EntityId,
        property: PropertyId,
        old: PropertyValue,
        new: PropertyValue,
    ) -> Self {
        Self {
            entity,
            category: EventCategory::Rosette,
            property,
            old,
            new,
        }
    }

    /// Create a change event for a variant property.
    pub fn variant(
        entity: EntityId,
        property: PropertyId,
        old: PropertyValue,
        new: PropertyValue,
    ) -> Self {
        Self {
            entity,
            category: EventCategory::Variant,
            property,
            old,
            new,
        }
    }
}

/// User-visible notices surfaced by the core.
///
/// These never abort computation; they report that a degraded path was
/// taken, such as an infeasible optimization continuing un-optimized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NoticeEvent {
    /// Curvature compensation could not find a geometric solution, or the
    /// compensated cut would pass the top/bottom of the shape. The optimize
    /// flag has been forced off.
    OptimizeDisabled {
        /// The variant whose optimize flag was cleared.
        entity: EntityId,
        /// Why compensation was abandoned.
        reason: String,
    },
    /// A spiral degenerated to zero length and was treated as its plain
    /// begin point.
    SpiralDegenerate {
        /// The spiral variant affected.
        entity: EntityId,
    },
    /// A long-running operation was cancelled; partial results were kept.
    OperationCancelled {
        /// Describes the cancelled operation.
        operation: String,
    },
}

impl NoticeEvent {
    fn description(&self) -> String {
        match self {
            NoticeEvent::OptimizeDisabled { entity, reason } => {
                format!("Optimization disabled for {}: {}", entity, reason)
            }
            NoticeEvent::SpiralDegenerate { entity } => {
                format!("Spiral {} is zero length; treated as plain cut", entity)
            }
            NoticeEvent::OperationCancelled { operation } => {
                format!("{} cancelled", operation)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cam_event_serde_round_trip() {
        let entity = EntityId::new();
        let event = CamEvent::Changed(ChangeEvent::rosette(
            entity,
            PropertyId::new("rosette.pToP"),
            PropertyValue::Number(0.1),
            PropertyValue::Number(0.2),
        ));
        let json = serde_json::to_string(&event).expect("event should serialize");
        let back: CamEvent = serde_json::from_str(&json).expect("event should deserialize");
        match back {
            CamEvent::Changed(e) => {
                assert_eq!(e.entity, entity);
                assert_eq!(e.property, PropertyId::new("rosette.pToP"));
                assert_eq!(e.property.as_str(), "rosette.pToP");
                assert_eq!(e.old, PropertyValue::Number(0.1));
                assert_eq!(e.new, PropertyValue::Number(0.2));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_notice_event_serde_round_trip() {
        let event = CamEvent::Notice(NoticeEvent::OperationCancelled {
            operation: "surface cut".to_string(),
        });
        let json = serde_json::to_string(&event).expect("event should serialize");
        let back: CamEvent = serde_json::from_str(&json).expect("event should deserialize");
        assert_eq!(back.description(), "surface cut cancelled");
        assert_eq!(back.category(), EventCategory::Notice);
    }
}
