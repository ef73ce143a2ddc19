//! # Event Bus Module
//!
//! Change-notification fan-out for the motion core. Every mutating setter
//! on a rosette or cut variant publishes one typed event carrying the old
//! value, the new value, and a property identifier; collaborators
//! (drawables, snapped positions, persisted forms, cached amplitude maxima)
//! subscribe and recompute.
//!
//! ## Overview
//!
//! - Publishers emit typed events without knowing subscribers
//! - Subscribers filter by category or by a specific entity id
//! - Synchronous handlers run before `publish` returns, so derived caches
//!   are never stale across a setter call
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rosework_core::event_bus::{event_bus, CamEvent, EventFilter, EventCategory};
//!
//! // Subscribe to rosette changes
//! let subscription = event_bus().subscribe(
//!     EventFilter::Categories(vec![EventCategory::Rosette]),
//!     |event| {
//!         if let CamEvent::Changed(change) = event {
//!             println!("{} changed", change.property);
//!         }
//!     },
//! );
//!
//! // Unsubscribe when done
//! event_bus().unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
