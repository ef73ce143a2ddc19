//! Algebraic combinations of rosettes.
//!
//! A compound rosette folds an ordered list of child amplitude sources
//! through combine operators, then normalizes the combined deflection to
//! its own `pToP` by dividing by a numerically-sampled maximum. The
//! sampled maximum is the only memoized state in the amplitude model: it
//! is invalidated whenever any child mutates and recomputed synchronously
//! before the next read.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rosework_core::event_bus::{
    event_bus, CamEvent, ChangeEvent, EventFilter, PropertyId, PropertyValue, SubscriptionId,
};
use rosework_core::types::EntityId;

use crate::simple::SimpleRosette;

/// Number of samples used for the normalization maximum: one every 0.5
/// degrees over a full revolution.
const MAX_SAMPLES: u32 = 720;

/// Operator combining a child with the running deflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Combine {
    /// Ignore the right-hand child.
    None,
    /// Pointwise minimum.
    Min,
    /// Pointwise maximum.
    Max,
    /// Sum.
    Add,
    /// Difference (left minus right).
    Sub,
}

impl Combine {
    fn apply(&self, left: f64, right: f64) -> f64 {
        match self {
            Combine::None => left,
            Combine::Min => left.min(right),
            Combine::Max => left.max(right),
            Combine::Add => left + right,
            Combine::Sub => left - right,
        }
    }
}

/// A child amplitude source of a compound rosette.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RosetteNode {
    /// A simple patterned rosette.
    Simple(SimpleRosette),
    /// A nested compound rosette.
    Compound(CompoundRosette),
}

impl RosetteNode {
    /// Raw deflection of this child at a spindle angle.
    pub fn amplitude_at(&self, angle: f64) -> f64 {
        match self {
            RosetteNode::Simple(r) => r.amplitude_at(angle),
            RosetteNode::Compound(r) => r.amplitude_at(angle),
        }
    }

    /// Entity ID of this child.
    pub fn id(&self) -> EntityId {
        match self {
            RosetteNode::Simple(r) => r.id(),
            RosetteNode::Compound(r) => r.id(),
        }
    }

    /// All entity IDs in this subtree, for invalidation subscriptions.
    fn collect_ids(&self, into: &mut Vec<EntityId>) {
        into.push(self.id());
        if let RosetteNode::Compound(c) = self {
            for child in &c.children {
                child.collect_ids(into);
            }
        }
    }
}

/// An ordered combination of amplitude sources, normalized to its own pToP.
#[derive(Debug, Serialize, Deserialize)]
pub struct CompoundRosette {
    id: EntityId,
    p_to_p: f64,
    children: Vec<RosetteNode>,
    combiners: Vec<Combine>,
    #[serde(skip)]
    sampled_max: RefCell<Option<f64>>,
    #[serde(skip, default = "dirty_flag")]
    dirty: Arc<AtomicBool>,
    #[serde(skip)]
    subscriptions: Vec<(EntityId, SubscriptionId)>,
}

fn dirty_flag() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(true))
}

impl CompoundRosette {
    /// Create an empty compound rosette.
    pub fn new(p_to_p: f64) -> Self {
        Self {
            id: EntityId::new(),
            p_to_p: p_to_p.max(0.0),
            children: Vec::new(),
            combiners: Vec::new(),
            sampled_max: RefCell::new(None),
            dirty: dirty_flag(),
            subscriptions: Vec::new(),
        }
    }

    /// Entity ID for change-notification subscriptions.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Peak-to-peak amplitude of the normalized output.
    pub fn p_to_p(&self) -> f64 {
        self.p_to_p
    }

    /// Compound rosettes always have repeat 1.
    pub fn repeat(&self) -> u32 {
        1
    }

    /// The child amplitude sources.
    pub fn children(&self) -> &[RosetteNode] {
        &self.children
    }

    /// The combine operators; always one fewer than the children.
    pub fn combiners(&self) -> &[Combine] {
        &self.combiners
    }

    /// True when the compound cannot deflect the cutter.
    pub fn is_degenerate(&self) -> bool {
        self.p_to_p <= 0.0 || self.children.is_empty()
    }

    /// Set the output amplitude. Negative values are rejected.
    pub fn set_p_to_p(&mut self, p_to_p: f64) -> bool {
        if !p_to_p.is_finite() || p_to_p < 0.0 {
            return false;
        }
        let old = self.p_to_p;
        self.p_to_p = p_to_p;
        self.publish(
            "rosette.pToP",
            PropertyValue::Number(old),
            PropertyValue::Number(p_to_p),
        );
        true
    }

    /// Append a child. The first child needs no combiner; each further
    /// child brings the operator that joins it to the running value.
    pub fn add_child(&mut self, child: RosetteNode, combiner: Option<Combine>) {
        if !self.children.is_empty() {
            self.combiners.push(combiner.unwrap_or(Combine::Add));
        }
        self.watch_subtree(&child);
        self.children.push(child);
        self.invalidate();
        self.publish(
            "rosette.children",
            PropertyValue::Structural,
            PropertyValue::Structural,
        );
    }

    /// Remove a child and its joining combiner. Out-of-range indexes are
    /// ignored.
    pub fn remove_child(&mut self, index: usize) -> Option<RosetteNode> {
        if index >= self.children.len() {
            return None;
        }
        let removed = self.children.remove(index);
        if !self.combiners.is_empty() {
            // The first child owns no combiner; removing any other child
            // removes the operator that joined it.
            self.combiners.remove(index.saturating_sub(1).min(self.combiners.len() - 1));
        }
        self.unwatch_subtree(&removed);
        self.invalidate();
        self.publish(
            "rosette.children",
            PropertyValue::Structural,
            PropertyValue::Structural,
        );
        Some(removed)
    }

    /// Replace the combiner at the given slot. Out-of-range is ignored.
    pub fn set_combiner(&mut self, index: usize, combiner: Combine) -> bool {
        let Some(slot) = self.combiners.get_mut(index) else {
            return false;
        };
        *slot = combiner;
        self.invalidate();
        self.publish(
            "rosette.combiners",
            PropertyValue::Structural,
            PropertyValue::Structural,
        );
        true
    }

    /// Mutable access to a child.
    ///
    /// Invariant: handing out `&mut` counts as a mutation, so the sampled
    /// maximum is invalidated here as well as through the bus subscription.
    pub fn child_mut(&mut self, index: usize) -> Option<&mut RosetteNode> {
        self.invalidate();
        self.children.get_mut(index)
    }

    // -- evaluation ---------------------------------------------------------

    /// Combined, normalized deflection at a spindle angle, in `[0, pToP]`.
    pub fn amplitude_at(&self, angle: f64) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        let max = self.sampled_max();
        if max <= 0.0 {
            return 0.0;
        }
        (self.raw_at(angle) / max * self.p_to_p).clamp(0.0, self.p_to_p)
    }

    /// Deflection with an extra inversion applied.
    pub fn amplitude_at_inverted(&self, angle: f64, invert: bool) -> f64 {
        let value = self.amplitude_at(angle);
        if invert {
            self.p_to_p - value
        } else {
            value
        }
    }

    /// The memoized maximum combined deflection, recomputed on demand.
    pub fn sampled_max(&self) -> f64 {
        if self.dirty.swap(false, Ordering::SeqCst) {
            *self.sampled_max.borrow_mut() = None;
        }
        if let Some(max) = *self.sampled_max.borrow() {
            return max;
        }
        let mut max = 0.0_f64;
        for i in 0..MAX_SAMPLES {
            let angle = i as f64 * (360.0 / MAX_SAMPLES as f64);
            max = max.max(self.raw_at(angle));
        }
        tracing::debug!(compound = %self.id, max, "Recomputed sampled maximum");
        *self.sampled_max.borrow_mut() = Some(max);
        max
    }

    fn raw_at(&self, angle: f64) -> f64 {
        let mut iter = self.children.iter();
        let Some(first) = iter.next() else {
            return 0.0;
        };
        let mut value = first.amplitude_at(angle);
        for (child, op) in iter.zip(self.combiners.iter()) {
            value = op.apply(value, child.amplitude_at(angle));
        }
        value
    }

    // -- invalidation -------------------------------------------------------

    fn invalidate(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    fn watch_subtree(&mut self, child: &RosetteNode) {
        let mut ids = Vec::new();
        child.collect_ids(&mut ids);
        for id in ids {
            let dirty = self.dirty.clone();
            let sub = event_bus().subscribe(EventFilter::Entity(id), move |_| {
                dirty.store(true, Ordering::SeqCst);
            });
            self.subscriptions.push((id, sub));
        }
    }

    /// Drop the bus watches registered for a removed subtree.
    fn unwatch_subtree(&mut self, child: &RosetteNode) {
        let mut ids = Vec::new();
        child.collect_ids(&mut ids);
        let bus = event_bus();
        self.subscriptions.retain(|(id, sub)| {
            if ids.contains(id) {
                bus.unsubscribe(*sub);
                false
            } else {
                true
            }
        });
    }

    fn publish(&self, property: &'static str, old: PropertyValue, new: PropertyValue) {
        event_bus()
            .publish(CamEvent::Changed(ChangeEvent::rosette(
                self.id,
                PropertyId::new(property),
                old,
                new,
            )))
            .ok();
    }
}

impl Clone for CompoundRosette {
    /// Value snapshot: the clone starts with a dirty cache and no bus
    /// subscriptions; mutation through [`CompoundRosette::child_mut`]
    /// keeps it coherent.
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            p_to_p: self.p_to_p,
            children: self.children.clone(),
            combiners: self.combiners.clone(),
            sampled_max: RefCell::new(None),
            dirty: dirty_flag(),
            subscriptions: Vec::new(),
        }
    }
}

impl Drop for CompoundRosette {
    fn drop(&mut self) {
        for (_, sub) in self.subscriptions.drain(..) {
            event_bus().unsubscribe(sub);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::SinePattern;
    use std::sync::Arc as StdArc;

    fn sine(p_to_p: f64, repeat: u32) -> SimpleRosette {
        SimpleRosette::with_amplitude(StdArc::new(SinePattern), p_to_p, repeat)
    }

    #[test]
    fn test_add_of_identical_children_matches_scaled_single() {
        let child = sine(0.1, 4);
        let mut compound = CompoundRosette::new(0.2);
        compound.add_child(RosetteNode::Simple(child.clone()), None);
        compound.add_child(RosetteNode::Simple(child.clone()), Some(Combine::Add));

        // Two identical children under ADD normalize back to the compound's
        // own pToP: equivalent to one child scaled to 0.2.
        for i in 0..360 {
            let a = i as f64;
            let expected = child.amplitude_at(a) * 2.0;
            assert!(
                (compound.amplitude_at(a) - expected).abs() < 1e-9,
                "mismatch at {a}"
            );
        }
    }

    #[test]
    fn test_amplitude_in_range() {
        let mut compound = CompoundRosette::new(0.15);
        compound.add_child(RosetteNode::Simple(sine(0.1, 3)), None);
        compound.add_child(RosetteNode::Simple(sine(0.07, 5)), Some(Combine::Sub));
        for i in 0..720 {
            let v = compound.amplitude_at(i as f64 * 0.5);
            assert!((0.0..=0.15).contains(&v));
        }
    }

    #[test]
    fn test_cache_invalidated_by_child_mutation() {
        let mut compound = CompoundRosette::new(0.2);
        compound.add_child(RosetteNode::Simple(sine(0.1, 4)), None);
        let before = compound.sampled_max();
        assert!(before > 0.0);

        if let Some(RosetteNode::Simple(child)) = compound.child_mut(0) {
            assert!(child.set_p_to_p(0.3));
        }
        let after = compound.sampled_max();
        assert!((after - before * 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_min_max_combiners() {
        let mut compound = CompoundRosette::new(0.1);
        compound.add_child(RosetteNode::Simple(sine(0.1, 2)), None);
        compound.add_child(RosetteNode::Simple(sine(0.1, 3)), Some(Combine::Min));
        // MIN of two non-negative sources is bounded by either one.
        for i in 0..360 {
            let a = i as f64;
            assert!(compound.amplitude_at(a) <= 0.1 + 1e-12);
        }
        assert!(compound.set_combiner(0, Combine::Max));
        assert!(compound.sampled_max() > 0.0);
    }

    #[test]
    fn test_empty_compound_is_degenerate() {
        let compound = CompoundRosette::new(0.2);
        assert!(compound.is_degenerate());
        assert_eq!(compound.amplitude_at(123.0), 0.0);
    }

    #[test]
    fn test_remove_child_drops_its_bus_watch() {
        let removed_child = sine(0.1, 2);
        let removed_id = removed_child.id();
        let mut compound = CompoundRosette::new(0.2);
        compound.add_child(RosetteNode::Simple(removed_child), None);
        compound.add_child(RosetteNode::Simple(sine(0.1, 3)), Some(Combine::Add));
        assert_eq!(compound.subscriptions.len(), 2);

        compound.remove_child(0);
        assert_eq!(compound.subscriptions.len(), 1);
        assert!(compound
            .subscriptions
            .iter()
            .all(|(id, _)| *id != removed_id));

        // The watch is gone from the global bus too: a change event for
        // the removed child no longer dirties the cache.
        let _ = compound.sampled_max();
        event_bus()
            .publish(CamEvent::Changed(ChangeEvent::rosette(
                removed_id,
                PropertyId::new("rosette.pToP"),
                PropertyValue::Number(0.1),
                PropertyValue::Number(0.5),
            )))
            .ok();
        assert!(!compound.dirty.load(Ordering::SeqCst));
    }

    #[test]
    fn test_remove_child_removes_combiner() {
        let mut compound = CompoundRosette::new(0.2);
        compound.add_child(RosetteNode::Simple(sine(0.1, 2)), None);
        compound.add_child(RosetteNode::Simple(sine(0.1, 3)), Some(Combine::Add));
        compound.add_child(RosetteNode::Simple(sine(0.1, 5)), Some(Combine::Max));
        assert_eq!(compound.combiners().len(), 2);

        compound.remove_child(1);
        assert_eq!(compound.children().len(), 2);
        assert_eq!(compound.combiners().len(), 1);
    }
}
