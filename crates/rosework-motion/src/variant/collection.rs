//! The ordered collection owning a toolpath's variants.

use serde::{Deserialize, Serialize};

use rosework_core::event_bus::{event_bus, CamEvent, ChangeEvent, PropertyId, PropertyValue};
use rosework_core::types::EntityId;

use super::CutVariant;

/// An ordered, densely numbered collection of cut-motion variants.
///
/// Sequence numbers are a dense `0..N-1` run maintained on every
/// structural change; consumers may index drawables and persisted forms by
/// sequence without gaps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariantCollection {
    #[serde(skip)]
    id: EntityId,
    variants: Vec<CutVariant>,
}

impl VariantCollection {
    /// An empty collection.
    pub fn new() -> Self {
        Self {
            id: EntityId::new(),
            variants: Vec::new(),
        }
    }

    /// Entity ID of the collection itself.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Number of variants.
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// The variants in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = &CutVariant> {
        self.variants.iter()
    }

    /// Look up a variant by entity ID.
    pub fn get(&self, id: EntityId) -> Option<&CutVariant> {
        self.variants.iter().find(|v| v.id() == id)
    }

    /// Mutable lookup by entity ID.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut CutVariant> {
        self.variants.iter_mut().find(|v| v.id() == id)
    }

    /// Variant at a sequence position.
    pub fn at(&self, sequence: usize) -> Option<&CutVariant> {
        self.variants.get(sequence)
    }

    fn renumber(&mut self) {
        for (i, v) in self.variants.iter_mut().enumerate() {
            v.set_sequence(i);
        }
    }

    fn publish_structural(&self) {
        event_bus()
            .publish(CamEvent::Changed(ChangeEvent::variant(
                self.id,
                PropertyId::new("collection.members"),
                PropertyValue::Structural,
                PropertyValue::Structural,
            )))
            .ok();
    }

    /// Append a variant, assigning the next sequence number.
    pub fn add(&mut self, variant: CutVariant) -> EntityId {
        let id = variant.id();
        self.variants.push(variant);
        self.renumber();
        self.publish_structural();
        id
    }

    /// Insert a duplicate of an existing variant right after it, returning
    /// the new variant's ID.
    pub fn duplicate(&mut self, id: EntityId) -> Option<EntityId> {
        let index = self.variants.iter().position(|v| v.id() == id)?;
        let copy = self.variants[index].duplicate();
        let new_id = copy.id();
        self.variants.insert(index + 1, copy);
        self.renumber();
        self.publish_structural();
        Some(new_id)
    }

    /// Remove a variant, dropping its change subscriptions with it and
    /// closing the sequence gap.
    pub fn remove(&mut self, id: EntityId) -> Option<CutVariant> {
        let index = self.variants.iter().position(|v| v.id() == id)?;
        let removed = self.variants.remove(index);
        event_bus().unsubscribe_entity(id);
        self.renumber();
        self.publish_structural();
        Some(removed)
    }

    /// Move a variant to a new sequence position.
    pub fn reorder(&mut self, id: EntityId, new_sequence: usize) -> bool {
        let Some(index) = self.variants.iter().position(|v| v.id() == id) else {
            return false;
        };
        let variant = self.variants.remove(index);
        let target = new_sequence.min(self.variants.len());
        self.variants.insert(target, variant);
        self.renumber();
        self.publish_structural();
        true
    }
}

impl<'a> IntoIterator for &'a VariantCollection {
    type Item = &'a CutVariant;
    type IntoIter = std::slice::Iter<'a, CutVariant>;

    fn into_iter(self) -> Self::IntoIter {
        self.variants.iter()
    }
}
