// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::{hash::BuildHasher, marker::PhantomData, num::NonZeroU32};

use ahash::RandomState;
use hashbrown::{HashTable, hash_table::Entry};

use crate::{ecmascript::types::PropertyKey, engine::context::GcToken};

use super::{
    put_property_slot::{PutContext, PutPropertySlot, PutSlotKind, PutValueFn},
    shape::{ObjectShape, PropertyOffset},
};

/// Specialized fast path baked from a finalized write slot.
///
/// A plan is valid for exactly one arrival shape: the dispatcher compares
/// the receiver's shape against it and falls back to the generic routine
/// on mismatch. Executing the plan, the store or the call, is the
/// dispatcher's job; this type only carries the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutCachePlan<'a> {
    /// Store to an existing slot; the shape does not change.
    Replace {
        shape: ObjectShape<'a>,
        offset: PropertyOffset,
    },
    /// Add the property: store to the new slot and move the receiver from
    /// `old_shape` to `new_shape`. Only valid when the receiver arrives
    /// in exactly `old_shape`.
    Transition {
        old_shape: ObjectShape<'a>,
        new_shape: ObjectShape<'a>,
        offset: PropertyOffset,
    },
    /// Call through the setter stored at `offset` instead of storing.
    Setter {
        shape: ObjectShape<'a>,
        offset: PropertyOffset,
    },
    /// Call the custom value trap.
    CustomValue {
        shape: ObjectShape<'a>,
        setter: PutValueFn,
    },
    /// Call the custom trap as a property accessor.
    CustomAccessor {
        shape: ObjectShape<'a>,
        setter: PutValueFn,
    },
}

impl<'a> PutCachePlan<'a> {
    /// Bake a plan from a write slot the generic routine just finalized.
    ///
    /// `pre_write_shape` and `post_write_shape` are the caller's
    /// snapshots of the receiver's shape identity from before and after
    /// the write. Returns None when the site must stay generic for this
    /// occurrence: the slot is unclassified, caching was disabled, the
    /// write traversed an opaque object, or the site originates from
    /// direct eval.
    pub fn from_put_slot(
        slot: &PutPropertySlot<'a>,
        pre_write_shape: ObjectShape<'a>,
        post_write_shape: ObjectShape<'a>,
    ) -> Option<Self> {
        if slot.is_tainted_by_opaque_object() {
            return None;
        }
        if slot.context() == PutContext::ByIdEval {
            // Direct eval sites are transient; a stub there never pays
            // for itself.
            return None;
        }
        if slot.is_cacheable_put() {
            Some(match slot.kind() {
                PutSlotKind::ExistingProperty => {
                    debug_assert_eq!(pre_write_shape, post_write_shape);
                    Self::Replace {
                        shape: post_write_shape,
                        offset: slot.cached_offset(),
                    }
                }
                PutSlotKind::NewProperty => {
                    debug_assert_ne!(pre_write_shape, post_write_shape);
                    Self::Transition {
                        old_shape: pre_write_shape,
                        new_shape: post_write_shape,
                        offset: slot.cached_offset(),
                    }
                }
                _ => unreachable!(),
            })
        } else if slot.is_cacheable_setter() {
            Some(Self::Setter {
                shape: post_write_shape,
                offset: slot.cached_offset(),
            })
        } else if slot.is_cacheable_custom() {
            let setter = slot.custom_setter();
            Some(if slot.is_custom_accessor() {
                Self::CustomAccessor {
                    shape: post_write_shape,
                    setter,
                }
            } else {
                Self::CustomValue {
                    shape: post_write_shape,
                    setter,
                }
            })
        } else {
            None
        }
    }

    /// The shape the fast path guards on: the pre-transition shape for
    /// transition plans, the receiver's shape otherwise.
    pub fn arrival_shape(&self) -> ObjectShape<'a> {
        match self {
            Self::Replace { shape, .. }
            | Self::Setter { shape, .. }
            | Self::CustomValue { shape, .. }
            | Self::CustomAccessor { shape, .. } => *shape,
            Self::Transition { old_shape, .. } => *old_shape,
        }
    }
}

/// Reference to a property-write cache site.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PutCache<'a>(NonZeroU32, PhantomData<&'a GcToken>);

const N: usize = 4;

/// Per-site cache storage: up to `N` arrival shapes with their baked
/// plans, chaining to a follow-up record when full.
#[derive(Debug)]
struct PutCacheRecord<'a> {
    shapes: [Option<ObjectShape<'a>>; N],
    plans: [Option<PutCachePlan<'a>>; N],
    next: Option<PutCache<'a>>,
}

impl<'a> PutCacheRecord<'a> {
    const fn new() -> Self {
        Self {
            shapes: [None; N],
            plans: [None; N],
            next: None,
        }
    }

    fn with_plan(plan: PutCachePlan<'a>) -> Self {
        Self {
            shapes: [Some(plan.arrival_shape()), None, None, None],
            plans: [Some(plan), None, None, None],
            next: None,
        }
    }

    /// Find the plan installed for the given arrival shape.
    fn find(&self, shape: ObjectShape<'a>) -> Option<PutCachePlan<'a>> {
        self.shapes
            .iter()
            .position(|s| *s == Some(shape))
            .and_then(|i| self.plans[i])
    }

    /// Install a plan into the first free entry. Returns None if the
    /// record is full.
    fn insert(&mut self, plan: PutCachePlan<'a>) -> Option<u8> {
        if let Some((i, slot)) = self
            .shapes
            .iter_mut()
            .enumerate()
            .find(|(_, s)| s.is_none())
        {
            *slot = Some(plan.arrival_shape());
            self.plans[i] = Some(plan);
            Some(i as u8)
        } else {
            None
        }
    }
}

/// Store of all property-write cache sites, keyed by property name.
#[derive(Debug)]
pub struct PutCaches<'a> {
    put_cache_lookup_table: HashTable<(PropertyKey<'a>, PutCache<'a>)>,
    put_cache_records: Vec<PutCacheRecord<'a>>,
    hasher: RandomState,
}

impl<'a> PutCaches<'a> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            put_cache_lookup_table: HashTable::with_capacity(capacity),
            put_cache_records: Vec::with_capacity(capacity),
            hasher: RandomState::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.put_cache_records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.put_cache_records.is_empty()
    }

    /// Drop every installed plan that guards on or produces the given
    /// shape. Called when the runtime retires a shape or redefines a
    /// property on it.
    pub fn invalidate_shape(&mut self, shape: ObjectShape<'a>) {
        for record in self.put_cache_records.iter_mut() {
            for (s, plan) in record.shapes.iter_mut().zip(record.plans.iter_mut()) {
                let references_shape = match plan {
                    Some(PutCachePlan::Transition {
                        old_shape,
                        new_shape,
                        ..
                    }) => *old_shape == shape || *new_shape == shape,
                    Some(_) => *s == Some(shape),
                    None => false,
                };
                if references_shape {
                    *s = None;
                    *plan = None;
                }
            }
        }
    }

    fn hash_key(&self, key: PropertyKey<'a>) -> u64 {
        self.hasher.hash_one(key.get_index())
    }
}

impl Default for PutCaches<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> PutCache<'a> {
    /// Get the cache site for the given property name, creating it on
    /// first use.
    pub fn get_or_create(caches: &mut PutCaches<'a>, key: PropertyKey<'a>) -> PutCache<'a> {
        let hash = caches.hash_key(key);
        let PutCaches {
            put_cache_lookup_table,
            put_cache_records,
            hasher,
        } = caches;
        let entry = put_cache_lookup_table.entry(
            hash,
            |(k, _)| *k == key,
            |(k, _)| hasher.hash_one(k.get_index()),
        );
        match entry {
            Entry::Occupied(e) => e.get().1,
            Entry::Vacant(e) => {
                put_cache_records.push(PutCacheRecord::new());
                let cache = PutCache::last(put_cache_records);
                e.insert((key, cache));
                cache
            }
        }
    }

    /// Find the plan installed for the given arrival shape, following the
    /// record chain.
    pub fn find(
        self,
        caches: &PutCaches<'a>,
        shape: ObjectShape<'a>,
    ) -> Option<PutCachePlan<'a>> {
        let record = &caches.put_cache_records[self.get_index()];
        if let Some(plan) = record.find(shape) {
            return Some(plan);
        }
        if let Some(next) = record.next {
            next.find(caches, shape)
        } else {
            None
        }
    }

    /// Install a baked plan at this site, chaining a fresh record when
    /// every entry is taken.
    pub fn install(self, caches: &mut PutCaches<'a>, plan: PutCachePlan<'a>) {
        debug_assert!(self.find(caches, plan.arrival_shape()).is_none());
        let mut cache = self;
        let next_to_create = PutCache::from_index(caches.put_cache_records.len());
        loop {
            let record = &mut caches.put_cache_records[cache.get_index()];
            if record.insert(plan).is_some() {
                return;
            }
            if let Some(next) = record.next {
                cache = next;
                continue;
            }
            record.next = Some(next_to_create);
            caches.put_cache_records.push(PutCacheRecord::with_plan(plan));
            let cache = PutCache::last(&caches.put_cache_records);
            debug_assert_eq!(cache, next_to_create);
            break;
        }
    }

    #[inline(always)]
    fn from_index(index: usize) -> Self {
        Self(
            NonZeroU32::new(u32::try_from(index).unwrap().checked_add(1).unwrap()).unwrap(),
            PhantomData,
        )
    }

    #[inline(always)]
    fn last(records: &[PutCacheRecord<'a>]) -> Self {
        Self(
            NonZeroU32::new(u32::try_from(records.len()).unwrap()).unwrap(),
            PhantomData,
        )
    }

    /// Get the implied usize index of the PutCache reference.
    #[inline(always)]
    pub fn get_index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}
