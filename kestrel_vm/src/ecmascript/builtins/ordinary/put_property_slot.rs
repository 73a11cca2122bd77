// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::ecmascript::types::{Object, PropertyKey, Value};

use super::shape::PropertyOffset;

/// Typed trampoline for a custom property write, supplied by the embedding
/// runtime's function-reference table.
///
/// Called with the setter receiver, the value being assigned, and the
/// property name; returns whether the write succeeded.
pub type PutValueFn = for<'a> fn(Value<'a>, Value<'a>, PropertyKey<'a>) -> bool;

/// How a property write landed, as observed by the generic write routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutSlotKind {
    /// The write has not been classified, or cannot be specialized.
    Uncacheable,
    /// The property already existed at a stable slot on an unchanged
    /// shape.
    ExistingProperty,
    /// The write added the property, transitioning the receiver's shape.
    NewProperty,
    /// The write dispatched through a setter stored in an accessor slot.
    SetterProperty,
    /// The write dispatched to a custom value trap.
    CustomValue,
    /// The write dispatched to an accessor-style custom trap.
    CustomAccessor,
}

/// Syntactic origin of a property write site.
///
/// Refines caching policy only; it never changes what the write does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutContext {
    Unknown,
    ById,
    ByIdEval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cacheability {
    Allowed,
    Disallowed,
}

/// Classification state; payload fields live only in the variant that
/// defines them, so a stale offset or setter cannot be observed.
#[derive(Debug, Clone, Copy)]
enum PutRecord<'a> {
    Uncacheable,
    ExistingProperty {
        base: Object<'a>,
        offset: PropertyOffset,
    },
    NewProperty {
        base: Object<'a>,
        offset: PropertyOffset,
    },
    SetterProperty {
        base: Object<'a>,
        offset: PropertyOffset,
    },
    CustomValue {
        base: Object<'a>,
        setter: PutValueFn,
    },
    CustomAccessor {
        base: Object<'a>,
        setter: PutValueFn,
    },
}

/// Record of how one property assignment resolved.
///
/// The generic write routine fills one of these in while performing a
/// property assignment; the inline-cache machinery then reads it to decide
/// whether the site can be specialized. A slot lives on the stack for the
/// duration of a single write, is classified by exactly one `record_*`
/// call, and is never shared between writes or threads.
#[derive(Debug)]
pub struct PutPropertySlot<'a> {
    this_value: Value<'a>,
    record: PutRecord<'a>,
    context: PutContext,
    is_strict_mode: bool,
    is_initialization: bool,
    is_tainted_by_opaque_object: bool,
    cacheability: Cacheability,
}

impl<'a> PutPropertySlot<'a> {
    pub fn new(
        this_value: Value<'a>,
        is_strict_mode: bool,
        context: PutContext,
        is_initialization: bool,
    ) -> Self {
        Self {
            this_value,
            record: PutRecord::Uncacheable,
            context,
            is_strict_mode,
            is_initialization,
            is_tainted_by_opaque_object: false,
            cacheability: Cacheability::Allowed,
        }
    }

    /// Record a write to a property that already exists at a stable slot
    /// on an unchanged shape.
    pub fn record_existing_property_write(&mut self, base: Object<'a>, offset: PropertyOffset) {
        debug_assert!(matches!(self.record, PutRecord::Uncacheable));
        debug_assert!(offset.is_valid());
        self.record = PutRecord::ExistingProperty { base, offset };
    }

    /// Record a write that added the property, transitioning the receiver
    /// to a new shape.
    ///
    /// A cache built from this slot must check the receiver against the
    /// pre-write shape, not the shape the write produced: the cached
    /// transition is only valid for objects arriving in the source shape.
    pub fn record_new_property_write(&mut self, base: Object<'a>, offset: PropertyOffset) {
        debug_assert!(matches!(self.record, PutRecord::Uncacheable));
        debug_assert!(offset.is_valid());
        self.record = PutRecord::NewProperty { base, offset };
    }

    /// Record a write that dispatched through a setter function stored at
    /// an accessor slot. The offset addresses the accessor pair, not the
    /// value being assigned.
    pub fn record_cacheable_setter_write(&mut self, base: Object<'a>, offset: PropertyOffset) {
        debug_assert!(matches!(self.record, PutRecord::Uncacheable));
        debug_assert!(offset.is_valid());
        self.record = PutRecord::SetterProperty { base, offset };
    }

    /// Record a write handled by a non-accessor custom trap, e.g. a
    /// reflected attribute setter.
    pub fn record_custom_value_write(&mut self, base: Object<'a>, setter: PutValueFn) {
        debug_assert!(matches!(self.record, PutRecord::Uncacheable));
        self.record = PutRecord::CustomValue { base, setter };
    }

    /// Record a write handled by a custom trap invoked as a property
    /// accessor.
    pub fn record_custom_accessor_write(&mut self, base: Object<'a>, setter: PutValueFn) {
        debug_assert!(matches!(self.record, PutRecord::Uncacheable));
        self.record = PutRecord::CustomAccessor { base, setter };
    }

    /// Forbid specializing this site for the current occurrence.
    ///
    /// Idempotent, callable before or after classification; overrides the
    /// recorded kind for caching purposes either way.
    pub fn disable_caching(&mut self) {
        self.cacheability = Cacheability::Disallowed;
    }

    /// Note that the write traversed a proxy or other exotic object whose
    /// behavior cannot be predicted from shape alone.
    ///
    /// Sticky for the life of the slot; leaves the recorded kind
    /// untouched but suppresses cache generation.
    pub fn mark_tainted_by_opaque_object(&mut self) {
        self.is_tainted_by_opaque_object = true;
    }

    /// Replace the setter receiver.
    ///
    /// Prototype-chain walks call this when the object holding the
    /// property is not the one being assigned through.
    pub fn set_this_value(&mut self, this_value: Value<'a>) {
        self.this_value = this_value;
    }

    pub fn kind(&self) -> PutSlotKind {
        match self.record {
            PutRecord::Uncacheable => PutSlotKind::Uncacheable,
            PutRecord::ExistingProperty { .. } => PutSlotKind::ExistingProperty,
            PutRecord::NewProperty { .. } => PutSlotKind::NewProperty,
            PutRecord::SetterProperty { .. } => PutSlotKind::SetterProperty,
            PutRecord::CustomValue { .. } => PutSlotKind::CustomValue,
            PutRecord::CustomAccessor { .. } => PutSlotKind::CustomAccessor,
        }
    }

    pub fn context(&self) -> PutContext {
        self.context
    }

    /// The object the write landed on, once classified.
    pub fn base(&self) -> Option<Object<'a>> {
        match self.record {
            PutRecord::Uncacheable => None,
            PutRecord::ExistingProperty { base, .. }
            | PutRecord::NewProperty { base, .. }
            | PutRecord::SetterProperty { base, .. }
            | PutRecord::CustomValue { base, .. }
            | PutRecord::CustomAccessor { base, .. } => Some(base),
        }
    }

    pub fn this_value(&self) -> Value<'a> {
        self.this_value
    }

    pub fn is_strict_mode(&self) -> bool {
        self.is_strict_mode
    }

    pub fn is_initialization(&self) -> bool {
        self.is_initialization
    }

    pub fn is_tainted_by_opaque_object(&self) -> bool {
        self.is_tainted_by_opaque_object
    }

    /// The slot the write landed in, or the sentinel for kinds that carry
    /// no offset.
    pub fn cached_offset(&self) -> PropertyOffset {
        match self.record {
            PutRecord::ExistingProperty { offset, .. }
            | PutRecord::NewProperty { offset, .. }
            | PutRecord::SetterProperty { offset, .. } => offset,
            PutRecord::Uncacheable
            | PutRecord::CustomValue { .. }
            | PutRecord::CustomAccessor { .. } => PropertyOffset::INVALID,
        }
    }

    /// The custom trampoline the write dispatched to.
    ///
    /// Only meaningful on the custom kinds. The trampoline stays readable
    /// after `disable_caching`, which kills the predicates but not the
    /// classification.
    pub fn custom_setter(&self) -> PutValueFn {
        match self.record {
            PutRecord::CustomValue { setter, .. } | PutRecord::CustomAccessor { setter, .. } => {
                setter
            }
            _ => unreachable!("custom setter queried on a non-custom write"),
        }
    }

    fn is_cacheable(&self) -> bool {
        self.cacheability == Cacheability::Allowed
    }

    /// Returns true if the write can be specialized into a direct store,
    /// replacing or transitioning.
    pub fn is_cacheable_put(&self) -> bool {
        self.is_cacheable()
            && matches!(
                self.record,
                PutRecord::ExistingProperty { .. } | PutRecord::NewProperty { .. }
            )
    }

    /// Returns true if the write can be specialized into a call through a
    /// stored setter.
    pub fn is_cacheable_setter(&self) -> bool {
        self.is_cacheable() && matches!(self.record, PutRecord::SetterProperty { .. })
    }

    /// Returns true if the write can be specialized into a custom trap
    /// call. Trampoline presence is structural on the custom kinds.
    pub fn is_cacheable_custom(&self) -> bool {
        self.is_cacheable()
            && matches!(
                self.record,
                PutRecord::CustomValue { .. } | PutRecord::CustomAccessor { .. }
            )
    }

    /// Returns true if the specialized call must be made accessor-style.
    pub fn is_custom_accessor(&self) -> bool {
        self.is_cacheable() && matches!(self.record, PutRecord::CustomAccessor { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reflected_put<'a>(_this: Value<'a>, _value: Value<'a>, _key: PropertyKey<'a>) -> bool {
        true
    }

    fn host_put<'a>(_this: Value<'a>, _value: Value<'a>, _key: PropertyKey<'a>) -> bool {
        false
    }

    fn offset(index: u32) -> PropertyOffset {
        PropertyOffset::new(index).unwrap()
    }

    #[test]
    fn fresh_slot_is_unclassified() {
        let slot = PutPropertySlot::new(Value::Undefined, false, PutContext::Unknown, false);
        assert_eq!(slot.kind(), PutSlotKind::Uncacheable);
        assert_eq!(slot.base(), None);
        assert!(slot.cached_offset().is_invalid());
        assert!(!slot.is_cacheable_put());
        assert!(!slot.is_cacheable_setter());
        assert!(!slot.is_cacheable_custom());
        assert!(!slot.is_custom_accessor());
        assert!(!slot.is_tainted_by_opaque_object());
    }

    #[test]
    fn existing_property_write_is_cacheable() {
        let obj = Object::from_index(0);
        let mut slot = PutPropertySlot::new(obj.into(), true, PutContext::ById, false);
        slot.record_existing_property_write(obj, offset(3));
        assert_eq!(slot.kind(), PutSlotKind::ExistingProperty);
        assert_eq!(slot.cached_offset().get(), 3);
        assert_eq!(slot.base(), Some(obj));
        assert_eq!(slot.context(), PutContext::ById);
        assert!(slot.is_cacheable_put());
        assert!(slot.is_strict_mode());
        assert!(!slot.is_cacheable_setter());
        assert!(!slot.is_cacheable_custom());
    }

    #[test]
    fn new_property_write_is_cacheable() {
        let obj = Object::from_index(4);
        let mut slot = PutPropertySlot::new(obj.into(), false, PutContext::ById, false);
        slot.record_new_property_write(obj, offset(0));
        assert_eq!(slot.kind(), PutSlotKind::NewProperty);
        assert_eq!(slot.cached_offset().get(), 0);
        assert!(slot.is_cacheable_put());
    }

    #[test]
    fn setter_write_is_cacheable_setter_only() {
        let obj = Object::from_index(1);
        let mut slot = PutPropertySlot::new(obj.into(), false, PutContext::Unknown, false);
        slot.record_cacheable_setter_write(obj, offset(2));
        assert_eq!(slot.kind(), PutSlotKind::SetterProperty);
        assert_eq!(slot.cached_offset().get(), 2);
        assert!(slot.is_cacheable_setter());
        assert!(!slot.is_cacheable_put());
        assert!(!slot.is_cacheable_custom());
    }

    #[test]
    fn custom_value_write_keeps_its_trampoline() {
        let obj = Object::from_index(1);
        let mut slot = PutPropertySlot::new(obj.into(), false, PutContext::Unknown, false);
        slot.record_custom_value_write(obj, reflected_put);
        assert_eq!(slot.kind(), PutSlotKind::CustomValue);
        assert!(slot.is_cacheable_custom());
        assert!(!slot.is_custom_accessor());
        assert!(slot.cached_offset().is_invalid());
        assert!(std::ptr::fn_addr_eq(
            slot.custom_setter(),
            reflected_put as PutValueFn
        ));
        assert!(!std::ptr::fn_addr_eq(
            slot.custom_setter(),
            host_put as PutValueFn
        ));
    }

    #[test]
    fn disabling_caching_keeps_custom_accessor_readable() {
        let obj = Object::from_index(7);
        let mut slot = PutPropertySlot::new(obj.into(), false, PutContext::ById, false);
        slot.record_custom_accessor_write(obj, host_put);
        slot.disable_caching();
        assert_eq!(slot.kind(), PutSlotKind::CustomAccessor);
        assert!(std::ptr::fn_addr_eq(
            slot.custom_setter(),
            host_put as PutValueFn
        ));
        assert!(!slot.is_cacheable_custom());
        assert!(!slot.is_custom_accessor());
    }

    #[test]
    fn disabling_caching_before_classification_sticks() {
        let obj = Object::from_index(2);
        let mut slot = PutPropertySlot::new(obj.into(), false, PutContext::ById, false);
        slot.disable_caching();
        slot.record_existing_property_write(obj, offset(1));
        assert_eq!(slot.kind(), PutSlotKind::ExistingProperty);
        assert_eq!(slot.cached_offset().get(), 1);
        assert!(!slot.is_cacheable_put());
    }

    #[test]
    fn disabling_caching_is_idempotent() {
        let obj = Object::from_index(2);
        let mut slot = PutPropertySlot::new(obj.into(), false, PutContext::ById, false);
        slot.record_existing_property_write(obj, offset(1));
        slot.disable_caching();
        slot.disable_caching();
        assert!(!slot.is_cacheable_put());
    }

    #[test]
    fn opaque_object_taint_is_sticky() {
        let obj = Object::from_index(3);
        let mut slot = PutPropertySlot::new(obj.into(), false, PutContext::ById, false);
        slot.mark_tainted_by_opaque_object();
        assert!(slot.is_tainted_by_opaque_object());
        slot.record_existing_property_write(obj, offset(0));
        slot.mark_tainted_by_opaque_object();
        assert!(slot.is_tainted_by_opaque_object());
        // Taint does not touch the classification itself.
        assert_eq!(slot.kind(), PutSlotKind::ExistingProperty);
        assert!(slot.is_cacheable_put());
    }

    #[test]
    fn construction_flags_are_observable() {
        let slot = PutPropertySlot::new(Value::Null, true, PutContext::ByIdEval, true);
        assert!(slot.is_strict_mode());
        assert!(slot.is_initialization());
        assert_eq!(slot.context(), PutContext::ByIdEval);
        assert_eq!(slot.this_value(), Value::Null);
    }

    #[test]
    fn this_value_can_be_replaced_mid_walk() {
        let holder = Object::from_index(0);
        let receiver = Object::from_index(1);
        let mut slot = PutPropertySlot::new(holder.into(), false, PutContext::ById, false);
        slot.set_this_value(receiver.into());
        slot.record_cacheable_setter_write(holder, offset(0));
        assert_eq!(slot.this_value(), Value::Object(receiver));
        assert_eq!(slot.base(), Some(holder));
    }
}
