// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::{marker::PhantomData, num::NonZeroU32};

use crate::engine::context::GcToken;

/// Identity of an Object Shape.
///
/// The shape table that assigns slots and tracks transitions lives in the
/// embedding runtime; this crate only holds shape identities and compares
/// them when deciding whether a cached fast path applies.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectShape<'a>(NonZeroU32, PhantomData<&'a GcToken>);

impl ObjectShape<'_> {
    /// Create an Object Shape reference from its table index.
    #[inline(always)]
    pub fn from_index(index: u32) -> Self {
        Self(
            NonZeroU32::new(index.checked_add(1).unwrap()).unwrap(),
            PhantomData,
        )
    }

    /// Get the implied usize index of the ObjectShape reference.
    #[inline(always)]
    pub fn get_index(self) -> usize {
        self.0.get().wrapping_sub(1) as usize
    }
}

/// Slot index of a property in an object's property storage.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyOffset(i16);

impl PropertyOffset {
    /// Sentinel offset for writes that resolved to no stable slot.
    pub const INVALID: Self = Self(i16::MIN);

    /// Create a new property offset.
    ///
    /// Returns None if the offset is beyond supported limits; a write
    /// landing there is simply not cached.
    #[inline(always)]
    pub fn new(offset: u32) -> Option<Self> {
        Some(Self(i16::try_from(offset).ok()?))
    }

    /// Returns true if this is the sentinel offset.
    #[inline(always)]
    pub fn is_invalid(self) -> bool {
        self == Self::INVALID
    }

    /// Returns true if this offset addresses a real slot.
    #[inline(always)]
    pub fn is_valid(self) -> bool {
        !self.is_invalid()
    }

    /// Returns the slot index this offset addresses.
    #[inline(always)]
    pub fn get(self) -> u16 {
        debug_assert!(self.is_valid());
        self.0 as u16
    }
}

/// Answer from the shape table for a property name on a receiver: whether
/// the property already exists, which slot the write lands in, and whether
/// placing it moves the receiver to a new shape.
///
/// A probe is never both existing and transitioning; the constructors are
/// the only way to build one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeProbe {
    exists: bool,
    offset: PropertyOffset,
    requires_transition: bool,
}

impl ShapeProbe {
    /// Probe result for a property present at a stable slot.
    pub fn existing(offset: PropertyOffset) -> Self {
        Self {
            exists: true,
            offset,
            requires_transition: false,
        }
    }

    /// Probe result for a property whose addition transitions the shape.
    pub fn transition(offset: PropertyOffset) -> Self {
        Self {
            exists: false,
            offset,
            requires_transition: true,
        }
    }

    /// Probe result for a property the table could not place.
    pub fn absent() -> Self {
        Self {
            exists: false,
            offset: PropertyOffset::INVALID,
            requires_transition: false,
        }
    }

    pub fn exists(self) -> bool {
        self.exists
    }

    pub fn offset(self) -> PropertyOffset {
        self.offset
    }

    pub fn requires_transition(self) -> bool {
        self.requires_transition
    }
}
