// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::{marker::PhantomData, num::NonZeroU32};

use crate::engine::context::GcToken;

/// Reference to an interned property name.
///
/// Names are interned by the embedding heap; equal references mean equal
/// names.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyKey<'a>(NonZeroU32, PhantomData<&'a GcToken>);

impl PropertyKey<'_> {
    /// Create a property key reference from its intern-table index.
    #[inline(always)]
    pub fn from_index(index: u32) -> Self {
        Self(
            NonZeroU32::new(index.checked_add(1).unwrap()).unwrap(),
            PhantomData,
        )
    }

    /// Get the implied usize index of the PropertyKey reference.
    #[inline(always)]
    pub fn get_index(self) -> usize {
        self.0.get().wrapping_sub(1) as usize
    }
}
