// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::{marker::PhantomData, num::NonZeroU32};

use crate::engine::context::GcToken;

mod property_key;

pub use property_key::PropertyKey;

/// Reference to an object on the embedding heap.
///
/// Objects are minted by the heap and handed to this crate by the generic
/// write routine; the write machinery only ever compares them for
/// identity. The reference must not outlive the write call it was handed
/// to.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Object<'a>(NonZeroU32, PhantomData<&'a GcToken>);

impl Object<'_> {
    /// Create an object reference from its heap index.
    #[inline(always)]
    pub fn from_index(index: u32) -> Self {
        Self(
            NonZeroU32::new(index.checked_add(1).unwrap()).unwrap(),
            PhantomData,
        )
    }

    /// Get the implied usize index of the Object reference.
    #[inline(always)]
    pub fn get_index(self) -> usize {
        self.0.get().wrapping_sub(1) as usize
    }
}
