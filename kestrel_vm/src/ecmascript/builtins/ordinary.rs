// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod caches;
mod put_property_slot;
mod shape;

pub use caches::{PutCache, PutCachePlan, PutCaches};
pub use put_property_slot::{PutContext, PutPropertySlot, PutSlotKind, PutValueFn};
pub use shape::{ObjectShape, PropertyOffset, ShapeProbe};

use crate::ecmascript::types::Object;

/// Classify an ordinary property write from the shape table's probe
/// answer.
///
/// A hit at a stable slot records an existing-property write, a placement
/// that transitions the shape records a new-property write, and anything
/// else leaves the slot unclassified so the site stays generic. The store
/// itself is the caller's job.
pub fn ordinary_record_put<'a>(
    slot: &mut PutPropertySlot<'a>,
    base: Object<'a>,
    probe: ShapeProbe,
) {
    if probe.offset().is_invalid() {
        // Slot index beyond the cacheable range.
        return;
    }
    if probe.exists() {
        debug_assert!(!probe.requires_transition());
        slot.record_existing_property_write(base, probe.offset());
    } else if probe.requires_transition() {
        slot.record_new_property_write(base, probe.offset());
    }
    // Otherwise the table could not place the property.
}
