// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property-write fast path support for the Kestrel engine: the per-site
//! write descriptor filled in by the generic assignment routine, and the
//! shape-guarded caches baked from it.

pub mod ecmascript;
mod engine;
