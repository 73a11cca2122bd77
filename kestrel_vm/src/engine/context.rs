// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// # ZST type representing access to the garbage collector.
///
/// Heap handles bind their lifetime to a borrow of this token; a handle
/// must not outlive the call that produced it. The collector itself lives
/// in the embedding runtime.
// Note: non-exhaustive to make sure this is not constructable on the outside.
#[non_exhaustive]
#[derive(Debug)]
pub(crate) struct GcToken;
