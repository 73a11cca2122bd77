// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::Object;

/// An ECMAScript language value, as seen by the property-write machinery.
///
/// Only the variants the write path needs to carry are represented here;
/// the full numeric and string towers live in the embedding heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value<'a> {
    Undefined,
    Null,
    Boolean(bool),
    Integer(i32),
    Object(Object<'a>),
}

impl Value<'_> {
    pub fn is_undefined(self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_object(self) -> bool {
        matches!(self, Value::Object(_))
    }
}

impl<'a> From<Object<'a>> for Value<'a> {
    fn from(value: Object<'a>) -> Self {
        Value::Object(value)
    }
}

impl<'a> TryFrom<Value<'a>> for Object<'a> {
    type Error = ();

    fn try_from(value: Value<'a>) -> Result<Self, Self::Error> {
        match value {
            Value::Object(object) => Ok(object),
            _ => Err(()),
        }
    }
}
