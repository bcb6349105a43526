// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Unit-script value representation.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A unit-script value.
///
/// Values are thread-safe; objects are shared by reference so a container
/// handed to one module body is the same container every later body sees.
#[derive(Debug, Clone)]
pub enum Value {
    /// undefined
    Undefined,
    /// null
    Null,
    /// Boolean value
    Boolean(bool),
    /// Number (IEEE 754 double)
    Number(f64),
    /// String
    String(String),
    /// Object reference
    Object(ObjectRef),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => ObjectRef::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    /// Returns true if this value is undefined.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns the object reference if this value is an object.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Returns the JavaScript-style type name.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) => "object",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e21 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::Object(_) => write!(f, "[object Object]"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

/// A shared, mutable property bag.
#[derive(Clone, Default)]
pub struct ObjectRef(Arc<RwLock<BTreeMap<String, Value>>>);

impl ObjectRef {
    /// Creates a fresh empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a property.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.read().get(key).cloned()
    }

    /// Writes a property, returning the previous value.
    pub fn set(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.write().insert(key.into(), value)
    }

    /// Returns true if the property exists.
    pub fn has(&self, key: &str) -> bool {
        self.0.read().contains_key(key)
    }

    /// Returns the object at `key`, creating an empty one when absent.
    ///
    /// Returns `None` when the property holds a non-object value.
    pub fn get_or_insert_object(&self, key: &str) -> Option<ObjectRef> {
        let mut props = self.0.write();
        match props.get(key) {
            Some(Value::Object(obj)) => Some(obj.clone()),
            Some(_) => None,
            None => {
                let obj = ObjectRef::new();
                props.insert(key.to_string(), Value::Object(obj.clone()));
                Some(obj)
            }
        }
    }

    /// Property names in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.0.read().keys().cloned().collect()
    }

    /// Number of own properties.
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// Returns true if the object has no properties.
    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Identity comparison.
    pub fn ptr_eq(a: &ObjectRef, b: &ObjectRef) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl fmt::Debug for ObjectRef {
    // Shallow on purpose: objects may reference themselves.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_objects_are_shared_by_reference() {
        let a = ObjectRef::new();
        let b = a.clone();
        b.set("x", Value::Number(1.0));
        assert_eq!(a.get("x"), Some(Value::Number(1.0)));
        assert!(ObjectRef::ptr_eq(&a, &b));
        assert_ne!(Value::Object(a), Value::Object(ObjectRef::new()));
    }

    #[test]
    fn test_get_or_insert_object() {
        let root = ObjectRef::new();
        let child = root.get_or_insert_object("core").unwrap();
        let again = root.get_or_insert_object("core").unwrap();
        assert!(ObjectRef::ptr_eq(&child, &again));

        root.set("name", Value::from("x"));
        assert!(root.get_or_insert_object("name").is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::from("hi").to_string(), "hi");
        assert_eq!(Value::Object(ObjectRef::new()).to_string(), "[object Object]");
    }
}
