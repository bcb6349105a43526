// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Execution scope and root discovery

use modboot_engine::{ObjectRef, Value};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Name the scope holder is bound to inside every wrapped unit
pub const SCOPE_BINDING: &str = "$ROOTS";

static DECLARE_ROOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"declare-root\(\s*["']([^"']+)["']\s*\)"#).expect("declare-root pattern")
});

/// Known root names in first-seen order. Only grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootTable {
    names: Vec<String>,
}

impl RootTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root; returns false if it was already known
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.names.push(name);
        true
    }

    /// Check if a root is known
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Iterate root names in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Number of roots
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if no root is known
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Root names declared by `source`, in order of first appearance.
///
/// A root is the first segment of a declared dotted path. Paths whose first
/// segment is not an identifier, or is a keyword, are ignored; evaluation
/// reports them.
pub fn declared_roots(source: &str) -> Vec<String> {
    let mut table = RootTable::new();
    for cap in DECLARE_ROOT.captures_iter(source) {
        let Some(path) = cap.get(1) else { continue };
        let Some(first) = path.as_str().split('.').next() else {
            continue;
        };
        if modboot_engine::is_identifier(first)
            && !modboot_engine::is_keyword(first)
            && first != SCOPE_BINDING
        {
            table.insert(first);
        }
    }
    table.names
}

/// The private scope every module of one loader evaluates against.
///
/// Each root lives as a property of the holder object, which wrapped units
/// see as `$ROOTS`.
#[derive(Debug, Clone, Default)]
pub struct ExecutionScope {
    holder: ObjectRef,
    roots: RootTable,
}

impl ExecutionScope {
    /// Create a scope with no roots
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every root `source` declares that is not known yet.
    ///
    /// Each new root gets a fresh empty container. Returns the new names.
    pub fn discover_roots(&mut self, source: &str) -> Vec<String> {
        let mut added = Vec::new();
        for name in declared_roots(source) {
            if self.roots.insert(name.clone()) {
                debug!(root = %name, "registered namespace root");
                self.holder.set(name.clone(), Value::Object(ObjectRef::new()));
                added.push(name);
            }
        }
        added
    }

    /// Known roots
    pub fn roots(&self) -> &RootTable {
        &self.roots
    }

    /// The object holding every root container
    pub fn holder(&self) -> &ObjectRef {
        &self.holder
    }

    /// Container of a root
    pub fn root(&self, name: &str) -> Option<ObjectRef> {
        self.holder.get(name).and_then(|value| value.as_object().cloned())
    }
}
