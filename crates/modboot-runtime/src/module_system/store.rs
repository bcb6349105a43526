// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module record store
//!
//! One store per environment. Records are created on first request and
//! never removed; the store performs no I/O.

use crate::module_system::record::{ModuleRecord, ModuleSpec, ModuleState};
use dashmap::DashMap;

/// Thread-safe module record store
pub struct ModuleStore {
    /// Records keyed by module id
    records: DashMap<String, ModuleRecord>,
}

impl ModuleStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Create a `Requested` record unless one exists.
    ///
    /// Returns true if the record was created by this call.
    pub fn ensure(&self, spec: &ModuleSpec) -> bool {
        let mut created = false;
        self.records.entry(spec.id.clone()).or_insert_with(|| {
            created = true;
            ModuleRecord::requested(spec)
        });
        created
    }

    /// Snapshot of a record
    pub fn get(&self, id: &str) -> Option<ModuleRecord> {
        self.records.get(id).map(|entry| entry.clone())
    }

    /// Current state of a record
    pub fn state(&self, id: &str) -> Option<ModuleState> {
        self.records.get(id).map(|entry| entry.state.clone())
    }

    /// Check if a record exists
    pub fn has(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// True once the module is `Evaluated`; false for unknown ids and
    /// every other state.
    pub fn is_loaded(&self, id: &str) -> bool {
        self.records
            .get(id)
            .map(|entry| entry.is_loaded())
            .unwrap_or(false)
    }

    /// Force a module to `Evaluated` without retrieving or evaluating it.
    ///
    /// Used when the host loaded the module through another path.
    pub fn mark_loaded(&self, id: &str) {
        self.force(id, ModuleState::Evaluated);
    }

    /// Apply a regular forward transition; see [`ModuleRecord::advance`].
    pub fn advance(&self, id: &str, next: ModuleState) -> bool {
        self.records
            .get_mut(id)
            .map(|mut entry| entry.advance(next))
            .unwrap_or(false)
    }

    /// Set a state unconditionally, creating a bare record if needed.
    ///
    /// Reserved for `set_loaded` and out-of-band (hot) evaluation.
    pub(crate) fn force(&self, id: &str, state: ModuleState) {
        self.records
            .entry(id.to_string())
            .and_modify(|entry| entry.state = state.clone())
            .or_insert_with(|| ModuleRecord {
                id: id.to_string(),
                location: id.to_string(),
                has_source_map: false,
                state,
            });
    }

    /// All known module ids
    pub fn ids(&self) -> Vec<String> {
        self.records.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Get the number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for ModuleStore {
    fn default() -> Self {
        Self::new()
    }
}
