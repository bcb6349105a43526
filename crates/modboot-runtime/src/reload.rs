// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Live reload
//!
//! Watches the retrieval base directory and turns writes to files listed in
//! the manifest into hot updates for `eval_load`.

use crate::error::{LoaderError, Result};
use crate::manifest::Manifest;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// New code for a module that changed on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotUpdate {
    /// Module id
    pub module: String,
    /// Changed file
    pub path: PathBuf,
    /// Whether the module has a source map
    pub has_source_map: bool,
    /// File content after the change
    pub code: String,
}

/// Maps watched files back to module ids
#[derive(Debug, Clone, Default)]
pub struct ModuleIndex {
    by_path: HashMap<PathBuf, (String, bool)>,
}

impl ModuleIndex {
    /// Index every manifest module under `base_dir`
    pub fn new(base_dir: &Path, manifest: &Manifest) -> Self {
        let by_path = manifest
            .modules
            .iter()
            .map(|m| (base_dir.join(m.path()), (m.id.clone(), m.source_map)))
            .collect();
        Self { by_path }
    }

    /// Module id and source-map flag for a file, if it is a module
    pub fn module_for_path(&self, path: &Path) -> Option<(&str, bool)> {
        self.by_path
            .get(path)
            .map(|(id, source_map)| (id.as_str(), *source_map))
    }

    /// Number of indexed modules
    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    /// Check if nothing is indexed
    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}

/// File watcher over the base directory
pub struct ModuleWatcher {
    _watcher: RecommendedWatcher,
    events: mpsc::UnboundedReceiver<PathBuf>,
    index: ModuleIndex,
}

impl ModuleWatcher {
    /// Start watching `base_dir` recursively
    pub fn new(base_dir: &Path, manifest: &Manifest) -> Result<Self> {
        let base_dir = base_dir.canonicalize().map_err(|e| {
            LoaderError::config(format!("cannot watch {}: {}", base_dir.display(), e))
        })?;
        let index = ModuleIndex::new(&base_dir, manifest);

        let (tx, events) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) => {
                for path in event.paths {
                    let _ = tx.send(path);
                }
            }
            Ok(_) => {}
            Err(e) => warn!("watch error: {}", e),
        })?;
        watcher.watch(&base_dir, RecursiveMode::Recursive)?;
        debug!(dir = %base_dir.display(), modules = index.len(), "watching for changes");

        Ok(Self {
            _watcher: watcher,
            events,
            index,
        })
    }

    /// Wait for the next change to a manifest module.
    ///
    /// Changes to other files are skipped. Returns `None` once the watcher
    /// stops.
    pub async fn next_update(&mut self) -> Option<HotUpdate> {
        while let Some(path) = self.events.recv().await {
            let Some((module, has_source_map)) = self.index.module_for_path(&path) else {
                continue;
            };
            match tokio::fs::read_to_string(&path).await {
                Ok(code) => {
                    return Some(HotUpdate {
                        module: module.to_string(),
                        path,
                        has_source_map,
                        code,
                    });
                }
                Err(e) => warn!("cannot read {}: {}", path.display(), e),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> Manifest {
        Manifest::parse(
            r#"{"modules":[{"id":"a.js","sourceMap":true},{"id":"b","path":"lib/b.js"}]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_module_for_path() {
        let index = ModuleIndex::new(Path::new("/srv/out"), &manifest());
        assert_eq!(index.module_for_path(Path::new("/srv/out/a.js")), Some(("a.js", true)));
        assert_eq!(index.module_for_path(Path::new("/srv/out/lib/b.js")), Some(("b", false)));
        assert_eq!(index.module_for_path(Path::new("/srv/out/b")), None);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_watch_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            ModuleWatcher::new(&missing, &manifest()),
            Err(LoaderError::Config(_))
        ));
    }
}
