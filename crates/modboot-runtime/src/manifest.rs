// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Build manifest
//!
//! The build writes the load order as JSON:
//!
//! ```json
//! { "base": "js", "modules": [ { "id": "app/core.js", "sourceMap": true } ] }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{LoaderError, Result};
use crate::module_system::ModuleSpec;
use crate::transport::{is_remote, resolve_location};

/// One module of the load order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestModule {
    /// Module id
    pub id: String,
    /// Path relative to the base; defaults to the id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Whether `<id>.map` exists
    #[serde(default)]
    pub source_map: bool,
}

impl ManifestModule {
    /// Path relative to the base
    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.id)
    }
}

/// Ordered module list plus retrieval base
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// Retrieval base: URL or directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// Modules in load order
    pub modules: Vec<ManifestModule>,
}

impl Manifest {
    /// Parse and validate a manifest
    pub fn parse(json: &str) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(json)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Read a manifest file.
    ///
    /// A relative directory base is resolved against the manifest's own
    /// directory; a missing base means that directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut manifest = Self::parse(&content)?;

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        manifest.base = Some(match manifest.base.take() {
            Some(base) if is_remote(&base) || Path::new(&base).is_absolute() => base,
            Some(base) => dir.join(base).to_string_lossy().into_owned(),
            None => dir.to_string_lossy().into_owned(),
        });

        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for module in &self.modules {
            if module.id.trim().is_empty() {
                return Err(LoaderError::Manifest("module with empty id".to_string()));
            }
            if !seen.insert(module.id.as_str()) {
                return Err(LoaderError::Manifest(format!(
                    "duplicate module id '{}'",
                    module.id
                )));
            }
        }
        Ok(())
    }

    /// Module ids in load order
    pub fn ids(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.id.as_str()).collect()
    }

    /// Look up a module by id
    pub fn module(&self, id: &str) -> Option<&ManifestModule> {
        self.modules.iter().find(|m| m.id == id)
    }

    /// Resolved specs for every module against `base`
    pub fn specs(&self, base: &str) -> Vec<ModuleSpec> {
        self.modules
            .iter()
            .map(|m| ModuleSpec {
                id: m.id.clone(),
                location: resolve_location(base, m.path()),
                has_source_map: m.source_map,
            })
            .collect()
    }
}
