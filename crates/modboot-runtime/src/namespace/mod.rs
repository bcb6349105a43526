// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Namespace virtualization
//!
//! Compiled modules refer to symbolic roots (`app`, `lib`, ...). Instead of
//! hanging those off the host's global object, the loader keeps them in one
//! private [`ExecutionScope`] and wraps every body so its root references
//! resolve there.

mod engine;
mod scope;
mod wrap;

pub use engine::{ScriptEngine, ScriptError};
pub use scope::{ExecutionScope, RootTable, SCOPE_BINDING, declared_roots};
pub use wrap::{
    DEFAULT_COMPAT_ALIAS, DEFAULT_SOURCE_MAP_SUFFIX, ExecutableUnit, SourceInfo, WrapOptions,
    evaluate, wrap,
};

use crate::error::EvaluationError;
use tracing::trace;

/// Discover, wrap and evaluate against one shared scope
#[derive(Debug, Default)]
pub struct NamespaceLayer {
    scope: ExecutionScope,
    options: WrapOptions,
}

impl NamespaceLayer {
    /// Create a layer with an empty scope
    pub fn new(options: WrapOptions) -> Self {
        Self {
            scope: ExecutionScope::new(),
            options,
        }
    }

    /// Evaluate one module body.
    ///
    /// Blank bodies are not executed. New roots are registered before the
    /// body runs, so a module may declare and use a root in one go.
    pub fn load_module(
        &mut self,
        engine: &mut dyn ScriptEngine,
        info: &SourceInfo,
        body: &str,
    ) -> Result<(), EvaluationError> {
        if body.trim().is_empty() {
            trace!(module = %info.module, "empty module body");
            return Ok(());
        }

        self.scope.discover_roots(body);
        let unit = wrap(body, self.scope.roots(), info, &self.options);
        evaluate(engine, &unit, &self.scope)
    }

    /// The shared scope
    pub fn scope(&self) -> &ExecutionScope {
        &self.scope
    }

    /// Wrapping settings
    pub fn options(&self) -> &WrapOptions {
        &self.options
    }
}
