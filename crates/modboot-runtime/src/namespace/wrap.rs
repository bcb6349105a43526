// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Unit wrapping
//!
//! A wrapped unit is laid out as
//!
//! ```text
//! // modboot unit                      <- header
//! var $BASE = $ROOTS;                  <- one line per compatibility alias
//! var app = $ROOTS.app;                <- one line per known root
//! ...module body...
//! //# sourceURL=<location>
//! //# sourceMappingURL=<id>.map        <- only with a source map
//! ```
//!
//! Every preamble entry takes exactly one line, so engine positions map back
//! to the body by subtracting `line_offset`.

use super::engine::ScriptEngine;
use super::scope::{ExecutionScope, RootTable, SCOPE_BINDING};
use crate::error::EvaluationError;

const HEADER: &str = "// modboot unit";

/// Alias the base layer expects to find bound to the scope holder
pub const DEFAULT_COMPAT_ALIAS: &str = "$BASE";

/// Default source map suffix
pub const DEFAULT_SOURCE_MAP_SUFFIX: &str = ".map";

/// Loader-wide wrapping settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapOptions {
    /// Extra names bound to the whole scope holder
    pub compat_aliases: Vec<String>,
    /// Appended to the module id to form the source map reference
    pub source_map_suffix: String,
}

impl Default for WrapOptions {
    fn default() -> Self {
        Self {
            compat_aliases: vec![DEFAULT_COMPAT_ALIAS.to_string()],
            source_map_suffix: DEFAULT_SOURCE_MAP_SUFFIX.to_string(),
        }
    }
}

/// Where a body came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    /// Module id
    pub module: String,
    /// Location reported in the `sourceURL` trailer
    pub source_url: String,
    /// Whether to emit a `sourceMappingURL` trailer
    pub has_source_map: bool,
}

/// Module body ready for the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableUnit {
    /// Module id
    pub module: String,
    /// Preamble, body and trailers
    pub source: String,
    /// Number of preamble lines before the body
    pub line_offset: usize,
}

/// Wrap `body` so that every root in `roots` resolves against the scope.
pub fn wrap(body: &str, roots: &RootTable, info: &SourceInfo, options: &WrapOptions) -> ExecutableUnit {
    let mut source = String::with_capacity(body.len() + 64 * (roots.len() + 2));
    let mut line_offset = 1;
    source.push_str(HEADER);
    source.push('\n');

    for alias in &options.compat_aliases {
        source.push_str(&format!("var {} = {};\n", alias, SCOPE_BINDING));
        line_offset += 1;
    }
    // An alias already binds the whole holder under that name
    for root in roots
        .iter()
        .filter(|root| !options.compat_aliases.iter().any(|alias| alias == root))
    {
        source.push_str(&format!("var {} = {}.{};\n", root, SCOPE_BINDING, root));
        line_offset += 1;
    }

    source.push_str(body);
    source.push_str("\n//# sourceURL=");
    source.push_str(&info.source_url);
    if info.has_source_map {
        source.push_str("\n//# sourceMappingURL=");
        source.push_str(&info.module);
        source.push_str(&options.source_map_suffix);
    }
    source.push('\n');

    ExecutableUnit {
        module: info.module.clone(),
        source,
        line_offset,
    }
}

/// Run a wrapped unit against `scope`.
///
/// Failures come back annotated with the module id and a position in the
/// unwrapped body. A failure located in the preamble has no body position.
pub fn evaluate(
    engine: &mut dyn ScriptEngine,
    unit: &ExecutableUnit,
    scope: &ExecutionScope,
) -> Result<(), EvaluationError> {
    engine.execute(&unit.source, scope.holder()).map_err(|err| {
        let line = err
            .line
            .and_then(|line| line.checked_sub(unit.line_offset))
            .filter(|line| *line > 0);
        EvaluationError {
            module: unit.module.clone(),
            message: err.message,
            line,
            column: line.and(err.column),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(has_source_map: bool) -> SourceInfo {
        SourceInfo {
            module: "app/core.js".to_string(),
            source_url: "http://localhost/js/app/core.js".to_string(),
            has_source_map,
        }
    }

    #[test]
    fn test_wrap_layout() {
        let mut roots = RootTable::new();
        roots.insert("app");
        roots.insert("lib");

        let unit = wrap("app.x = 1;", &roots, &info(true), &WrapOptions::default());
        assert_eq!(unit.line_offset, 4);
        assert_eq!(
            unit.source,
            "// modboot unit\n\
             var $BASE = $ROOTS;\n\
             var app = $ROOTS.app;\n\
             var lib = $ROOTS.lib;\n\
             app.x = 1;\n\
             //# sourceURL=http://localhost/js/app/core.js\n\
             //# sourceMappingURL=app/core.js.map\n"
        );
    }

    #[test]
    fn test_root_named_like_alias_keeps_alias_binding() {
        let mut roots = RootTable::new();
        roots.insert("$BASE");
        roots.insert("app");

        let unit = wrap("", &roots, &info(false), &WrapOptions::default());
        assert_eq!(unit.line_offset, 3);
        assert!(unit.source.contains("var $BASE = $ROOTS;\n"));
        assert!(!unit.source.contains("$ROOTS.$BASE"));
        assert!(unit.source.contains("var app = $ROOTS.app;\n"));
    }

    #[test]
    fn test_no_source_map_trailer_without_map() {
        let options = WrapOptions {
            compat_aliases: Vec::new(),
            ..WrapOptions::default()
        };
        let unit = wrap("log(1)", &RootTable::new(), &info(false), &options);
        assert_eq!(unit.line_offset, 1);
        assert!(!unit.source.contains("sourceMappingURL"));
        assert!(unit.source.contains("//# sourceURL=http://localhost/js/app/core.js"));
    }
}
