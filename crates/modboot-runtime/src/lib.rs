// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # modboot-runtime
//!
//! Host-adaptive, dependency-ordered module loading.
//!
//! Given module ids in dependency order, an [`Environment`] retrieves each
//! one through its host's transport (possibly many at once), then evaluates
//! them strictly in that order against a private namespace scope, exactly
//! once each.
//!
//! ## Example
//!
//! ```rust,no_run
//! use modboot_runtime::{Environment, EnvironmentAdapter, Host, LoaderConfig};
//!
//! # async fn run() -> modboot_runtime::Result<()> {
//! let config = LoaderConfig {
//!     host: Host::Browser,
//!     base: "http://localhost:9630/js".to_string(),
//!     force_async: true,
//!     ..LoaderConfig::default()
//! };
//! let mut env = Environment::for_host(config)?;
//! env.load(&["app/util.js", "app/core.js"])?;
//! let report = env.settle().await?;
//! assert!(env.is_loaded("app/core.js") || !report.failed.is_empty());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod diagnostics;
pub mod environment;
pub mod error;
pub mod manifest;
pub mod module_system;
pub mod namespace;
pub mod reload;
pub mod transport;

pub use config::LoaderConfig;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use environment::{Environment, EnvironmentAdapter, Host, HostProfile, LoadReport};
pub use error::{EvaluationError, LoaderError, Result, RetrievalError};
pub use manifest::{Manifest, ManifestModule};
pub use module_system::{FailurePolicy, ModuleState, ModuleStore};
pub use namespace::{ExecutionScope, RootTable, ScriptEngine};
pub use reload::{HotUpdate, ModuleWatcher};

/// Version of the runtime
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
