// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Transports
//!
//! A transport turns a resolved location into module code. It reports
//! success or failure and never evaluates anything.

mod fs;
mod http;
mod memory;

pub use fs::{FsTransport, SyncFsTransport};
pub use http::HttpTransport;
pub use memory::MemoryTransport;

use crate::error::RetrievalError;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// Retrieval that may run many requests at once
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Fetch the code stored at `location`
    async fn retrieve(&self, location: &str) -> Result<String, RetrievalError>;
}

/// Retrieval through a blocking host primitive, one module at a time
pub trait BlockingTransport: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Fetch the code stored at `location`, blocking the caller
    fn retrieve_blocking(&self, location: &str) -> Result<String, RetrievalError>;
}

/// The retrieval medium an environment was built with
#[derive(Clone)]
pub enum TransportAdapter {
    /// Concurrent fetch; completions arrive in any order
    Concurrent(Arc<dyn Transport>),
    /// Serial import; each module is evaluated as soon as it arrives
    Serial(Arc<dyn BlockingTransport>),
    /// The host has no retrieval of its own
    None,
}

impl TransportAdapter {
    /// Transport name for logs
    pub fn name(&self) -> &'static str {
        match self {
            TransportAdapter::Concurrent(t) => t.name(),
            TransportAdapter::Serial(t) => t.name(),
            TransportAdapter::None => "none",
        }
    }
}

impl std::fmt::Debug for TransportAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportAdapter::Concurrent(_) => write!(f, "Concurrent({})", self.name()),
            TransportAdapter::Serial(_) => write!(f, "Serial({})", self.name()),
            TransportAdapter::None => write!(f, "None"),
        }
    }
}

/// Check whether a base or location is an http(s) URL
pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Resolve a module path against the retrieval base.
///
/// Absolute URLs pass through. URL bases are joined as directories, so
/// `http://host/js` and `http://host/js/` resolve the same way. Anything
/// else is treated as a file system directory.
pub fn resolve_location(base: &str, path: &str) -> String {
    if is_remote(path) || base.is_empty() {
        return path.to_string();
    }

    if is_remote(base) {
        let dir = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{}/", base)
        };
        return match Url::parse(&dir).and_then(|url| url.join(path)) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}{}", dir, path),
        };
    }

    Path::new(base).join(path).to_string_lossy().into_owned()
}
