// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! In-memory bundle transport
//!
//! Serves code from a map. Per-location latency and injected failures make
//! it the transport of choice for exercising completion order.

use super::{BlockingTransport, Transport};
use crate::error::RetrievalError;
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;

/// Code bundle held in memory
#[derive(Debug, Default)]
pub struct MemoryTransport {
    modules: DashMap<String, String>,
    latency: DashMap<String, Duration>,
    failures: DashMap<String, RetrievalError>,
    requests: DashMap<String, usize>,
}

impl MemoryTransport {
    /// Create an empty bundle
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module, builder style
    pub fn with_module(self, location: impl Into<String>, code: impl Into<String>) -> Self {
        self.insert(location, code);
        self
    }

    /// Add or replace a module
    pub fn insert(&self, location: impl Into<String>, code: impl Into<String>) {
        self.modules.insert(location.into(), code.into());
    }

    /// Delay asynchronous retrieval of `location`
    pub fn set_latency(&self, location: impl Into<String>, latency: Duration) {
        self.latency.insert(location.into(), latency);
    }

    /// Make every retrieval of `location` fail with `err`
    pub fn fail(&self, location: impl Into<String>, err: RetrievalError) {
        self.failures.insert(location.into(), err);
    }

    /// Number of retrievals of `location` so far
    pub fn requests(&self, location: &str) -> usize {
        self.requests.get(location).map(|n| *n).unwrap_or(0)
    }

    /// Number of retrievals of any location so far
    pub fn total_requests(&self) -> usize {
        self.requests.iter().map(|entry| *entry.value()).sum()
    }

    fn lookup(&self, location: &str) -> Result<String, RetrievalError> {
        *self.requests.entry(location.to_string()).or_insert(0) += 1;

        if let Some(err) = self.failures.get(location) {
            return Err(err.clone());
        }
        self.modules
            .get(location)
            .map(|code| code.clone())
            .ok_or_else(|| RetrievalError::NotFound(location.to_string()))
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn retrieve(&self, location: &str) -> Result<String, RetrievalError> {
        let latency = self.latency.get(location).map(|d| *d);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.lookup(location)
    }
}

impl BlockingTransport for MemoryTransport {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn retrieve_blocking(&self, location: &str) -> Result<String, RetrievalError> {
        self.lookup(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_latency_and_counting() {
        let transport = MemoryTransport::new().with_module("a.js", "log('a')");
        transport.set_latency("a.js", Duration::from_millis(50));

        let start = tokio::time::Instant::now();
        let code = Transport::retrieve(&transport, "a.js").await.unwrap();
        assert_eq!(code, "log('a')");
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(transport.requests("a.js"), 1);
    }

    #[test]
    fn test_injected_failure() {
        let transport = MemoryTransport::new().with_module("b.js", "log('b')");
        transport.fail("b.js", RetrievalError::Status {
            status: 500,
            location: "b.js".to_string(),
        });

        assert!(transport.retrieve_blocking("b.js").is_err());
        assert_eq!(
            transport.retrieve_blocking("c.js"),
            Err(RetrievalError::NotFound("c.js".to_string()))
        );
        assert_eq!(transport.total_requests(), 2);
    }
}
