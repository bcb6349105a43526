// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! File system transports

use super::{BlockingTransport, Transport};
use crate::error::RetrievalError;
use async_trait::async_trait;
use tracing::debug;

/// Asynchronous file read; many reads may be in flight
#[derive(Debug, Clone, Copy, Default)]
pub struct FsTransport;

#[async_trait]
impl Transport for FsTransport {
    fn name(&self) -> &'static str {
        "fs"
    }

    async fn retrieve(&self, location: &str) -> Result<String, RetrievalError> {
        debug!("Reading {}", location);
        tokio::fs::read_to_string(location)
            .await
            .map_err(|e| with_location(location, e))
    }
}

/// Local synchronous read used by process-hosted environments
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncFsTransport;

impl BlockingTransport for SyncFsTransport {
    fn name(&self) -> &'static str {
        "sync-fs"
    }

    fn retrieve_blocking(&self, location: &str) -> Result<String, RetrievalError> {
        debug!("Reading {}", location);
        std::fs::read_to_string(location).map_err(|e| with_location(location, e))
    }
}

fn with_location(location: &str, err: std::io::Error) -> RetrievalError {
    match RetrievalError::from(err) {
        RetrievalError::NotFound(_) => RetrievalError::NotFound(location.to_string()),
        RetrievalError::Io(msg) => RetrievalError::Io(format!("{}: {}", location, msg)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_async_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.js");
        std::fs::write(&path, "log('a')").unwrap();

        let code = FsTransport.retrieve(path.to_str().unwrap()).await.unwrap();
        assert_eq!(code, "log('a')");
    }

    #[test]
    fn test_sync_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.js");
        let location = path.to_str().unwrap();

        let err = SyncFsTransport.retrieve_blocking(location).unwrap_err();
        assert_eq!(err, RetrievalError::NotFound(location.to_string()));
    }
}
