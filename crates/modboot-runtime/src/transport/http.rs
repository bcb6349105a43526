// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! HTTP fetch transport

use super::Transport;
use crate::error::{LoaderError, RetrievalError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

/// Fetches module code over HTTP(S)
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a client with the given per-request timeout
    pub fn new(timeout: Duration) -> Result<Self, LoaderError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(30)))
            .pool_max_idle_per_host(20)
            .user_agent(format!("modboot/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LoaderError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

fn map_reqwest(location: &str, err: reqwest::Error) -> RetrievalError {
    if err.is_timeout() {
        RetrievalError::Timeout(location.to_string())
    } else {
        RetrievalError::Network(err.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    #[instrument(skip(self))]
    async fn retrieve(&self, location: &str) -> Result<String, RetrievalError> {
        debug!("Fetching {}", location);

        let response = self
            .client
            .get(location)
            .send()
            .await
            .map_err(|e| map_reqwest(location, e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RetrievalError::NotFound(location.to_string()));
        }

        if !response.status().is_success() {
            return Err(RetrievalError::Status {
                status: response.status().as_u16(),
                location: location.to_string(),
            });
        }

        response.text().await.map_err(|e| map_reqwest(location, e))
    }
}
