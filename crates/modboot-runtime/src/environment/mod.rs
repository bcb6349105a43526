// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Environment adapters
//!
//! Every host offers the same four operations. What differs between hosts
//! (transport, document-write phase, failure policy) is captured by a
//! [`HostProfile`] chosen at construction.

mod adapter;
mod host;

pub use adapter::{Environment, TIMER_FUNCTIONS};
pub use host::{Host, HostProfile, LoadBehavior, TransportKind};

use crate::error::Result;
use async_trait::async_trait;

/// Progress since the previous settle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Modules evaluated, in evaluation order
    pub evaluated: Vec<String>,
    /// Modules that failed retrieval or evaluation
    pub failed: Vec<String>,
    /// First module the load order is waiting on
    pub blocked_on: Option<String>,
    /// Modules not yet passed in the load order
    pub pending: usize,
}

impl LoadReport {
    /// True when nothing failed and nothing is left waiting
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.pending == 0
    }
}

/// The contract every host variant implements
#[async_trait]
pub trait EnvironmentAdapter: Send {
    /// Host this adapter serves
    fn host(&self) -> Host;

    /// Register and start loading every path not seen before, in order.
    /// Known paths are ignored.
    fn load(&mut self, paths: &[&str]) -> Result<()>;

    /// True once `path` has been evaluated or marked loaded
    fn is_loaded(&self, path: &str) -> bool;

    /// Mark `path` loaded without retrieving or evaluating it
    fn set_loaded(&mut self, path: &str);

    /// Evaluate `code` as `path` right away, bypassing the transport.
    /// Re-evaluates loaded modules and retries failed ones.
    fn eval_load(&mut self, path: &str, has_source_map: bool, code: &str) -> Result<()>;

    /// Wait for every retrieval in flight and evaluate what it unblocks
    async fn settle(&mut self) -> Result<LoadReport>;
}
