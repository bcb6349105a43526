// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Host variants and what each one implies

use crate::error::LoaderError;
use crate::module_system::FailurePolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where the loader runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Host {
    /// Browser page
    Browser,
    /// Web worker
    Worker,
    /// Server process
    Node,
    /// Embedded script engine without an event loop
    Engine,
    /// ES module bundle; the bundler already loaded everything
    Esm,
    /// React-Native bundle
    ReactNative,
    /// Static single-file output
    Static,
}

impl Host {
    /// Every host, in declaration order
    pub const ALL: [Host; 7] = [
        Host::Browser,
        Host::Worker,
        Host::Node,
        Host::Engine,
        Host::Esm,
        Host::ReactNative,
        Host::Static,
    ];

    /// Lowercase name as used in config files and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Host::Browser => "browser",
            Host::Worker => "worker",
            Host::Node => "node",
            Host::Engine => "engine",
            Host::Esm => "esm",
            Host::ReactNative => "react-native",
            Host::Static => "static",
        }
    }

    /// Transport, failure policy and load behaviour of this host
    pub fn profile(&self) -> HostProfile {
        match self {
            Host::Browser => HostProfile {
                transport: TransportKind::ConcurrentFetch,
                policy: FailurePolicy::FailForward,
                behavior: LoadBehavior::Retrieve,
                document_write: true,
                timers_unsupported: false,
            },
            Host::Worker => HostProfile::serial(TransportKind::SerialImport),
            Host::Node => HostProfile::serial(TransportKind::LocalSync),
            Host::Engine => HostProfile {
                timers_unsupported: true,
                ..HostProfile::serial(TransportKind::LocalSync)
            },
            Host::Esm => HostProfile::bundled(LoadBehavior::MarkOnly),
            Host::ReactNative => HostProfile::bundled(LoadBehavior::AlwaysLoaded),
            Host::Static => HostProfile::bundled(LoadBehavior::Unsupported),
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Host {
    type Err = LoaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Host::ALL
            .into_iter()
            .find(|host| host.as_str() == normalized)
            .ok_or_else(|| LoaderError::config(format!("Unknown host '{}'", s)))
    }
}

/// How a host retrieves module code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Concurrent fetch: HTTP for URL bases, async file read otherwise
    ConcurrentFetch,
    /// Blocking import primitive, one module at a time
    SerialImport,
    /// Synchronous local file read
    LocalSync,
    /// No retrieval; code arrives through the bundle or `eval_load`
    None,
}

/// What `load` does on this host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadBehavior {
    /// Retrieve and evaluate each new path
    Retrieve,
    /// Only mark paths loaded
    MarkOnly,
    /// Only mark paths loaded; every path reports as loaded
    AlwaysLoaded,
    /// `load` and `eval_load` are errors
    Unsupported,
}

/// Everything that differs between hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostProfile {
    /// Retrieval medium
    pub transport: TransportKind,
    /// Evaluation failure policy
    pub policy: FailurePolicy,
    /// Load behaviour
    pub behavior: LoadBehavior,
    /// Starts in the document-write phase
    pub document_write: bool,
    /// Timer functions raise instead of scheduling
    pub timers_unsupported: bool,
}

impl HostProfile {
    fn serial(transport: TransportKind) -> Self {
        Self {
            transport,
            policy: FailurePolicy::FailFast,
            behavior: LoadBehavior::Retrieve,
            document_write: false,
            timers_unsupported: false,
        }
    }

    fn bundled(behavior: LoadBehavior) -> Self {
        Self {
            transport: TransportKind::None,
            policy: FailurePolicy::FailFast,
            behavior,
            document_write: false,
            timers_unsupported: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_names() {
        assert_eq!("browser".parse::<Host>().unwrap(), Host::Browser);
        assert_eq!("React_Native".parse::<Host>().unwrap(), Host::ReactNative);
        assert!("deno".parse::<Host>().is_err());
        for host in Host::ALL {
            assert_eq!(host.to_string().parse::<Host>().unwrap(), host);
        }
    }

    #[test]
    fn test_only_browser_fails_forward() {
        for host in Host::ALL {
            let expected = if host == Host::Browser {
                FailurePolicy::FailForward
            } else {
                FailurePolicy::FailFast
            };
            assert_eq!(host.profile().policy, expected, "{}", host);
        }
    }

    #[test]
    fn test_engine_profile() {
        let profile = Host::Engine.profile();
        assert_eq!(profile.transport, TransportKind::LocalSync);
        assert!(profile.timers_unsupported);
        assert!(!profile.document_write);
    }
}
