// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The environment adapter shared by every host

use super::host::{Host, HostProfile, LoadBehavior, TransportKind};
use super::{EnvironmentAdapter, LoadReport};
use crate::config::LoaderConfig;
use crate::diagnostics::Diagnostics;
use crate::error::{EvaluationError, LoaderError, Result, RetrievalError};
use crate::manifest::Manifest;
use crate::module_system::{
    FailureCause, FailurePolicy, ModuleSpec, ModuleState, ModuleStore, OrderedCompletion, Payload,
};
use crate::namespace::{ExecutionScope, NamespaceLayer, ScriptEngine, SourceInfo};
use crate::transport::{
    FsTransport, HttpTransport, SyncFsTransport, TransportAdapter, is_remote, resolve_location,
};
use async_trait::async_trait;
use modboot_engine::Engine;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, info, instrument, trace};

/// Timer functions that fail on hosts without an event loop
pub const TIMER_FUNCTIONS: [&str; 6] = [
    "setTimeout",
    "clearTimeout",
    "setInterval",
    "clearInterval",
    "setImmediate",
    "clearImmediate",
];

const TIMERS_UNSUPPORTED: &str = "async functions not supported in the embedded engine";

/// A finished retrieval on its way back to the evaluation timeline
struct Completion {
    id: String,
    result: std::result::Result<String, RetrievalError>,
}

/// One loader: store, completion order, namespace scope and engine, bound
/// to a host profile.
///
/// Evaluation only happens on the caller's timeline (inside `load`,
/// `eval_load`, `document_ready` and `settle`); spawned retrieval tasks
/// only report back through a channel.
pub struct Environment {
    host: Host,
    profile: HostProfile,
    config: LoaderConfig,
    store: ModuleStore,
    completion: OrderedCompletion,
    namespace: NamespaceLayer,
    engine: Box<dyn ScriptEngine>,
    transport: TransportAdapter,
    diagnostics: Diagnostics,
    specs: HashMap<String, ModuleSpec>,
    document_write: bool,
    pending_writes: Vec<ModuleSpec>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,
    limiter: Arc<Semaphore>,
    report: LoadReport,
}

impl Environment {
    /// Build the environment `config.host` calls for, with the bundled
    /// unit-script engine and the host's default transport.
    pub fn for_host(config: LoaderConfig) -> Result<Self> {
        let transport = default_transport(&config)?;
        Self::new(config, Box::new(Engine::new()), transport)
    }

    /// Build an environment with an explicit engine and transport.
    ///
    /// Hosts without retrieval ignore `transport`; hosts that retrieve
    /// reject [`TransportAdapter::None`].
    pub fn new(
        config: LoaderConfig,
        mut engine: Box<dyn ScriptEngine>,
        transport: TransportAdapter,
    ) -> Result<Self> {
        config.validate()?;
        let host = config.host;
        let profile = host.profile();

        let transport = match (profile.transport, transport) {
            (TransportKind::None, _) => TransportAdapter::None,
            (_, TransportAdapter::None) => {
                return Err(LoaderError::config(format!(
                    "the {} host needs a transport",
                    host
                )));
            }
            (_, transport) => transport,
        };

        if profile.timers_unsupported {
            for name in TIMER_FUNCTIONS {
                engine.bind_unsupported(name, TIMERS_UNSUPPORTED);
            }
        }

        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        debug!(%host, transport = transport.name(), "environment ready");

        Ok(Self {
            host,
            profile,
            document_write: profile.document_write && !config.force_async,
            limiter: Arc::new(Semaphore::new(config.max_concurrency)),
            namespace: NamespaceLayer::new(config.wrap_options()),
            config,
            store: ModuleStore::new(),
            completion: OrderedCompletion::new(),
            engine,
            transport,
            diagnostics: Diagnostics::new(),
            specs: HashMap::new(),
            pending_writes: Vec::new(),
            completions_tx,
            completions_rx,
            in_flight: 0,
            report: LoadReport::default(),
        })
    }

    /// Take locations and source-map flags from a build manifest
    pub fn with_manifest(mut self, manifest: &Manifest) -> Self {
        for spec in manifest.specs(&self.config.base) {
            self.specs.insert(spec.id.clone(), spec);
        }
        self
    }

    /// Host profile in use
    pub fn profile(&self) -> HostProfile {
        self.profile
    }

    /// Effective configuration
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Failures recorded so far
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Module records
    pub fn store(&self) -> &ModuleStore {
        &self.store
    }

    /// The shared namespace scope
    pub fn scope(&self) -> &ExecutionScope {
        self.namespace.scope()
    }

    /// Load order seen so far
    pub fn load_order(&self) -> &[String] {
        self.completion.order()
    }

    /// Drain output produced by evaluated modules
    pub fn take_output(&mut self) -> Vec<String> {
        self.engine.take_output()
    }

    /// True while new loads are queued for document insertion
    pub fn in_document_write_phase(&self) -> bool {
        self.document_write
    }

    /// Location and source-map flag of a module: from the manifest if
    /// listed, else the id resolved against the base.
    pub fn spec_for(&self, id: &str) -> ModuleSpec {
        self.specs.get(id).cloned().unwrap_or_else(|| ModuleSpec {
            id: id.to_string(),
            location: resolve_location(&self.config.base, id),
            has_source_map: false,
        })
    }

    /// `load` with an explicit async override.
    ///
    /// Going async ends the document-write phase for good.
    pub fn load_with(&mut self, paths: &[&str], force_async: bool) -> Result<()> {
        match self.profile.behavior {
            LoadBehavior::Unsupported => {
                return Err(LoaderError::unsupported(self.host.as_str(), "load"));
            }
            LoadBehavior::MarkOnly | LoadBehavior::AlwaysLoaded => {
                for path in paths {
                    self.store.mark_loaded(path);
                }
                return Ok(());
            }
            LoadBehavior::Retrieve => {}
        }

        if force_async && self.document_write {
            self.document_ready()?;
        }
        // Nothing is registered unless it can be driven to completion
        if !self.document_write {
            self.check_runtime()?;
        }

        for path in paths {
            let spec = self.spec_for(path);
            if !self.store.ensure(&spec) {
                trace!(module = %path, "already requested");
                continue;
            }
            if self.config.debug {
                info!("load: {}", path);
            }

            self.completion.enqueue(spec.id.clone());
            if self.document_write {
                self.pending_writes.push(spec);
            } else {
                self.start(spec)?;
            }
        }

        self.drain_ready()
    }

    /// End the document-write phase: queued writes start retrieving, in
    /// order, and every later load goes straight to the transport.
    pub fn document_ready(&mut self) -> Result<()> {
        if !self.document_write {
            return Ok(());
        }
        self.check_runtime()?;
        self.document_write = false;
        debug!(queued = self.pending_writes.len(), "leaving document-write phase");

        for spec in std::mem::take(&mut self.pending_writes) {
            self.start(spec)?;
        }
        self.drain_ready()
    }

    /// Fails when the transport spawns and there is no runtime to spawn on
    fn check_runtime(&self) -> Result<()> {
        if matches!(self.transport, TransportAdapter::Concurrent(_)) {
            runtime_handle()?;
        }
        Ok(())
    }

    fn start(&mut self, spec: ModuleSpec) -> Result<()> {
        match self.transport.clone() {
            TransportAdapter::Concurrent(transport) => {
                let handle = runtime_handle()?;
                let tx = self.completions_tx.clone();
                let limiter = Arc::clone(&self.limiter);
                self.in_flight += 1;

                handle.spawn(async move {
                    let result = match limiter.acquire().await {
                        Ok(_permit) => transport.retrieve(&spec.location).await,
                        Err(_) => Err(RetrievalError::Network("retrieval limiter closed".to_string())),
                    };
                    // The receiver only goes away with the environment
                    let _ = tx.send(Completion { id: spec.id, result });
                });
                Ok(())
            }
            TransportAdapter::Serial(transport) => {
                let result = transport.retrieve_blocking(&spec.location);
                self.complete(&spec.id, result)
            }
            TransportAdapter::None => Err(LoaderError::unsupported(self.host.as_str(), "load")),
        }
    }

    /// Apply every completion that has already arrived
    fn drain_ready(&mut self) -> Result<()> {
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.in_flight -= 1;
            self.complete(&completion.id, completion.result)?;
        }
        Ok(())
    }

    fn complete(&mut self, id: &str, result: std::result::Result<String, RetrievalError>) -> Result<()> {
        match result {
            Ok(code) => {
                debug!(module = %id, bytes = code.len(), "retrieved");
                self.store.advance(id, ModuleState::Retrieved(Payload::new(code)));
            }
            Err(err) => {
                let location = self.location_of(id);
                if !self
                    .store
                    .advance(id, ModuleState::Failed(FailureCause::Retrieval(err.clone())))
                {
                    // Already settled by set_loaded or eval_load
                    trace!(module = %id, "late retrieval failure ignored");
                    return self.flush();
                }
                self.diagnostics.retrieval(id, &location, &err);
                self.report.failed.push(id.to_string());

                if self.profile.policy == FailurePolicy::FailFast {
                    return Err(LoaderError::Retrieval {
                        module: id.to_string(),
                        location,
                        source: err,
                    });
                }
            }
        }
        self.flush()
    }

    /// Evaluate whatever the load order allows right now
    fn flush(&mut self) -> Result<()> {
        let namespace = &mut self.namespace;
        let engine = &mut self.engine;
        let result = self
            .completion
            .flush(&self.store, self.profile.policy, |record, code| {
                let info = SourceInfo {
                    module: record.id.clone(),
                    source_url: record.location.clone(),
                    has_source_map: record.has_source_map,
                };
                namespace.load_module(engine.as_mut(), &info, code)
            });

        match result {
            Ok(flush) => {
                for err in &flush.failed {
                    self.record_evaluation_failure(err);
                }
                self.report.evaluated.extend(flush.evaluated);
                self.report.blocked_on = flush.blocked_on;
                Ok(())
            }
            Err(err) => {
                if let LoaderError::Evaluation(eval) = &err {
                    self.record_evaluation_failure(eval);
                }
                Err(err)
            }
        }
    }

    fn record_evaluation_failure(&mut self, err: &EvaluationError) {
        let location = self.location_of(&err.module);
        let fail_forward = self.profile.policy == FailurePolicy::FailForward;
        self.diagnostics.evaluation(&location, err, fail_forward);
        self.report.failed.push(err.module.clone());
    }

    fn location_of(&self, id: &str) -> String {
        self.store
            .get(id)
            .map(|record| record.location)
            .unwrap_or_else(|| self.spec_for(id).location)
    }
}

fn runtime_handle() -> Result<tokio::runtime::Handle> {
    tokio::runtime::Handle::try_current().map_err(|e| {
        LoaderError::Runtime(format!("concurrent retrieval needs a tokio runtime: {}", e))
    })
}

/// The transport a host uses when none is given explicitly
fn default_transport(config: &LoaderConfig) -> Result<TransportAdapter> {
    let remote = is_remote(&config.base);
    Ok(match config.host.profile().transport {
        TransportKind::ConcurrentFetch if remote => {
            TransportAdapter::Concurrent(Arc::new(HttpTransport::new(config.fetch_timeout())?))
        }
        TransportKind::ConcurrentFetch => TransportAdapter::Concurrent(Arc::new(FsTransport)),
        TransportKind::SerialImport | TransportKind::LocalSync if remote => {
            return Err(LoaderError::config(format!(
                "the {} host reads modules from a directory, not {}",
                config.host, config.base
            )));
        }
        TransportKind::SerialImport | TransportKind::LocalSync => {
            TransportAdapter::Serial(Arc::new(SyncFsTransport))
        }
        TransportKind::None => TransportAdapter::None,
    })
}

#[async_trait]
impl EnvironmentAdapter for Environment {
    fn host(&self) -> Host {
        self.host
    }

    fn load(&mut self, paths: &[&str]) -> Result<()> {
        let force_async = self.config.force_async;
        self.load_with(paths, force_async)
    }

    fn is_loaded(&self, path: &str) -> bool {
        self.profile.behavior == LoadBehavior::AlwaysLoaded || self.store.is_loaded(path)
    }

    fn set_loaded(&mut self, path: &str) {
        self.store.mark_loaded(path);
    }

    fn eval_load(&mut self, path: &str, has_source_map: bool, code: &str) -> Result<()> {
        if matches!(
            self.profile.behavior,
            LoadBehavior::Unsupported | LoadBehavior::MarkOnly
        ) {
            return Err(LoaderError::unsupported(self.host.as_str(), "eval_load"));
        }
        if self.config.debug {
            info!("eval_load: {}", path);
        }

        let spec = self.spec_for(path);
        let info = SourceInfo {
            module: path.to_string(),
            source_url: spec.location,
            has_source_map,
        };

        match self.namespace.load_module(self.engine.as_mut(), &info, code) {
            Ok(()) => {
                self.store.force(path, ModuleState::Evaluated);
                self.report.evaluated.push(path.to_string());
                // A hot-loaded module may be the one the load order waits on
                self.flush()
            }
            Err(err) => {
                self.store
                    .force(path, ModuleState::Failed(FailureCause::Evaluation(err.clone())));
                self.record_evaluation_failure(&err);
                match self.profile.policy {
                    FailurePolicy::FailForward => Ok(()),
                    FailurePolicy::FailFast => Err(err.into()),
                }
            }
        }
    }

    #[instrument(skip(self), fields(host = %self.host))]
    async fn settle(&mut self) -> Result<LoadReport> {
        self.drain_ready()?;

        while self.in_flight > 0 {
            let Some(completion) = self.completions_rx.recv().await else {
                break;
            };
            self.in_flight -= 1;
            self.complete(&completion.id, completion.result)?;
        }

        let mut report = std::mem::take(&mut self.report);
        report.pending = self.completion.pending().len();
        report.blocked_on = self.completion.pending().first().cloned();
        if report.is_complete() {
            info!(evaluated = report.evaluated.len(), "load settled");
        }
        Ok(report)
    }
}
