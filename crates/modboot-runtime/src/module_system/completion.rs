// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Ordered completion
//!
//! Retrievals finish in any order; evaluation must follow the load order.
//! `OrderedCompletion` keeps the order and a cursor to the first module that
//! has not been passed yet. Each flush evaluates every `Retrieved` module
//! from the cursor onwards and stops at the first one that is still
//! `Requested` or whose retrieval failed. The cursor never moves back, so a
//! whole load costs O(n) record visits.

use crate::error::{EvaluationError, LoaderError, Result};
use crate::module_system::record::{FailureCause, ModuleRecord, ModuleState};
use crate::module_system::store::ModuleStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// What happens after a module fails to evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Report and keep going with the next module
    FailForward,
    /// Report and abort the load
    FailFast,
}

/// Outcome of one flush
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Flush {
    /// Modules evaluated by this flush, in order
    pub evaluated: Vec<String>,
    /// Modules whose evaluation failed and were passed (fail-forward only)
    pub failed: Vec<EvaluationError>,
    /// First module the cursor is waiting on, if any
    pub blocked_on: Option<String>,
}

/// Load-order buffer with a monotonically advancing cursor
#[derive(Debug, Default)]
pub struct OrderedCompletion {
    order: Vec<String>,
    cursor: usize,
}

impl OrderedCompletion {
    /// Create an empty order
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a module to the load order
    pub fn enqueue(&mut self, id: impl Into<String>) {
        self.order.push(id.into());
    }

    /// The full load order seen so far
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Modules not yet passed by the cursor
    pub fn pending(&self) -> &[String] {
        &self.order[self.cursor..]
    }

    /// True once every enqueued module has been passed
    pub fn is_drained(&self) -> bool {
        self.cursor == self.order.len()
    }

    /// Evaluate the longest evaluable run starting at the cursor.
    ///
    /// `evaluate` is called once per `Retrieved` module, strictly in load
    /// order. Already terminal records (force-marked, hot-loaded, or failed
    /// evaluation) are skipped. A `Requested` record or a failed retrieval
    /// stops the flush. Under [`FailurePolicy::FailFast`] the first
    /// evaluation failure is returned as an error after its record has been
    /// marked failed.
    pub fn flush<F>(&mut self, store: &ModuleStore, policy: FailurePolicy, mut evaluate: F) -> Result<Flush>
    where
        F: FnMut(&ModuleRecord, &str) -> std::result::Result<(), EvaluationError>,
    {
        let mut flush = Flush::default();

        while let Some(id) = self.order.get(self.cursor) {
            let Some(record) = store.get(id) else {
                flush.blocked_on = Some(id.clone());
                break;
            };

            match &record.state {
                ModuleState::Evaluated | ModuleState::Failed(FailureCause::Evaluation(_)) => {
                    trace!(module = %id, "skipping settled module");
                    self.cursor += 1;
                }
                ModuleState::Requested | ModuleState::Failed(FailureCause::Retrieval(_)) => {
                    flush.blocked_on = Some(id.clone());
                    break;
                }
                ModuleState::Retrieved(payload) => {
                    self.cursor += 1;
                    match evaluate(&record, &payload.code) {
                        Ok(()) => {
                            store.advance(id, ModuleState::Evaluated);
                            debug!(module = %id, "evaluated");
                            flush.evaluated.push(id.clone());
                        }
                        Err(err) => {
                            store.advance(
                                id,
                                ModuleState::Failed(FailureCause::Evaluation(err.clone())),
                            );
                            match policy {
                                FailurePolicy::FailForward => flush.failed.push(err),
                                FailurePolicy::FailFast => return Err(LoaderError::Evaluation(err)),
                            }
                        }
                    }
                }
            }
        }

        Ok(flush)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RetrievalError;
    use crate::module_system::record::{ModuleSpec, Payload};

    fn setup(ids: &[&str]) -> (ModuleStore, OrderedCompletion) {
        let store = ModuleStore::new();
        let mut completion = OrderedCompletion::new();
        for id in ids {
            store.ensure(&ModuleSpec {
                id: id.to_string(),
                location: id.to_string(),
                has_source_map: false,
            });
            completion.enqueue(*id);
        }
        (store, completion)
    }

    fn retrieve(store: &ModuleStore, id: &str) {
        store.advance(id, ModuleState::Retrieved(Payload::new(format!("log('{}')", id))));
    }

    fn flush_recording(
        completion: &mut OrderedCompletion,
        store: &ModuleStore,
        policy: FailurePolicy,
        seen: &mut Vec<String>,
        failing: &[&str],
    ) -> Result<Flush> {
        completion.flush(store, policy, |record, _code| {
            seen.push(record.id.clone());
            if failing.contains(&record.id.as_str()) {
                Err(EvaluationError {
                    module: record.id.clone(),
                    message: "Uncaught boom".to_string(),
                    line: Some(1),
                    column: Some(1),
                })
            } else {
                Ok(())
            }
        })
    }

    /// Every permutation of `items`, Heap's algorithm.
    fn permutations(items: &[&'static str]) -> Vec<Vec<&'static str>> {
        fn heap(k: usize, items: &mut Vec<&'static str>, out: &mut Vec<Vec<&'static str>>) {
            if k <= 1 {
                out.push(items.clone());
                return;
            }
            heap(k - 1, items, out);
            for i in 0..k - 1 {
                if k % 2 == 0 {
                    items.swap(i, k - 1);
                } else {
                    items.swap(0, k - 1);
                }
                heap(k - 1, items, out);
            }
        }
        let mut items = items.to_vec();
        let mut out = Vec::new();
        heap(items.len(), &mut items, &mut out);
        out
    }

    #[test]
    fn test_every_completion_order_evaluates_in_load_order() {
        let order = ["a", "b", "c", "d", "e"];
        let all = permutations(&order);
        assert_eq!(all.len(), 120);

        for arrival in all {
            let (store, mut completion) = setup(&order);
            let mut seen = Vec::new();
            for id in &arrival {
                retrieve(&store, id);
                flush_recording(&mut completion, &store, FailurePolicy::FailForward, &mut seen, &[])
                    .unwrap();
            }
            assert_eq!(seen, order, "arrival order {:?}", arrival);
            assert!(completion.is_drained());
            assert!(order.iter().all(|id| store.is_loaded(id)));
        }
    }

    #[test]
    fn test_requested_module_blocks_later_ones() {
        let (store, mut completion) = setup(&["a", "b", "c"]);
        let mut seen = Vec::new();

        retrieve(&store, "c");
        let flush =
            flush_recording(&mut completion, &store, FailurePolicy::FailForward, &mut seen, &[]).unwrap();
        assert!(seen.is_empty());
        assert_eq!(flush.blocked_on.as_deref(), Some("a"));

        retrieve(&store, "a");
        let flush =
            flush_recording(&mut completion, &store, FailurePolicy::FailForward, &mut seen, &[]).unwrap();
        assert_eq!(flush.evaluated, vec!["a"]);
        assert_eq!(flush.blocked_on.as_deref(), Some("b"));
        assert_eq!(completion.pending(), ["b", "c"]);
    }

    #[test]
    fn test_retrieval_failure_blocks_everything_after() {
        let (store, mut completion) = setup(&["a", "b", "c"]);
        let mut seen = Vec::new();

        retrieve(&store, "a");
        retrieve(&store, "c");
        store.advance(
            "b",
            ModuleState::Failed(FailureCause::Retrieval(RetrievalError::NotFound("b".into()))),
        );

        let flush =
            flush_recording(&mut completion, &store, FailurePolicy::FailForward, &mut seen, &[]).unwrap();
        assert_eq!(seen, vec!["a"]);
        assert_eq!(flush.blocked_on.as_deref(), Some("b"));
        assert!(!store.is_loaded("c"));

        // Stays blocked no matter how often it is flushed
        let flush =
            flush_recording(&mut completion, &store, FailurePolicy::FailForward, &mut seen, &[]).unwrap();
        assert!(flush.evaluated.is_empty());
        assert_eq!(seen, vec!["a"]);
    }

    #[test]
    fn test_fail_forward_passes_failed_evaluation() {
        let (store, mut completion) = setup(&["a", "b", "c"]);
        let mut seen = Vec::new();
        for id in ["a", "b", "c"] {
            retrieve(&store, id);
        }

        let flush =
            flush_recording(&mut completion, &store, FailurePolicy::FailForward, &mut seen, &["b"]).unwrap();
        assert_eq!(seen, vec!["a", "b", "c"]);
        assert_eq!(flush.evaluated, vec!["a", "c"]);
        assert_eq!(flush.failed.len(), 1);
        assert_eq!(flush.failed[0].module, "b");
        assert!(!store.is_loaded("b"));
        assert!(store.is_loaded("c"));
    }

    #[test]
    fn test_fail_fast_aborts_on_evaluation_failure() {
        let (store, mut completion) = setup(&["a", "b", "c"]);
        let mut seen = Vec::new();
        for id in ["a", "b", "c"] {
            retrieve(&store, id);
        }

        let err = flush_recording(&mut completion, &store, FailurePolicy::FailFast, &mut seen, &["b"])
            .unwrap_err();
        assert_eq!(err.module(), Some("b"));
        assert_eq!(seen, vec!["a", "b"]);
        assert!(!store.is_loaded("c"));
        assert_eq!(
            store.state("b").map(|s| s.label()),
            Some("evaluation-failed")
        );
    }

    #[test]
    fn test_force_marked_module_is_skipped() {
        let (store, mut completion) = setup(&["a", "b"]);
        let mut seen = Vec::new();

        store.mark_loaded("a");
        retrieve(&store, "b");
        let flush =
            flush_recording(&mut completion, &store, FailurePolicy::FailForward, &mut seen, &[]).unwrap();
        assert_eq!(seen, vec!["b"]);
        assert_eq!(flush.evaluated, vec!["b"]);
    }
}
