//! Loader integration tests
//!
//! Drives whole environments through the public API with in-memory and
//! on-disk bundles.

use modboot_engine::Engine;
use modboot_runtime::transport::{BlockingTransport, MemoryTransport, Transport, TransportAdapter};
use modboot_runtime::{
    DiagnosticKind, Environment, EnvironmentAdapter, Host, LoaderConfig, LoaderError, Manifest,
    RetrievalError,
};
use std::sync::Arc;
use std::time::Duration;

fn browser() -> LoaderConfig {
    LoaderConfig {
        host: Host::Browser,
        force_async: true,
        ..LoaderConfig::default()
    }
}

fn concurrent_env(memory: &Arc<MemoryTransport>) -> Environment {
    let transport = TransportAdapter::Concurrent(Arc::clone(memory) as Arc<dyn Transport>);
    Environment::new(browser(), Box::new(Engine::new()), transport).unwrap()
}

fn serial_env(host: Host, memory: &Arc<MemoryTransport>) -> Environment {
    let transport = TransportAdapter::Serial(Arc::clone(memory) as Arc<dyn BlockingTransport>);
    let config = LoaderConfig {
        host,
        ..LoaderConfig::default()
    };
    Environment::new(config, Box::new(Engine::new()), transport).unwrap()
}

fn bundle(ids: &[&str]) -> Arc<MemoryTransport> {
    let memory = MemoryTransport::new();
    for id in ids {
        memory.insert(*id, format!("log('{}')", id));
    }
    Arc::new(memory)
}

fn permutations(n: usize) -> Vec<Vec<usize>> {
    if n == 0 {
        return vec![Vec::new()];
    }
    let mut out = Vec::new();
    for rest in permutations(n - 1) {
        for i in 0..=rest.len() {
            let mut p = rest.clone();
            p.insert(i, n - 1);
            out.push(p);
        }
    }
    out
}

#[tokio::test(start_paused = true)]
async fn test_any_completion_order_evaluates_in_load_order() {
    let ids = ["a.js", "b.js", "c.js", "d.js"];

    for ranks in permutations(ids.len()) {
        let memory = bundle(&ids);
        for (id, rank) in ids.iter().zip(&ranks) {
            memory.set_latency(*id, Duration::from_millis(10 * (*rank as u64 + 1)));
        }

        let mut env = concurrent_env(&memory);
        env.load(&ids).unwrap();
        let report = env.settle().await.unwrap();

        assert_eq!(report.evaluated, ids, "latency ranks {:?}", ranks);
        assert_eq!(env.take_output(), vec!["a.js", "b.js", "c.js", "d.js"]);
    }
}

#[tokio::test]
async fn test_load_twice_retrieves_and_evaluates_once() {
    let memory = bundle(&["a.js"]);
    let mut env = concurrent_env(&memory);

    env.load(&["a.js"]).unwrap();
    env.load(&["a.js"]).unwrap();
    env.settle().await.unwrap();
    env.load(&["a.js"]).unwrap();
    let report = env.settle().await.unwrap();

    assert_eq!(memory.requests("a.js"), 1);
    assert!(report.evaluated.is_empty());
    assert_eq!(env.take_output(), vec!["a.js"]);
}

#[tokio::test(start_paused = true)]
async fn test_is_loaded_tracks_evaluation() {
    let memory = bundle(&["a.js"]);
    memory.set_latency("a.js", Duration::from_millis(5));
    let mut env = concurrent_env(&memory);

    assert!(!env.is_loaded("a.js"));
    env.load(&["a.js"]).unwrap();
    assert!(!env.is_loaded("a.js"));
    env.settle().await.unwrap();
    assert!(env.is_loaded("a.js"));
}

#[tokio::test]
async fn test_set_loaded_skips_retrieval_and_evaluation() {
    let memory = bundle(&["a.js", "b.js"]);
    let mut env = concurrent_env(&memory);

    env.set_loaded("a.js");
    assert!(env.is_loaded("a.js"));

    env.load(&["a.js", "b.js"]).unwrap();
    let report = env.settle().await.unwrap();

    assert_eq!(memory.requests("a.js"), 0);
    assert_eq!(report.evaluated, vec!["b.js"]);
    assert_eq!(env.take_output(), vec!["b.js"]);
}

#[tokio::test]
async fn test_retrieval_failure_blocks_later_modules_fail_forward() {
    let memory = bundle(&["a.js", "b.js", "c.js"]);
    memory.fail("b.js", RetrievalError::Status {
        status: 404,
        location: "b.js".to_string(),
    });
    let mut env = concurrent_env(&memory);

    env.load(&["a.js", "b.js", "c.js"]).unwrap();
    let report = env.settle().await.unwrap();

    assert_eq!(report.evaluated, vec!["a.js"]);
    assert_eq!(report.failed, vec!["b.js"]);
    assert_eq!(report.blocked_on.as_deref(), Some("b.js"));
    assert_eq!(report.pending, 2);
    assert!(!env.is_loaded("c.js"));

    let diagnostics = env.diagnostics().entries();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::Retrieval);
    assert_eq!(diagnostics[0].module, "b.js");
}

#[test]
fn test_retrieval_failure_aborts_fail_fast() {
    let memory = bundle(&["a.js", "c.js"]);
    let mut env = serial_env(Host::Node, &memory);

    let err = env.load(&["a.js", "b.js", "c.js"]).unwrap_err();
    assert!(matches!(err, LoaderError::Retrieval { ref module, .. } if module == "b.js"));
    assert!(env.is_loaded("a.js"));
    assert!(!env.is_loaded("c.js"));
    assert_eq!(memory.requests("c.js"), 0);
}

#[tokio::test]
async fn test_evaluation_failure_fail_forward_continues() {
    let memory = bundle(&["a.js", "c.js"]);
    memory.insert("b.js", "log('b')\nthrow 'broken'");
    let mut env = concurrent_env(&memory);

    env.load(&["a.js", "b.js", "c.js"]).unwrap();
    let report = env.settle().await.unwrap();

    assert_eq!(report.evaluated, vec!["a.js", "c.js"]);
    assert_eq!(report.failed, vec!["b.js"]);
    let diagnostic = &env.diagnostics().entries()[0];
    assert_eq!(diagnostic.kind, DiagnosticKind::Evaluation);
    assert_eq!(diagnostic.message, "Uncaught broken");
    assert_eq!(diagnostic.line, Some(2));
}

#[test]
fn test_evaluation_failure_fail_fast_aborts() {
    let memory = bundle(&["a.js", "c.js"]);
    memory.insert("b.js", "throw 'broken'");
    let mut env = serial_env(Host::Worker, &memory);

    let err = env.load(&["a.js", "b.js", "c.js"]).unwrap_err();
    assert_eq!(err.to_string(), "Error evaluating 'b.js' at 1:1: Uncaught broken");
    assert!(!env.is_loaded("c.js"));
}

#[test]
fn test_sibling_declarations_share_one_root() {
    let memory = Arc::new(
        MemoryTransport::new()
            .with_module("one.js", "declare-root('pkg.one')\npkg.one.value = 1")
            .with_module("two.js", "declare-root('pkg.two')\npkg.two.value = 2"),
    );
    let mut env = serial_env(Host::Node, &memory);
    env.load(&["one.js", "two.js"]).unwrap();

    let roots: Vec<&str> = env.scope().roots().iter().collect();
    assert_eq!(roots, vec!["pkg"]);
    let pkg = env.scope().root("pkg").unwrap();
    assert_eq!(pkg.keys(), vec!["one".to_string(), "two".to_string()]);
}

#[tokio::test]
async fn test_keyword_root_does_not_poison_later_modules() {
    let memory = Arc::new(
        MemoryTransport::new()
            .with_module("a.js", "declare-root('null.x')")
            .with_module("b.js", "log('b.js')")
            .with_module("c.js", "declare-root('app.c')\nlog('c.js')"),
    );
    let mut env = concurrent_env(&memory);

    env.load(&["a.js", "b.js", "c.js"]).unwrap();
    let report = env.settle().await.unwrap();

    assert_eq!(report.failed, vec!["a.js"]);
    assert_eq!(report.evaluated, vec!["b.js", "c.js"]);
    assert_eq!(env.take_output(), vec!["b.js", "c.js"]);
    let roots: Vec<&str> = env.scope().roots().iter().collect();
    assert_eq!(roots, vec!["app"]);
}

#[test]
fn test_eval_load_retries_failed_evaluation() {
    let memory = Arc::new(MemoryTransport::new());
    let mut env = serial_env(Host::Node, &memory);

    let err = env.eval_load("hot.js", false, "throw 'not yet'").unwrap_err();
    assert_eq!(err.module(), Some("hot.js"));
    assert!(!env.is_loaded("hot.js"));

    env.eval_load("hot.js", false, "log('fixed')").unwrap();
    assert!(env.is_loaded("hot.js"));
    assert_eq!(env.take_output(), vec!["fixed"]);
    assert_eq!(memory.total_requests(), 0);
}

#[tokio::test]
async fn test_eval_load_unblocks_failed_retrieval() {
    let memory = bundle(&["a.js", "c.js"]);
    memory.fail("b.js", RetrievalError::Network("offline".to_string()));
    let mut env = concurrent_env(&memory);

    env.load(&["a.js", "b.js", "c.js"]).unwrap();
    env.settle().await.unwrap();
    assert!(!env.is_loaded("c.js"));

    env.eval_load("b.js", false, "log('b.js')").unwrap();
    let report = env.settle().await.unwrap();
    assert_eq!(report.evaluated, vec!["b.js", "c.js"]);
    assert_eq!(env.take_output(), vec!["a.js", "b.js", "c.js"]);
}

#[tokio::test]
async fn test_disk_bundle_through_manifest() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("lib")).unwrap();
    std::fs::write(dir.path().join("lib/util.js"), "declare-root('app.util')\napp.util.ready = true").unwrap();
    std::fs::write(dir.path().join("core.js"), "log(app.util.ready)").unwrap();
    let manifest_path = dir.path().join("manifest.json");
    std::fs::write(
        &manifest_path,
        r#"{"modules":[{"id":"util","path":"lib/util.js"},{"id":"core.js","sourceMap":true}]}"#,
    )
    .unwrap();

    let manifest = Manifest::from_file(&manifest_path).unwrap();
    for host in [Host::Node, Host::Browser] {
        let config = LoaderConfig {
            host,
            base: manifest.base.clone().unwrap(),
            force_async: true,
            ..LoaderConfig::default()
        };
        let mut env = Environment::for_host(config).unwrap().with_manifest(&manifest);
        env.load(&manifest.ids()).unwrap();
        let report = env.settle().await.unwrap();

        assert!(env.is_loaded("core.js"), "{}: {:?}", host, report);
        assert_eq!(env.take_output(), vec!["true"], "{}", host);
    }
}
