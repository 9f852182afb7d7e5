//! End-to-end runs of the pipeline against the in-memory collaborators.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use headless_harness::coverage::{ReportContext, ReportRegistry, ReportWriter};
use headless_harness::mock::{EventLog, MockEnvironment, MockInstrumenter, MockTestEngine};
use headless_harness::temp_files::{temp_test_path, TEMP_TEST_EXTENSION};
use headless_harness::{
    CapturedConsole, DomEvent, HarnessError, HarnessResult, Harness, Interface, Reporter,
    RunConfig, RunStats, ScriptError, TestContext, TestEngine, TestSuite, Window,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const COVERAGE: &str = r#"{
    "/build/app.js": {
        "path": "/build/app.js",
        "s": {"1": 2, "2": 0},
        "b": {},
        "f": {"1": 2},
        "fnMap": {"1": {"name": "main", "line": 1, "loc": {"start": {"line": 1, "column": 0}, "end": {"line": 3, "column": 1}}}},
        "statementMap": {
            "1": {"start": {"line": 1, "column": 0}, "end": {"line": 1, "column": 9}},
            "2": {"start": {"line": 2, "column": 0}, "end": {"line": 2, "column": 9}}
        },
        "branchMap": {}
    }
}"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn build_dir(&self) -> PathBuf {
        self.dir.path().join("build")
    }

    fn test_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn staged_files(&self) -> Vec<PathBuf> {
        staged_in(&self.build_dir())
    }
}

fn staged_in(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .map(|e| e.unwrap().path())
        .filter(|p| {
            p.extension().is_some_and(|ext| ext == TEMP_TEST_EXTENSION)
        })
        .collect()
}

fn harness(env: &MockEnvironment, engine: &MockTestEngine, console: &CapturedConsole) -> Harness {
    Harness::new(env.clone(), engine.clone()).with_console(Arc::new(console.clone()))
}

// ============================================================================
// Assembly
// ============================================================================

#[tokio::test]
async fn assembled_order_without_coverage_is_prefix_app_suffix() {
    let ws = Workspace::new();
    let env = MockEnvironment::new();
    let engine = MockTestEngine::passing(0);
    let config = RunConfig::builder(ws.build_dir())
        .prefix("var lib = {};")
        .app("zeta", "lib.z = 1;")
        .app("alpha", "lib.a = 2;")
        .suffix("boot(lib);")
        .build();

    harness(&env, &engine, &CapturedConsole::new())
        .run_tests(&config)
        .await
        .unwrap();

    let requests = env.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].scripts.sources(),
        vec!["var lib = {};", "lib.z = 1;", "lib.a = 2;", "boot(lib);"]
    );
    assert_eq!(requests[0].html, "<div></div>");
    assert_eq!(requests[0].url, "about:blank");
    assert!(!ws.build_dir().join("zeta.js").exists());
}

#[tokio::test]
async fn coverage_persists_units_before_instrumenting_in_place() {
    let ws = Workspace::new();
    let env = MockEnvironment::new();
    let engine = MockTestEngine::passing(0);
    let instrumenter = MockInstrumenter::new();
    let config = RunConfig::builder(ws.build_dir())
        .prefix("var lib = {};")
        .app("main", "lib.main = true;")
        .suffix("boot(lib);")
        .coverage(["none"])
        .build();

    harness(&env, &engine, &CapturedConsole::new())
        .with_instrumenter(instrumenter.clone())
        .run_tests(&config)
        .await
        .unwrap();

    let calls = instrumenter.calls();
    assert_eq!(calls, vec![(ws.build_dir().join("main.js"), true)]);
    assert_eq!(
        env.requests()[0].scripts.sources(),
        vec![
            "var lib = {};",
            "/* instrumented: main.js */lib.main = true;",
            "boot(lib);"
        ]
    );
    assert_eq!(
        std::fs::read_to_string(ws.build_dir().join("main.js")).unwrap(),
        "lib.main = true;"
    );
}

#[tokio::test]
async fn app_order_from_yaml_survives_to_the_document() {
    let ws = Workspace::new();
    let yaml = format!(
        "buildDir: {}\nappSource:\n  app:\n    zeta: 'z();'\n    alpha: 'a();'\n    mid: 'm();'\n",
        ws.build_dir().display()
    );
    let config = RunConfig::from_yaml_str(&yaml).unwrap();
    let env = MockEnvironment::new();

    harness(&env, &MockTestEngine::passing(0), &CapturedConsole::new())
        .run_tests(&config)
        .await
        .unwrap();

    assert_eq!(
        env.requests()[0].scripts.sources(),
        vec!["z();", "a();", "m();"]
    );
}

// ============================================================================
// Completion
// ============================================================================

#[tokio::test]
async fn done_fires_once_with_success_iff_no_failures() {
    for (failures, expected) in [(0, true), (1, false), (7, false)] {
        let ws = Workspace::new();
        let log = EventLog::new();
        let done_log = log.clone();
        let config = RunConfig::new(ws.build_dir());

        let report = harness(
            &MockEnvironment::new(),
            &MockTestEngine::failing(failures),
            &CapturedConsole::new(),
        )
        .on_done(move |ok| done_log.record(format!("done:{ok}")))
        .run_tests(&config)
        .await
        .unwrap();

        assert_eq!(report.success, expected);
        assert_eq!(log.events(), vec![format!("done:{expected}")]);
    }
}

#[tokio::test]
async fn staged_files_are_gone_after_success_and_failure() {
    for engine in [MockTestEngine::passing(2), MockTestEngine::failing(2)] {
        let ws = Workspace::new();
        let a = ws.test_file("a.js", "it('a', () => {});");
        let b = ws.test_file("b.js", "it('b', () => {});");
        let config = RunConfig::builder(ws.build_dir())
            .test_file(&a)
            .test_file(&b)
            .build();

        let report = harness(&MockEnvironment::new(), &engine, &CapturedConsole::new())
            .run_tests(&config)
            .await
            .unwrap();

        assert_eq!(engine.runs()[0].contents.len(), 2);
        assert_eq!(report.cleanup.len(), 2);
        assert!(report.cleanup.iter().all(|o| o.is_gone()));
        assert!(ws.staged_files().is_empty());
    }
}

/// Deletes the staged files mid-run, like a concurrent run over the same files
#[derive(Debug)]
struct RacingEngine;

#[async_trait]
impl TestEngine for RacingEngine {
    async fn run(
        &mut self,
        suite: &TestSuite,
        _context: &TestContext,
        _window: &mut dyn Window,
    ) -> HarnessResult<RunStats> {
        for file in &suite.files {
            std::fs::remove_file(file).unwrap();
        }
        Ok(RunStats::default())
    }
}

#[tokio::test]
async fn cleanup_tolerates_files_removed_by_another_run() {
    let ws = Workspace::new();
    let a = ws.test_file("a.js", "it('a');");
    let config = RunConfig::builder(ws.build_dir()).test_file(&a).build();

    let report = Harness::new(MockEnvironment::new(), RacingEngine)
        .with_console(Arc::new(CapturedConsole::new()))
        .run_tests(&config)
        .await
        .unwrap();

    assert!(report.success);
    assert_eq!(
        report.cleanup,
        vec![headless_harness::CleanupOutcome::AlreadyGone(temp_test_path(
            &ws.build_dir(),
            &a
        ))]
    );
}

#[tokio::test]
async fn lcov_done_message_printed_once_and_nothing_for_html() {
    let ws = Workspace::new();
    let console = CapturedConsole::new();
    let engine = MockTestEngine::passing(1).with_coverage(serde_json::from_str(COVERAGE).unwrap());
    let config = RunConfig::builder(ws.build_dir())
        .app("app", "function main() {}")
        .coverage(["lcov", "html"])
        .done_message("lcov", "LCOV done")
        .build();

    let report = harness(&MockEnvironment::new(), &engine, &console)
        .with_instrumenter(MockInstrumenter::new())
        .run_tests(&config)
        .await
        .unwrap();

    assert_eq!(console.lines(), vec!["LCOV done"]);
    let formats: Vec<&str> = report.reports.iter().map(|r| r.format.as_str()).collect();
    assert_eq!(formats, vec!["lcov", "html"]);
    let lcov = std::fs::read_to_string(ws.build_dir().join("lcov.info")).unwrap();
    assert!(lcov.contains("SF:/build/app.js"));
    assert!(ws.build_dir().join("index.html").exists());
}

#[tokio::test]
async fn coverage_reports_go_to_the_configured_dir() {
    let ws = Workspace::new();
    let out = ws.dir.path().join("reports");
    let engine = MockTestEngine::passing(1).with_coverage(serde_json::from_str(COVERAGE).unwrap());
    let config = RunConfig::builder(ws.build_dir())
        .coverage(["json-summary", "cobertura"])
        .coverage_dir(&out)
        .build();

    harness(&MockEnvironment::new(), &engine, &CapturedConsole::new())
        .run_tests(&config)
        .await
        .unwrap();

    assert!(out.join("coverage-summary.json").exists());
    assert!(out.join("cobertura-coverage.xml").exists());
}

#[derive(Debug)]
struct FullDiskWriter;

impl ReportWriter for FullDiskWriter {
    fn write(&self, _ctx: &ReportContext<'_>) -> HarnessResult<Vec<PathBuf>> {
        Err(HarnessError::coverage("no space left on device"))
    }
}

#[tokio::test]
async fn coverage_failure_surfaces_after_done_and_cleanup() {
    let ws = Workspace::new();
    let a = ws.test_file("a.js", "it('a');");
    let log = EventLog::new();
    let done_log = log.clone();
    let mut registry = ReportRegistry::with_builtin();
    registry.register("disk", Box::new(FullDiskWriter));
    let config = RunConfig::builder(ws.build_dir())
        .test_file(&a)
        .coverage(["disk"])
        .done_message("disk", "never printed")
        .build();
    let console = CapturedConsole::new();

    let err = harness(&MockEnvironment::new(), &MockTestEngine::passing(1), &console)
        .with_registry(registry)
        .on_done(move |ok| done_log.record(format!("done:{ok}")))
        .run_tests(&config)
        .await
        .unwrap_err();

    assert!(matches!(err, HarnessError::Coverage { .. }));
    assert_eq!(log.events(), vec!["done:true"]);
    assert!(ws.staged_files().is_empty());
    assert_eq!(console.count("never printed"), 0);
}

// ============================================================================
// Defaults and staging
// ============================================================================

#[tokio::test]
async fn runner_defaults_apply_when_omitted() {
    let ws = Workspace::new();
    let engine = MockTestEngine::passing(0);
    let config = RunConfig::from_yaml_str(&format!("buildDir: {}\n", ws.build_dir().display()))
        .unwrap();

    harness(&MockEnvironment::new(), &engine, &CapturedConsole::new())
        .run_tests(&config)
        .await
        .unwrap();

    let options = &engine.runs()[0].suite.options;
    assert_eq!(options.timeout, Duration::from_millis(3000));
    assert_eq!(options.reporter, Reporter::Dot);
    assert_eq!(options.interface, Interface::Bdd);
}

#[tokio::test]
async fn staged_names_are_deterministic_and_carry_injection() {
    let ws = Workspace::new();
    let a = ws.test_file("a.js", "describe('a', () => {});\n");
    let b = ws.test_file("b.js", "describe('b', () => {});\n");
    let engine = MockTestEngine::passing(2);
    let config = RunConfig::builder(ws.build_dir())
        .test_file(&a)
        .test_file(&b)
        .injection("var fixtures = window.fixtures;\n")
        .build();

    harness(&MockEnvironment::new(), &engine, &CapturedConsole::new())
        .run_tests(&config)
        .await
        .unwrap();

    let run = &engine.runs()[0];
    let expected_a = temp_test_path(&ws.build_dir(), &a);
    let expected_b = temp_test_path(&ws.build_dir(), &b);
    assert_ne!(expected_a, expected_b);
    assert_eq!(run.suite.files, vec![expected_a.clone(), expected_b]);
    assert_eq!(expected_a, temp_test_path(&ws.build_dir(), &a));
    assert_eq!(
        run.contents,
        vec![
            "var fixtures = window.fixtures;\ndescribe('a', () => {});\n",
            "var fixtures = window.fixtures;\ndescribe('b', () => {});\n",
        ]
    );
}

#[tokio::test]
async fn empty_test_list_runs_an_empty_suite() {
    let ws = Workspace::new();
    let engine = MockTestEngine::passing(0);

    let report = harness(&MockEnvironment::new(), &engine, &CapturedConsole::new())
        .run_tests(&RunConfig::new(ws.build_dir()))
        .await
        .unwrap();

    assert!(report.success);
    assert!(engine.runs()[0].suite.files.is_empty());
    assert!(report.cleanup.is_empty());
}

#[tokio::test]
async fn unreadable_test_file_aborts_and_removes_earlier_stages() {
    let ws = Workspace::new();
    let a = ws.test_file("a.js", "it('a');");
    let missing = ws.dir.path().join("missing.js");
    let log = EventLog::new();
    let done_log = log.clone();
    let engine = MockTestEngine::passing(1);
    let config = RunConfig::builder(ws.build_dir())
        .test_file(&a)
        .test_file(&missing)
        .build();

    let err = harness(&MockEnvironment::new(), &engine, &CapturedConsole::new())
        .on_done(move |ok| done_log.record(format!("done:{ok}")))
        .run_tests(&config)
        .await
        .unwrap_err();

    assert!(matches!(err, HarnessError::Setup { .. }));
    assert!(engine.runs().is_empty());
    assert!(log.events().is_empty());
    assert!(ws.staged_files().is_empty());
}

// ============================================================================
// Environment
// ============================================================================

#[tokio::test]
async fn environment_failure_calls_no_hooks_and_stages_nothing() {
    let ws = Workspace::new();
    let a = ws.test_file("a.js", "it('a');");
    let log = EventLog::new();
    let (setup_log, done_log) = (log.clone(), log.clone());
    let config = RunConfig::builder(ws.build_dir())
        .test_file(&a)
        .url("http://localhost:9/app")
        .build();

    let err = harness(
        &MockEnvironment::unreachable("connection refused"),
        &MockTestEngine::passing(1),
        &CapturedConsole::new(),
    )
    .on_setup(move |_| setup_log.record("setup"))
    .on_done(move |ok| done_log.record(format!("done:{ok}")))
    .run_tests(&config)
    .await
    .unwrap_err();

    assert!(err.is_setup_failure());
    assert!(err.to_string().contains("http://localhost:9/app"));
    assert!(log.events().is_empty());
    assert!(ws.staged_files().is_empty());
}

#[tokio::test]
async fn script_errors_are_reported_and_the_run_continues() {
    let ws = Workspace::new();
    let env = MockEnvironment::new()
        .with_script_error(ScriptError::new(Some(0), "ReferenceError: jQuery is not defined"));
    let engine = MockTestEngine::passing(3);

    let report = harness(&env, &engine, &CapturedConsole::new())
        .run_tests(&RunConfig::new(ws.build_dir()))
        .await
        .unwrap();

    assert!(report.success);
    assert_eq!(report.stats.passes, 3);
    assert_eq!(report.script_errors.len(), 1);
    assert_eq!(engine.runs().len(), 1);
}

#[tokio::test]
async fn dom_content_loaded_fires_once_between_setup_and_engine() {
    let ws = Workspace::new();
    let a = ws.test_file("a.js", "it('a');");
    let log = EventLog::new();
    let setup_log = log.clone();
    let env = MockEnvironment::new().with_log(log.clone());
    let engine = MockTestEngine::passing(1).with_log(log.clone());
    let config = RunConfig::builder(ws.build_dir()).test_file(&a).build();

    harness(&env, &engine, &CapturedConsole::new())
        .on_setup(move |window| {
            window.set_global("fixtures", serde_json::json!({"user": "ada"}));
            setup_log.record("setup");
        })
        .run_tests(&config)
        .await
        .unwrap();

    assert_eq!(env.dispatched(), vec![DomEvent::dom_content_loaded()]);
    let setup = log.position("setup").unwrap();
    let ready = log.position("event:DOMContentLoaded").unwrap();
    let run = log.position("engine:run").unwrap();
    assert!(setup < ready && ready < run);
}

#[tokio::test]
async fn application_console_reaches_host_and_environment_noise_does_not() {
    use headless_harness::{ConsoleLevel, ConsoleMessage};

    let ws = Workspace::new();
    let console = CapturedConsole::new();
    let env = MockEnvironment::new()
        .with_console_message(ConsoleMessage::application(ConsoleLevel::Log, "app ready"))
        .with_console_message(ConsoleMessage::environment("Not implemented: navigation"));

    harness(&env, &MockTestEngine::passing(0), &console)
        .run_tests(&RunConfig::new(ws.build_dir()))
        .await
        .unwrap();

    assert_eq!(console.lines(), vec!["app ready"]);
}

// ============================================================================
// Isolation
// ============================================================================

#[tokio::test]
async fn concurrent_runs_keep_their_own_ambient_bindings() {
    let ws = Workspace::new();
    let first_engine = MockTestEngine::passing(1);
    let second_engine = MockTestEngine::passing(1);
    let first_config = RunConfig::new(ws.dir.path().join("one"));
    let second_config = RunConfig::new(ws.dir.path().join("two"));

    let first = harness(&MockEnvironment::new(), &first_engine, &CapturedConsole::new())
        .run_tests(&first_config);
    let second = harness(&MockEnvironment::new(), &second_engine, &CapturedConsole::new())
        .with_context(TestContext::default().with_binding("Promise", "native"))
        .run_tests(&second_config);
    let (first, second) = tokio::join!(first, second);
    first.unwrap();
    second.unwrap();

    assert_eq!(
        first_engine.runs()[0].context.provider("Promise"),
        Some("es6-promise")
    );
    assert_eq!(
        second_engine.runs()[0].context.provider("Promise"),
        Some("native")
    );
}
