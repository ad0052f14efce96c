//! End-to-end download runs against a mock HTTP server: fresh install,
//! idempotent re-run, corrupt-file recovery, retry exhaustion and
//! cancellation.

use quarry::manifest::{
    Artifact, AssetIndexRef, Downloads, FileDescriptor, Library, LibraryDownloads, Logging,
    LoggingClient, LoggingFile, VersionManifest,
};
use quarry::{
    AggregateFailure, DownloadOrchestrator, FetchError, InstallConfig, Phase, ProgressReporter,
    SilentProgressReporter,
};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CLIENT_JAR: &[u8] = b"client-jar-bytes";
const CLIENT_JAR_SHA1: &str = "1ab8bae4511fe77dd464ca455a15a2c42dac53de";
const LIB_ONE: &[u8] = b"lib-one";
const LIB_ONE_SHA1: &str = "e9d14f02f0e4586fafe56c1eadf7c180ad146094";
const LIB_TWO: &[u8] = b"lib-two";
const LIB_TWO_SHA1: &str = "176671119bab4297c7abad2e897f5c002d719cf9";
const ASSET_ALPHA: &[u8] = b"asset-alpha";
const ASSET_ALPHA_SHA1: &str = "1d6b3f33dccbb1449979ead983366ef8d937396d";
const ASSET_BETA: &[u8] = b"asset-beta";
const ASSET_BETA_SHA1: &str = "b719a79422a6043c0fe99ee14dac72b0c650b959";
const LOGGING_XML: &[u8] = b"logging-config-xml";
const LOGGING_XML_SHA1: &str = "0f91f9797806b24c3903aa93bf77524a7f7e3373";

/// Asset index with three virtual paths sharing two distinct hashes.
fn asset_index_body() -> String {
    format!(
        r#"{{"objects":{{
            "sounds/alpha.ogg": {{"hash": "{alpha}", "size": {alpha_size}}},
            "sounds/alpha-copy.ogg": {{"hash": "{alpha}", "size": {alpha_size}}},
            "lang/beta.json": {{"hash": "{beta}", "size": {beta_size}}}
        }}}}"#,
        alpha = ASSET_ALPHA_SHA1,
        alpha_size = ASSET_ALPHA.len(),
        beta = ASSET_BETA_SHA1,
        beta_size = ASSET_BETA.len(),
    )
}

async fn sha1_of_bytes(bytes: &[u8]) -> String {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(tmp.path(), bytes).unwrap();
    quarry::hash::sha1_file(tmp.path()).await.unwrap()
}

fn library(name: &str, relative_path: &str, url: String, sha1: &str, size: u64) -> Library {
    Library {
        name: name.to_string(),
        downloads: Some(LibraryDownloads {
            artifact: Some(Artifact {
                path: relative_path.to_string(),
                url,
                sha1: sha1.to_string(),
                size,
            }),
            classifiers: None,
        }),
        rules: None,
        natives: None,
        url: None,
    }
}

async fn test_manifest(server: &MockServer, with_logging: bool) -> VersionManifest {
    let index_sha1 = sha1_of_bytes(asset_index_body().as_bytes()).await;
    VersionManifest {
        id: "1.20.1".to_string(),
        asset_index: AssetIndexRef {
            id: "5".to_string(),
            url: format!("{}/indexes/5.json", server.uri()),
            sha1: index_sha1,
            total_size: 0,
            size: 0,
        },
        downloads: Downloads {
            client: FileDescriptor {
                url: format!("{}/client.jar", server.uri()),
                sha1: CLIENT_JAR_SHA1.to_string(),
                size: CLIENT_JAR.len() as u64,
            },
        },
        libraries: vec![
            library(
                "a:one:1",
                "a/one/1/one-1.jar",
                format!("{}/libs/one-1.jar", server.uri()),
                LIB_ONE_SHA1,
                LIB_ONE.len() as u64,
            ),
            library(
                "a:two:1",
                "a/two/1/two-1.jar",
                format!("{}/libs/two-1.jar", server.uri()),
                LIB_TWO_SHA1,
                LIB_TWO.len() as u64,
            ),
        ],
        logging: with_logging.then(|| Logging {
            client: LoggingClient {
                file: LoggingFile {
                    id: "client-1.12.xml".to_string(),
                    url: format!("{}/log.xml", server.uri()),
                    sha1: LOGGING_XML_SHA1.to_string(),
                    size: LOGGING_XML.len() as u64,
                },
                argument: None,
            },
        }),
        main_class: "net.minecraft.client.main.Main".to_string(),
    }
}

/// Mounts every endpoint the test manifest references, each expected to be
/// hit exactly `expect` times over the server's lifetime. The logging route
/// is only mounted when the manifest carries a logging section; an
/// unconditional mock would make `server.verify()` demand a request the
/// engine rightly never makes.
async fn mount_all(server: &MockServer, expect: u64, with_logging: bool) {
    let mut routes: Vec<(&str, Vec<u8>)> = vec![
        ("/client.jar", CLIENT_JAR.to_vec()),
        ("/libs/one-1.jar", LIB_ONE.to_vec()),
        ("/libs/two-1.jar", LIB_TWO.to_vec()),
        ("/indexes/5.json", asset_index_body().into_bytes()),
        (
            "/res/1d/1d6b3f33dccbb1449979ead983366ef8d937396d",
            ASSET_ALPHA.to_vec(),
        ),
        (
            "/res/b7/b719a79422a6043c0fe99ee14dac72b0c650b959",
            ASSET_BETA.to_vec(),
        ),
    ];
    if with_logging {
        routes.push(("/log.xml", LOGGING_XML.to_vec()));
    }
    for (route, body) in routes {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .expect(expect)
            .mount(server)
            .await;
    }
}

fn orchestrator(root: &Path, server: &MockServer) -> DownloadOrchestrator {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = InstallConfig {
        retry_delay: Duration::from_millis(10),
        resources_base_url: format!("{}/res", server.uri()),
        ..InstallConfig::default()
    };
    DownloadOrchestrator::new(root, config).unwrap()
}

/// Records every progress callback for later assertions.
struct RecordingReporter {
    events: Mutex<Vec<(String, usize, usize, Phase)>>,
    totals: Mutex<Vec<(Phase, usize)>>,
}

impl RecordingReporter {
    fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            totals: Mutex::new(Vec::new()),
        }
    }
}

impl ProgressReporter for RecordingReporter {
    fn on_file_complete(&self, file_name: &str, completed: usize, total: usize, phase: Phase) {
        self.events
            .lock()
            .unwrap()
            .push((file_name.to_string(), completed, total, phase));
    }

    fn on_phase_total(&self, phase: Phase, total: usize) {
        self.totals.lock().unwrap().push((phase, total));
    }
}

#[tokio::test]
async fn fresh_install_downloads_and_verifies_everything() {
    let server = MockServer::start().await;
    mount_all(&server, 1, false).await;

    let tmp = tempfile::tempdir().unwrap();
    let orchestrator = orchestrator(tmp.path(), &server);
    let manifest = test_manifest(&server, false).await;
    let reporter = Arc::new(RecordingReporter::new());

    orchestrator
        .download_all(&manifest, reporter.clone())
        .await
        .unwrap();

    // Core: client jar + 2 libraries. Resource: 2 unique hashes out of 3
    // asset paths.
    let totals = reporter.totals.lock().unwrap().clone();
    assert!(totals.contains(&(Phase::Core, 3)));
    assert!(totals.contains(&(Phase::Resource, 2)));

    let layout = orchestrator.layout();
    let expectations: Vec<(std::path::PathBuf, &[u8], &str)> = vec![
        (layout.client_jar_path("1.20.1"), CLIENT_JAR, CLIENT_JAR_SHA1),
        (
            layout.library_path("a/one/1/one-1.jar").unwrap(),
            LIB_ONE,
            LIB_ONE_SHA1,
        ),
        (
            layout.library_path("a/two/1/two-1.jar").unwrap(),
            LIB_TWO,
            LIB_TWO_SHA1,
        ),
        (
            layout.asset_object_path(ASSET_ALPHA_SHA1),
            ASSET_ALPHA,
            ASSET_ALPHA_SHA1,
        ),
        (
            layout.asset_object_path(ASSET_BETA_SHA1),
            ASSET_BETA,
            ASSET_BETA_SHA1,
        ),
    ];
    for (path, bytes, sha1) in expectations {
        assert_eq!(std::fs::read(&path).unwrap(), bytes, "content of {:?}", path);
        assert_eq!(
            quarry::hash::sha1_file(&path).await.unwrap(),
            sha1,
            "hash of {:?}",
            path
        );
    }

    // Per-phase progress is monotonic and capped by the phase total.
    let events = reporter.events.lock().unwrap();
    for phase in [Phase::Core, Phase::Resource] {
        let mut last = 0;
        for (_, completed, total, event_phase) in events.iter() {
            if *event_phase != phase {
                continue;
            }
            assert!(*completed > last, "progress must strictly increase");
            assert!(*completed <= *total);
            last = *completed;
        }
    }

    // Exactly one request per file: the two asset paths sharing a hash were
    // deduplicated before download.
    server.verify().await;

    // A manifest without a logging section makes no logging request.
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.path() != "/log.xml"));
}

#[tokio::test]
async fn rerun_against_populated_root_transfers_nothing() {
    let server = MockServer::start().await;
    // Every endpoint may be hit exactly once across all three runs.
    mount_all(&server, 1, true).await;

    let tmp = tempfile::tempdir().unwrap();
    let orchestrator = orchestrator(tmp.path(), &server);
    let manifest = test_manifest(&server, true).await;

    for _ in 0..3 {
        orchestrator
            .download_all(&manifest, Arc::new(SilentProgressReporter))
            .await
            .unwrap();
    }

    server.verify().await;
}

#[tokio::test]
async fn logging_config_lands_beside_the_main_archive() {
    let server = MockServer::start().await;
    mount_all(&server, 1, true).await;

    let tmp = tempfile::tempdir().unwrap();
    let orchestrator = orchestrator(tmp.path(), &server);
    let manifest = test_manifest(&server, true).await;
    let reporter = Arc::new(RecordingReporter::new());

    orchestrator
        .download_all(&manifest, reporter.clone())
        .await
        .unwrap();

    let logging_path = orchestrator
        .layout()
        .logging_config_path("1.20.1", "client-1.12.xml");
    assert_eq!(std::fs::read(&logging_path).unwrap(), LOGGING_XML);

    // The logging config counts toward the core phase total.
    let totals = reporter.totals.lock().unwrap().clone();
    assert!(totals.contains(&(Phase::Core, 4)));
}

#[tokio::test]
async fn corrupt_existing_library_is_redownloaded() {
    let server = MockServer::start().await;
    mount_all(&server, 1, false).await;

    let tmp = tempfile::tempdir().unwrap();
    let orchestrator = orchestrator(tmp.path(), &server);
    let manifest = test_manifest(&server, false).await;

    // Pre-place wrong content where lib-one belongs.
    let lib_path = orchestrator
        .layout()
        .library_path("a/one/1/one-1.jar")
        .unwrap();
    std::fs::create_dir_all(lib_path.parent().unwrap()).unwrap();
    std::fs::write(&lib_path, b"corrupted").unwrap();

    orchestrator
        .download_all(&manifest, Arc::new(SilentProgressReporter))
        .await
        .unwrap();

    assert_eq!(std::fs::read(&lib_path).unwrap(), LIB_ONE);
    assert_eq!(
        quarry::hash::sha1_file(&lib_path).await.unwrap(),
        LIB_ONE_SHA1
    );
}

#[tokio::test]
async fn exhausted_retries_surface_in_aggregate_without_aborting_siblings() {
    let server = MockServer::start().await;
    for (route, body) in [
        ("/client.jar", CLIENT_JAR.to_vec()),
        ("/libs/one-1.jar", LIB_ONE.to_vec()),
        ("/indexes/5.json", asset_index_body().into_bytes()),
        (
            "/res/1d/1d6b3f33dccbb1449979ead983366ef8d937396d",
            ASSET_ALPHA.to_vec(),
        ),
        (
            "/res/b7/b719a79422a6043c0fe99ee14dac72b0c650b959",
            ASSET_BETA.to_vec(),
        ),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(&server)
            .await;
    }
    // lib-two always fails: attempted exactly retry_count times.
    Mock::given(method("GET"))
        .and(path("/libs/two-1.jar"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let orchestrator = orchestrator(tmp.path(), &server);
    let manifest = test_manifest(&server, false).await;
    let reporter = Arc::new(RecordingReporter::new());

    let error = orchestrator
        .download_all(&manifest, reporter.clone())
        .await
        .unwrap_err();

    let aggregate = error
        .downcast_ref::<AggregateFailure>()
        .expect("aggregate failure");
    assert_eq!(aggregate.failures.len(), 1);
    assert_eq!(aggregate.failures[0].name, "a:two:1");
    assert!(matches!(
        aggregate.failures[0].error,
        FetchError::Status { .. }
    ));

    // Siblings completed despite the failure, and the failed item still got
    // its terminal progress record: core reaches 3/3.
    let events = reporter.events.lock().unwrap();
    let core_max = events
        .iter()
        .filter(|(_, _, _, phase)| *phase == Phase::Core)
        .map(|(_, completed, _, _)| *completed)
        .max()
        .unwrap();
    assert_eq!(core_max, 3);

    // Nothing half-written at the failed destination.
    let lib_two = orchestrator
        .layout()
        .library_path("a/two/1/two-1.jar")
        .unwrap();
    assert!(!lib_two.exists());
    assert!(orchestrator.layout().client_jar_path("1.20.1").exists());

    server.verify().await;
}

#[tokio::test]
async fn cancelled_run_performs_no_transfers() {
    struct CancelledReporter;
    impl ProgressReporter for CancelledReporter {
        fn on_file_complete(&self, _: &str, _: usize, _: usize, _: Phase) {}
        fn is_cancelled(&self) -> bool {
            true
        }
    }

    let server = MockServer::start().await;
    mount_all(&server, 0, false).await;

    let tmp = tempfile::tempdir().unwrap();
    let orchestrator = orchestrator(tmp.path(), &server);
    let manifest = test_manifest(&server, false).await;

    let error = orchestrator
        .download_all(&manifest, Arc::new(CancelledReporter))
        .await
        .unwrap_err();
    assert!(error
        .chain()
        .any(|cause| cause.to_string().contains("cancelled")));

    server.verify().await;
}
