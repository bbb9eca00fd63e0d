//! End-to-end coverage of the update pipeline and the webhook gateway,
//! driven against a mock GitHub API served on a loopback socket.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use flate2::write::GzEncoder;
use flate2::Compression;
use puller_core::activity::{LogSource, LogStatus};
use puller_core::{Config, StateLayout};
use puller_github::{ApiError, GithubClient};
use puller_store::UpdateLock;
use puller_sync::webhook::WebhookResponse;
use puller_sync::{SettingsPatch, SyncError, Updater};
use serde_json::json;

const SECRET: &str = "integration-gateway-secret";
const SHA_V1: &str = "0123456789abcdef0123456789abcdef01234567";
const SHA_V2: &str = "fedcba9876543210fedcba9876543210fedcba98";
const ARCHIVE_TOP: &str = "acme-theme-0123456";

fn default_theme_files() -> Vec<(&'static str, &'static str)> {
    vec![
        ("style.css", "/*\nTheme Name: Acme\nVersion: 2.0\n*/\n"),
        ("functions.php", "<?php // acme theme\n"),
        ("assets/app.css", "body { margin: 0 }\n"),
    ]
}

fn build_tarball(top_dir: &str, files: &[(&str, &str)]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut tar = tar::Builder::new(encoder);
    for (path, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        tar.append_data(&mut header, format!("{top_dir}/{path}"), content.as_bytes())
            .unwrap();
    }
    tar.into_inner().unwrap().finish().unwrap()
}

/// Mutable behavior knobs for the mock API, shared with the router.
#[derive(Clone)]
struct MockApi {
    sha: Arc<Mutex<String>>,
    tarball: Arc<Mutex<Vec<u8>>>,
    rate_limited: Arc<AtomicBool>,
}

impl MockApi {
    fn new() -> Self {
        Self {
            sha: Arc::new(Mutex::new(SHA_V1.to_string())),
            tarball: Arc::new(Mutex::new(build_tarball(ARCHIVE_TOP, &default_theme_files()))),
            rate_limited: Arc::new(AtomicBool::new(false)),
        }
    }

    fn sha(&self) -> String {
        self.sha.lock().unwrap().clone()
    }

    fn set_sha(&self, sha: &str) {
        *self.sha.lock().unwrap() = sha.to_string();
    }

    fn set_tarball(&self, files: &[(&str, &str)]) {
        *self.tarball.lock().unwrap() = build_tarball(ARCHIVE_TOP, files);
    }

    fn set_rate_limited(&self, limited: bool) {
        self.rate_limited.store(limited, Ordering::SeqCst);
    }
}

async fn repo_info() -> Json<serde_json::Value> {
    Json(json!({
        "full_name": "acme/theme",
        "description": "Acme storefront theme",
        "default_branch": "main",
        "private": false,
        "html_url": "https://github.com/acme/theme"
    }))
}

async fn latest_commit(State(api): State<MockApi>) -> Response {
    if api.rate_limited.load(Ordering::SeqCst) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"message": "API rate limit exceeded for test client"})),
        )
            .into_response();
    }
    Json(json!({
        "sha": api.sha(),
        "commit": {
            "message": "Deploy latest styles",
            "author": {"name": "Dev", "date": "2026-08-24T10:00:00Z"}
        }
    }))
    .into_response()
}

async fn branch_tarball(State(api): State<MockApi>) -> Vec<u8> {
    api.tarball.lock().unwrap().clone()
}

async fn spawn_api(api: MockApi) -> String {
    let router = Router::new()
        .route("/repos/:owner/:repo", get(repo_info))
        .route("/repos/:owner/:repo/commits/:branch", get(latest_commit))
        .route("/repos/:owner/:repo/tarball/:branch", get(branch_tarball))
        .with_state(api);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

struct Harness {
    _state: tempfile::TempDir,
    _www: tempfile::TempDir,
    theme_dir: PathBuf,
    updater: Arc<Updater>,
    api: MockApi,
}

impl Harness {
    /// Pre-populate the live theme directory, as if a theme were already
    /// deployed.
    fn seed_live_theme(&self, files: &[(&str, &str)]) {
        for (path, content) in files {
            let full = self.theme_dir.join(path);
            std::fs::create_dir_all(full.parent().unwrap()).unwrap();
            std::fs::write(full, content).unwrap();
        }
    }

    fn newest_log_entry(&self) -> puller_core::LogEntry {
        self.updater.recent_log(1).into_iter().next().expect("log entry")
    }
}

async fn harness() -> Harness {
    let api = MockApi::new();
    let base = spawn_api(api.clone()).await;

    let state = tempfile::tempdir().unwrap();
    let www = tempfile::tempdir().unwrap();
    let theme_dir = www.path().join("acme-theme");

    let layout = StateLayout::new(state.path());
    layout.create_dirs().unwrap();

    let mut config = Config::default();
    config.repo_url = "acme/theme".to_string();
    config.theme_dir = theme_dir.clone();
    config.webhook_secret = SECRET.to_string();
    config.save(&layout).unwrap();

    let client = GithubClient::with_base_url(&base, None);
    let updater = Arc::new(Updater::with_client(layout, config, client).unwrap());

    Harness {
        _state: state,
        _www: www,
        theme_dir,
        updater,
        api,
    }
}

// === Update pipeline ===

#[tokio::test]
async fn first_install_applies_theme_without_snapshot() {
    let h = harness().await;
    assert!(!h.theme_dir.exists());

    let outcome = h.updater.update(LogSource::Manual).await.unwrap();

    assert!(outcome.snapshot.is_none());
    assert_eq!(outcome.theme_name, "Acme");
    assert_eq!(outcome.commit.sha, SHA_V1);
    assert!(h.theme_dir.join("style.css").exists());
    assert!(h.theme_dir.join("assets/app.css").exists());
    assert_eq!(
        h.updater.config().last_applied_commit.as_deref(),
        Some(SHA_V1)
    );

    let entry = h.newest_log_entry();
    assert_eq!(entry.status, LogStatus::Success);
    assert_eq!(entry.source, LogSource::Manual);
}

#[tokio::test]
async fn update_snapshots_then_replaces_existing_theme() {
    let h = harness().await;
    h.seed_live_theme(&[
        ("style.css", "/*\nTheme Name: Acme\nVersion: 1.0\n*/\n"),
        ("legacy.php", "<?php // to be removed\n"),
    ]);

    let outcome = h.updater.update(LogSource::Manual).await.unwrap();

    let snapshot = outcome.snapshot.expect("existing theme must be snapshotted");
    assert!(snapshot.path.join("legacy.php").exists());

    // Delete-then-copy: files absent from the new archive are gone.
    assert!(!h.theme_dir.join("legacy.php").exists());
    assert!(h.theme_dir.join("functions.php").exists());

    let snapshots = h.updater.list_snapshots().unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].name, snapshot.name);
}

#[tokio::test]
async fn check_for_updates_never_mutates_applied_commit() {
    let h = harness().await;
    h.updater.update(LogSource::Manual).await.unwrap();

    h.api.set_sha(SHA_V2);
    let check = h.updater.check_for_updates().await.unwrap();

    assert!(check.update_available);
    assert!(!check.is_first_install);
    assert_eq!(check.current_commit.as_deref(), Some(SHA_V1));
    assert_eq!(check.latest_commit.sha, SHA_V2);

    let config = h.updater.config();
    assert_eq!(config.last_applied_commit.as_deref(), Some(SHA_V1));
    assert!(config.last_check.is_some());
    assert!(!h.theme_dir.join("marker").exists());
}

#[tokio::test]
async fn check_before_any_update_reports_first_install() {
    let h = harness().await;
    let check = h.updater.check_for_updates().await.unwrap();
    assert!(check.is_first_install);
    assert!(!check.update_available);
    assert!(check.current_commit.is_none());
}

#[tokio::test]
async fn missing_manifest_leaves_live_theme_untouched() {
    let h = harness().await;
    h.seed_live_theme(&[("style.css", "/*\nTheme Name: Old Acme\n*/\n")]);
    h.api.set_tarball(&[("readme.md", "no manifest in here\n")]);

    let err = h.updater.update(LogSource::Webhook).await.unwrap_err();
    assert!(matches!(err, SyncError::NotATheme(_)));

    let live = std::fs::read_to_string(h.theme_dir.join("style.css")).unwrap();
    assert!(live.contains("Old Acme"));
    assert!(h.updater.config().last_applied_commit.is_none());

    // The pre-update snapshot was taken before validation failed.
    assert_eq!(h.updater.list_snapshots().unwrap().len(), 1);

    let entry = h.newest_log_entry();
    assert_eq!(entry.status, LogStatus::Error);
    assert_eq!(entry.source, LogSource::Webhook);
}

#[tokio::test]
async fn rate_limited_fetch_takes_no_snapshot() {
    let h = harness().await;
    h.seed_live_theme(&[("style.css", "/*\nTheme Name: Acme\n*/\n")]);
    h.api.set_rate_limited(true);

    let err = h.updater.update(LogSource::Manual).await.unwrap_err();
    assert!(matches!(err, SyncError::Api(ApiError::RateLimited(_))));

    // Commit lookup precedes the snapshot, so nothing was written.
    assert!(h.updater.list_snapshots().unwrap().is_empty());
    assert!(h.theme_dir.join("style.css").exists());
}

#[tokio::test]
async fn concurrent_update_fails_fast() {
    let h = harness().await;
    let _held = UpdateLock::acquire(&h.updater.layout().lock_file()).unwrap();

    let err = h.updater.update(LogSource::Manual).await.unwrap_err();
    assert!(err.is_busy());
    assert!(!h.theme_dir.exists());
}

#[tokio::test]
async fn theme_path_selects_repository_subdirectory() {
    let h = harness().await;
    h.api.set_tarball(&[
        ("readme.md", "monorepo\n"),
        (
            "wp-content/themes/acme/style.css",
            "/*\nTheme Name: Acme Child\n*/\n",
        ),
        ("wp-content/themes/acme/functions.php", "<?php\n"),
    ]);
    h.updater
        .apply_settings(SettingsPatch {
            theme_path: Some("wp-content/themes/acme".to_string()),
            ..Default::default()
        })
        .unwrap();

    let outcome = h.updater.update(LogSource::Manual).await.unwrap();

    assert_eq!(outcome.theme_name, "Acme Child");
    assert!(h.theme_dir.join("functions.php").exists());
    assert!(!h.theme_dir.join("readme.md").exists());
}

#[tokio::test]
async fn unknown_theme_path_fails_before_touching_live_files() {
    let h = harness().await;
    h.updater
        .apply_settings(SettingsPatch {
            theme_path: Some("does/not/exist".to_string()),
            ..Default::default()
        })
        .unwrap();

    let err = h.updater.update(LogSource::Manual).await.unwrap_err();
    assert!(matches!(err, SyncError::PathNotFound(_)));
    assert!(!h.theme_dir.exists());
}

#[tokio::test]
async fn restore_rolls_back_to_snapshot_contents() {
    let h = harness().await;
    h.seed_live_theme(&[("style.css", "/*\nTheme Name: Acme\nVersion: 1.0\n*/\n")]);

    let outcome = h.updater.update(LogSource::Manual).await.unwrap();
    let snapshot = outcome.snapshot.unwrap();

    h.updater.restore_snapshot(&snapshot.name).unwrap();

    let live = std::fs::read_to_string(h.theme_dir.join("style.css")).unwrap();
    assert!(live.contains("Version: 1.0"));
    assert!(!h.theme_dir.join("functions.php").exists());

    let entry = h.newest_log_entry();
    assert_eq!(entry.status, LogStatus::Success);
}

// === Webhook gateway ===

async fn spawn_gateway(updater: Arc<Updater>) -> String {
    let router = puller_sync::webhook::router(updater);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/webhook")
}

fn push_body(branch: &str, sha: &str) -> String {
    json!({
        "ref": format!("refs/heads/{branch}"),
        "after": sha,
        "head_commit": {"message": "Deploy latest styles"}
    })
    .to_string()
}

async fn deliver(
    url: &str,
    event: &str,
    body: &str,
    signature: Option<&str>,
) -> (StatusCode, WebhookResponse) {
    let mut request = reqwest::Client::new()
        .post(url)
        .header("x-github-event", event)
        .header("x-github-delivery", "d-0001")
        .body(body.to_string());
    if let Some(sig) = signature {
        request = request.header("x-hub-signature-256", sig.to_string());
    }
    let response = request.send().await.unwrap();
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
    let parsed: WebhookResponse = serde_json::from_str(&response.text().await.unwrap()).unwrap();
    (status, parsed)
}

fn signed(body: &str) -> String {
    puller_crypto::webhook::sign(SECRET, body.as_bytes())
}

#[tokio::test]
async fn ping_answers_pong_without_signature() {
    let h = harness().await;
    let url = spawn_gateway(h.updater.clone()).await;

    let (status, reply) = deliver(&url, "ping", "{}", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(reply.success);
    assert!(reply.message.contains("Pong"));
}

#[tokio::test]
async fn missing_signature_is_unauthorized() {
    let h = harness().await;
    let url = spawn_gateway(h.updater.clone()).await;

    let body = push_body("main", SHA_V1);
    let (status, reply) = deliver(&url, "push", &body, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(!reply.success);
    assert!(!h.theme_dir.exists());
}

#[tokio::test]
async fn invalid_signature_is_unauthorized() {
    let h = harness().await;
    let url = spawn_gateway(h.updater.clone()).await;

    let body = push_body("main", SHA_V1);
    let forged = puller_crypto::webhook::sign("wrong-secret", body.as_bytes());
    let (status, reply) = deliver(&url, "push", &body, Some(&forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(!reply.success);
    assert!(!h.theme_dir.exists());

    let entry = h.newest_log_entry();
    assert_eq!(entry.status, LogStatus::Error);
}

#[tokio::test]
async fn signed_non_push_event_is_acknowledged() {
    let h = harness().await;
    let url = spawn_gateway(h.updater.clone()).await;

    let body = r#"{"zen": "Keep it logically awesome."}"#;
    let (status, reply) = deliver(&url, "issues", body, Some(&signed(body))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(reply.success);
    assert!(reply.message.contains("not handled"));
}

#[tokio::test]
async fn malformed_push_payload_is_bad_request() {
    let h = harness().await;
    let url = spawn_gateway(h.updater.clone()).await;

    let body = "this is not json";
    let (status, reply) = deliver(&url, "push", body, Some(&signed(body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!reply.success);
}

#[tokio::test]
async fn push_to_other_branch_is_ignored() {
    let h = harness().await;
    let url = spawn_gateway(h.updater.clone()).await;

    let body = push_body("develop", SHA_V1);
    let (status, reply) = deliver(&url, "push", &body, Some(&signed(&body))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(reply.success);
    assert!(reply.message.contains("ignored"));
    assert!(!h.theme_dir.exists());
    assert!(h.updater.config().last_applied_commit.is_none());
}

#[tokio::test]
async fn push_with_auto_update_disabled_only_logs() {
    let h = harness().await;
    h.updater
        .apply_settings(SettingsPatch {
            auto_update: Some(false),
            ..Default::default()
        })
        .unwrap();
    let url = spawn_gateway(h.updater.clone()).await;

    let body = push_body("main", SHA_V1);
    let (status, reply) = deliver(&url, "push", &body, Some(&signed(&body))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(reply.success);
    assert!(reply.message.contains("disabled"));
    assert!(!h.theme_dir.exists());
}

#[tokio::test]
async fn push_to_tracked_branch_runs_the_pipeline() {
    let h = harness().await;
    let url = spawn_gateway(h.updater.clone()).await;

    let body = push_body("main", SHA_V1);
    let (status, reply) = deliver(&url, "push", &body, Some(&signed(&body))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(reply.success);
    assert!(reply.message.contains("updated"));

    assert!(h.theme_dir.join("style.css").exists());
    assert_eq!(
        h.updater.config().last_applied_commit.as_deref(),
        Some(SHA_V1)
    );
}

#[tokio::test]
async fn failed_webhook_update_reports_server_error() {
    let h = harness().await;
    h.api.set_tarball(&[("readme.md", "no manifest\n")]);
    let url = spawn_gateway(h.updater.clone()).await;

    let body = push_body("main", SHA_V1);
    let (status, reply) = deliver(&url, "push", &body, Some(&signed(&body))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!reply.success);
    assert!(h.updater.config().last_applied_commit.is_none());
}
