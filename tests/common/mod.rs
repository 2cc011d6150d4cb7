#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use instadon::models::visibility::Visibility;
use instadon::{RunRequest, SourceRef};
use serde_json::{Value, json};
use tera::{Context, Tera};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const MASTODON_TOKEN_ENV: &str = "INSTADON_TEST_MASTODON_TOKEN";
pub const LLM_KEY_ENV: &str = "INSTADON_TEST_LLM_KEY";

fn resource(rel: &str) -> String {
    let p = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/resources").join(rel);
    fs::read_to_string(p).unwrap()
}

/// Temporary directories and files one pipeline run needs.
pub struct Workspace {
    pub sessions: tempfile::TempDir,
    pub media: tempfile::TempDir,
    pub state: tempfile::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let sessions = tempfile::tempdir().unwrap();
        fs::write(
            sessions.path().join("session-default.json"),
            r#"{"sessionid": "test-session", "csrftoken": "test-csrf"}"#,
        )
        .unwrap();
        Self {
            sessions,
            media: tempfile::tempdir().unwrap(),
            state: tempfile::tempdir().unwrap(),
        }
    }

    pub fn tracker(&self) -> PathBuf {
        self.state.path().join("posted_instagram_ids.txt")
    }

    pub fn media_files(&self) -> usize {
        fs::read_dir(self.media.path()).unwrap().count()
    }

    pub fn request(&self, source: SourceRef, visibility: Visibility) -> RunRequest {
        RunRequest {
            source,
            visibility,
            session: "default".to_string(),
            tracker: self.tracker(),
            account: "kultur".to_string(),
        }
    }
}

pub fn render_config(base: &str, ws: &Workspace, llm_enabled: bool, max_chars: usize) -> tempfile::NamedTempFile {
    let tpl = resource("configs/instadon.yaml");
    let mut tera = Tera::default();
    tera.add_raw_template("cfg", &tpl).unwrap();
    let mut ctx = Context::new();
    ctx.insert("base", &base);
    ctx.insert("session_dir", &ws.sessions.path().to_str().unwrap());
    ctx.insert("temp_dir", &ws.media.path().to_str().unwrap());
    ctx.insert("llm_enabled", &llm_enabled);
    ctx.insert("max_chars", &max_chars);
    let config_text = tera.render("cfg", &ctx).unwrap();
    let cfg_file = tempfile::NamedTempFile::new().unwrap();
    fs::write(cfg_file.path(), config_text).unwrap();
    cfg_file
}

pub fn set_env(key: &str, value: &str) {
    unsafe { std::env::set_var(key, value) };
}

pub fn remove_env(key: &str) {
    unsafe { std::env::remove_var(key) };
}

pub async fn mount_profile(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/users/web_profile_info/"))
        .and(query_param("username", "kulturneubau"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(resource("mocks/profile.json"), "application/json"))
        .expect(1)
        .mount(server)
        .await;
}

pub async fn mount_shortcode(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/p/C0NEW1/"))
        .and(query_param("__a", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(resource("mocks/shortcode.json"), "application/json"))
        .expect(1)
        .mount(server)
        .await;
}

/// Resolver answers with a picker of `photos` images plus one audio track.
pub async fn mount_picker(server: &MockServer, photos: usize) {
    let base = server.uri();
    let mut items: Vec<Value> = (1..=photos)
        .map(|i| json!({"type": "photo", "url": format!("{}/cdn/{}.jpg", base, i)}))
        .collect();
    items.push(json!({"type": "audio", "url": format!("{}/cdn/track.mp3", base)}));
    mount_resolver(server, json!({"status": "picker", "picker": items})).await;
}

pub async fn mount_resolver(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path("/cobalt/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_cdn(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/cdn/.*\.jpg$"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0xFF, 0xD8, 0xFF, 0xE0], "image/jpeg"))
        .mount(server)
        .await;
}

/// Media uploads answer with increasing ids `m1`, `m2`, ...
pub async fn mount_mastodon_media(server: &MockServer) {
    let counter = Arc::new(AtomicUsize::new(0));
    Mock::given(method("POST"))
        .and(path("/masto/api/v2/media"))
        .respond_with(move |_: &Request| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            ResponseTemplate::new(200).set_body_json(json!({"id": format!("m{}", n), "type": "image"}))
        })
        .mount(server)
        .await;
}

/// Status creation answers with increasing ids `s1`, `s2`, ...
pub async fn mount_mastodon_statuses(server: &MockServer) {
    let counter = Arc::new(AtomicUsize::new(0));
    let base = server.uri();
    Mock::given(method("POST"))
        .and(path("/masto/api/v1/statuses"))
        .respond_with(move |_: &Request| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            ResponseTemplate::new(200).set_body_json(json!({
                "id": format!("s{}", n),
                "url": format!("{}/@kultur/s{}", base, n),
            }))
        })
        .mount(server)
        .await;
}

pub async fn mount_mastodon_statuses_with_error(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/masto/api/v1/statuses"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(server)
        .await;
}

pub async fn mount_chat_completion(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/llm/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })))
        .expect(1)
        .mount(server)
        .await;
}

/// JSON bodies of every status creation request, in arrival order.
pub async fn status_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/masto/api/v1/statuses")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

pub async fn requests_to(server: &MockServer, prefix: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path().starts_with(prefix))
        .count()
}

pub fn ledger_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}
