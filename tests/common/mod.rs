//! In-memory stand-in for the GitHub contents endpoint
//!
//! Serves one file, answers GET with wrapped base64 like GitHub does and
//! enforces the blob sha on PUT: a missing sha for an existing file is a
//! 422, a stale sha a 409.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use sha1::{Digest, Sha1};
use wiremock::matchers::path;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use github_json_cache::cache::envelope;
use github_json_cache::{CacheConfig, CacheDocument, CacheStore};

pub const CONTENTS_PATH: &str = "/repos/octo/site/contents/data/cache.json";

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub content: Vec<u8>,
    pub sha: String,
}

#[derive(Debug, Clone)]
pub struct PutRecord {
    pub message: String,
    pub sha: Option<String>,
    pub branch: Option<String>,
    pub status: u16,
}

#[derive(Default)]
struct State {
    file: Option<StoredFile>,
    puts: Vec<PutRecord>,
    gets: usize,
    fail_reads_with: Option<u16>,
}

#[derive(Clone, Default)]
pub struct FakeContents {
    state: Arc<Mutex<State>>,
}

/// Git blob hash of `content`
pub fn blob_sha(content: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("blob {}\0", content.len()).as_bytes());
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

fn wrap_base64(content: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(content);
    let mut wrapped = String::new();
    for chunk in encoded.as_bytes().chunks(60) {
        wrapped.push_str(std::str::from_utf8(chunk).unwrap());
        wrapped.push('\n');
    }
    wrapped
}

impl FakeContents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve this fake at the cache file path of `server`
    pub async fn mount(&self, server: &MockServer) {
        Mock::given(path(CONTENTS_PATH))
            .respond_with(self.clone())
            .mount(server)
            .await;
    }

    pub fn seed(&self, content: &[u8]) -> String {
        let sha = blob_sha(content);
        self.state.lock().unwrap().file = Some(StoredFile {
            content: content.to_vec(),
            sha: sha.clone(),
        });
        sha
    }

    /// Seed a compressed envelope written at `updated_at`
    pub fn seed_document(&self, document: Value, updated_at: DateTime<Utc>) -> String {
        let Value::Object(document) = document else {
            panic!("document must be an object");
        };
        let envelope = envelope::encode_at(&document, updated_at).unwrap();
        self.seed(&envelope.to_file_bytes().unwrap())
    }

    pub fn fail_reads_with(&self, status: u16) {
        self.state.lock().unwrap().fail_reads_with = Some(status);
    }

    pub fn file(&self) -> Option<StoredFile> {
        self.state.lock().unwrap().file.clone()
    }

    pub fn revision(&self) -> Option<String> {
        self.file().map(|f| f.sha)
    }

    /// Stored file parsed as JSON
    pub fn file_json(&self) -> Option<Value> {
        self.file()
            .map(|f| serde_json::from_slice(&f.content).expect("stored file is JSON"))
    }

    /// Stored file decoded back into a document
    pub fn stored_document(&self) -> Option<CacheDocument> {
        self.file()
            .map(|f| envelope::decode(&f.content).expect("stored file decodes").document)
    }

    pub fn puts(&self) -> Vec<PutRecord> {
        self.state.lock().unwrap().puts.clone()
    }

    pub fn successful_puts(&self) -> usize {
        self.puts().iter().filter(|p| p.status < 300).count()
    }

    pub fn gets(&self) -> usize {
        self.state.lock().unwrap().gets
    }

    fn handle_get(&self) -> ResponseTemplate {
        let mut state = self.state.lock().unwrap();
        state.gets += 1;
        if let Some(status) = state.fail_reads_with {
            return ResponseTemplate::new(status).set_body_string("injected failure");
        }
        match &state.file {
            None => ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})),
            Some(file) => ResponseTemplate::new(200).set_body_json(json!({
                "type": "file",
                "encoding": "base64",
                "size": file.content.len(),
                "path": "data/cache.json",
                "sha": file.sha,
                "content": wrap_base64(&file.content),
            })),
        }
    }

    fn handle_put(&self, request: &Request) -> ResponseTemplate {
        let body: Value = match serde_json::from_slice(&request.body) {
            Ok(body) => body,
            Err(_) => return ResponseTemplate::new(400),
        };
        let sha = body["sha"].as_str().map(String::from);
        let mut record = PutRecord {
            message: body["message"].as_str().unwrap_or_default().to_string(),
            sha: sha.clone(),
            branch: body["branch"].as_str().map(String::from),
            status: 200,
        };

        let mut state = self.state.lock().unwrap();
        let current = state.file.as_ref().map(|f| f.sha.clone());
        let status = match (&current, &sha) {
            (Some(_), None) => 422,
            (Some(current), Some(sha)) if current != sha => 409,
            (None, Some(_)) => 422,
            _ => 200,
        };
        record.status = status;
        state.puts.push(record);

        if status != 200 {
            let message = match status {
                409 => format!("data/cache.json does not match {}", sha.unwrap_or_default()),
                _ => "Invalid request.\n\n\"sha\" wasn't supplied.".to_string(),
            };
            return ResponseTemplate::new(status).set_body_json(json!({"message": message}));
        }

        let content = base64::engine::general_purpose::STANDARD
            .decode(body["content"].as_str().unwrap_or_default())
            .expect("PUT content is base64");
        let new_sha = blob_sha(&content);
        let created = current.is_none();
        state.file = Some(StoredFile {
            content,
            sha: new_sha.clone(),
        });

        ResponseTemplate::new(if created { 201 } else { 200 }).set_body_json(json!({
            "content": {"path": "data/cache.json", "sha": new_sha},
            "commit": {"sha": blob_sha(new_sha.as_bytes()), "message": body["message"]}
        }))
    }
}

impl Respond for FakeContents {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        match request.method.as_str() {
            "GET" => self.handle_get(),
            "PUT" => self.handle_put(request),
            _ => ResponseTemplate::new(405),
        }
    }
}

pub fn config(server: &MockServer) -> CacheConfig {
    CacheConfig::new("octo", "site")
        .with_api_url(server.uri())
        .with_token("ghp_test")
}

/// Store against a fresh fake
pub async fn setup() -> (MockServer, FakeContents, CacheStore) {
    let server = MockServer::start().await;
    let fake = FakeContents::new();
    fake.mount(&server).await;
    let store = CacheStore::new(&config(&server)).unwrap();
    (server, fake, store)
}

pub async fn setup_with_max_age(max_age: Duration) -> (MockServer, FakeContents, CacheStore) {
    let server = MockServer::start().await;
    let fake = FakeContents::new();
    fake.mount(&server).await;
    let store = CacheStore::new(&config(&server).with_max_age(max_age)).unwrap();
    (server, fake, store)
}
