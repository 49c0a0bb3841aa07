//! Shared fixtures for integration tests: a mock Mojang/loader backend on a
//! `wiremock` server and an isolated data directory per test.

#![allow(dead_code)]

use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use interface_installer::{
    Endpoints, EngineSettings, Installer, LauncherPaths, ProgressTracker,
};
use serde_json::json;
use sha1::{Digest, Sha1};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const GAME_VERSION: &str = "1.20.1";
pub const VANILLA_MAIN: &str = "net.minecraft.client.main.Main";

pub fn sha1_hex(bytes: &[u8]) -> String {
    hex::encode(Sha1::digest(bytes))
}

/// Serve `body` at `route` and return its absolute URL.
pub async fn serve(server: &MockServer, route: &str, body: impl Into<Vec<u8>>) -> String {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.into()))
        .mount(server)
        .await;
    format!("{}{}", server.uri(), route)
}

pub fn fast_settings() -> EngineSettings {
    EngineSettings {
        max_concurrent_downloads: 4,
        retry_attempts: 2,
        retry_delay_ms: 10,
        request_timeout_secs: 10,
        ..EngineSettings::default()
    }
}

/// Every `(completed, total)` pair the progress callback observed.
#[derive(Clone, Default)]
pub struct ProgressLog(Arc<Mutex<Vec<(u64, u64)>>>);

impl ProgressLog {
    pub fn tracker(&self) -> Arc<ProgressTracker> {
        let events = Arc::clone(&self.0);
        Arc::new(ProgressTracker::with_callback(Arc::new(
            move |_: &str, done: u64, total: u64| {
                events.lock().unwrap().push((done, total));
            },
        )))
    }

    pub fn events(&self) -> Vec<(u64, u64)> {
        self.0.lock().unwrap().clone()
    }
}

pub struct Fixture {
    pub server: MockServer,
    pub data_dir: TempDir,
    pub progress: ProgressLog,
}

impl Fixture {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            data_dir: TempDir::new().unwrap(),
            progress: ProgressLog::default(),
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::rooted_at(&self.server.uri())
    }

    pub fn paths(&self) -> LauncherPaths {
        LauncherPaths::new(self.data_dir.path())
    }

    pub fn installer(&self) -> Installer {
        Installer::new(
            self.paths(),
            fast_settings(),
            self.endpoints(),
            self.progress.tracker(),
        )
        .unwrap()
    }

    pub fn libraries(&self) -> std::path::PathBuf {
        self.paths().libraries_dir()
    }
}

/// A library in the Mojang `downloads.artifact` shape, served by the mock.
pub async fn mojang_library(server: &MockServer, name: &str, rel_path: &str) -> serde_json::Value {
    let body = format!("jar:{}", name).into_bytes();
    let url = serve(server, &format!("/mojang/libraries/{}", rel_path), body.clone()).await;
    json!({
        "name": name,
        "downloads": {"artifact": {
            "path": rel_path,
            "sha1": sha1_hex(&body),
            "size": body.len(),
            "url": url
        }}
    })
}

/// Mount the version manifest, the version JSON for [`GAME_VERSION`], its
/// client jar, two libraries and, optionally, an asset index with
/// `asset_count` objects.
pub async fn mount_game_version(server: &MockServer, asset_count: Option<usize>) {
    let client_jar = b"client jar bytes".to_vec();
    let client_url = serve(server, "/mojang/client.jar", client_jar.clone()).await;

    let libraries = vec![
        mojang_library(
            server,
            "com.mojang:brigadier:1.1.8",
            "com/mojang/brigadier/1.1.8/brigadier-1.1.8.jar",
        )
        .await,
        mojang_library(server, "org.ow2.asm:asm:9.3", "org/ow2/asm/asm/9.3/asm-9.3.jar").await,
    ];

    let mut version = json!({
        "id": GAME_VERSION,
        "type": "release",
        "mainClass": VANILLA_MAIN,
        "downloads": {"client": {
            "sha1": sha1_hex(&client_jar),
            "size": client_jar.len(),
            "url": client_url
        }},
        "libraries": libraries,
        "arguments": {"game": ["--username", "${auth_player_name}"], "jvm": []}
    });

    if let Some(count) = asset_count {
        let index = mount_asset_objects(server, count).await;
        let raw = serde_json::to_vec(&index).unwrap();
        let url = serve(server, "/mojang/indexes/5.json", raw.clone()).await;
        version["assetIndex"] = json!({
            "id": "5",
            "url": url,
            "sha1": sha1_hex(&raw),
            "totalSize": 0
        });
    }

    let raw = serde_json::to_vec(&version).unwrap();
    let version_url = serve(server, "/mojang/v1/1.20.1.json", raw).await;
    let manifest = json!({
        "latest": {"release": GAME_VERSION, "snapshot": GAME_VERSION},
        "versions": [{
            "id": GAME_VERSION,
            "type": "release",
            "releaseTime": "2023-06-12T13:25:51+00:00",
            "url": version_url
        }]
    });
    serve(
        server,
        "/mojang/version_manifest_v2.json",
        serde_json::to_vec(&manifest).unwrap(),
    )
    .await;
}

/// Serve `count` distinct asset objects under `/resources` and return the
/// index document describing them.
pub async fn mount_asset_objects(server: &MockServer, count: usize) -> serde_json::Value {
    let mut objects = serde_json::Map::new();
    for i in 0..count {
        let body = format!("asset object {}", i).into_bytes();
        let hash = sha1_hex(&body);
        serve(server, &format!("/resources/{}/{}", &hash[..2], hash), body.clone()).await;
        objects.insert(
            format!("minecraft/sounds/{}.ogg", i),
            json!({"hash": hash, "size": body.len()}),
        );
    }
    json!({ "objects": objects })
}

/// Zip `entries` into an in-memory jar.
pub fn build_jar(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::SimpleFileOptions::default();
        for (name, bytes) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(bytes).unwrap();
        }
        zip.finish().unwrap();
    }
    cursor.into_inner()
}

pub fn maven_metadata(group: &str, artifact: &str, versions: &[&str]) -> String {
    let versions: String = versions
        .iter()
        .map(|v| format!("<version>{}</version>", v))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <metadata><groupId>{}</groupId><artifactId>{}</artifactId>\
         <versioning><versions>{}</versions></versioning></metadata>",
        group, artifact, versions
    )
}

pub fn assert_exists(path: &Path) {
    assert!(path.is_file(), "expected {:?} to exist", path);
}
