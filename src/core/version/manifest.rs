// ─── Version Manifest ───
// Handles fetching the Mojang version manifest v2 and resolving one game
// version to its version JSON.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::version_file::VersionJson;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::{fetch_json, fetch_text};
use crate::core::state::LauncherPaths;

/// Top-level Mojang version manifest.
#[derive(Debug, Deserialize)]
pub struct VersionManifest {
    #[serde(default)]
    pub latest: Option<LatestVersions>,
    pub versions: Vec<VersionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatestVersions {
    pub release: String,
    pub snapshot: String,
}

/// A single entry in the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub version_type: String,
    #[serde(rename = "releaseTime", default)]
    pub release_time: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

impl VersionManifest {
    pub async fn fetch(client: &Client, url: &str) -> LauncherResult<Self> {
        info!("Fetching Minecraft version manifest...");
        let manifest: VersionManifest = fetch_json(client, url).await?;
        info!("Loaded {} versions from manifest", manifest.versions.len());
        Ok(manifest)
    }

    /// Find a specific version entry by ID (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// List all official stable versions (release only).
    pub fn releases(&self) -> Vec<&VersionEntry> {
        self.versions
            .iter()
            .filter(|v| v.version_type == "release")
            .collect()
    }
}

/// Supplies the resolved version JSON for a game version.
#[async_trait]
pub trait GameVersionProvider: Send + Sync {
    async fn version_json(&self, game_version: &str) -> LauncherResult<VersionJson>;
}

/// Resolves versions through the Mojang manifest and keeps a copy at
/// `versions/<id>/<id>.json`.
pub struct MojangVersionProvider {
    client: Client,
    manifest_url: String,
    paths: LauncherPaths,
}

impl MojangVersionProvider {
    pub fn new(client: Client, manifest_url: impl Into<String>, paths: LauncherPaths) -> Self {
        Self {
            client,
            manifest_url: manifest_url.into(),
            paths,
        }
    }

    async fn read_stored(&self, game_version: &str) -> Option<VersionJson> {
        let path = self.paths.version_json(game_version);
        let raw = tokio::fs::read_to_string(&path).await.ok()?;
        match serde_json::from_str(&raw) {
            Ok(version) => Some(version),
            Err(e) => {
                debug!("Ignoring unreadable {:?}: {}", path, e);
                None
            }
        }
    }
}

#[async_trait]
impl GameVersionProvider for MojangVersionProvider {
    async fn version_json(&self, game_version: &str) -> LauncherResult<VersionJson> {
        if let Some(stored) = self.read_stored(game_version).await {
            debug!("Using stored version JSON for {}", game_version);
            return Ok(stored);
        }

        let manifest = VersionManifest::fetch(&self.client, &self.manifest_url).await?;
        let entry = manifest
            .find_version(game_version)
            .ok_or_else(|| LauncherError::GameVersionNotFound(game_version.to_string()))?;

        let raw = fetch_text(&self.client, &entry.url).await?;
        let version: VersionJson =
            serde_json::from_str(&raw).map_err(|e| LauncherError::InvalidDocument {
                source_name: entry.url.clone(),
                reason: e.to_string(),
            })?;

        let path = self.paths.version_json(game_version);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(LauncherError::io(parent))?;
        }
        tokio::fs::write(&path, &raw)
            .await
            .map_err(LauncherError::io(&path))?;

        Ok(version)
    }
}
