use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::downloader::RetryPolicy;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::maven::{FABRIC_MAVEN, FORGE_MAVEN, MOJANG_LIBRARIES, NEOFORGE_MAVEN, QUILT_MAVEN};

const SETTINGS_FILE: &str = "launcher_settings.json";

/// Tunables read from `launcher_settings.json` in the data directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineSettings {
    pub max_concurrent_downloads: usize,
    pub request_timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub asset_chunk_size: usize,
    /// Java used for install processors; `java` on `PATH` when unset.
    pub java_path: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: 8,
            request_timeout_secs: 30,
            retry_attempts: 3,
            retry_delay_ms: 1000,
            asset_chunk_size: 500,
            java_path: None,
        }
    }
}

impl EngineSettings {
    /// Load settings from `data_dir`, falling back to defaults when the file
    /// does not exist.
    pub fn load(data_dir: &Path) -> LauncherResult<Self> {
        let path = data_dir.join(SETTINGS_FILE);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(LauncherError::Io { path, source }),
        };
        let settings: EngineSettings = serde_json::from_str(&raw)
            .map_err(|e| LauncherError::Settings(format!("{}: {}", path.display(), e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, data_dir: &Path) -> LauncherResult<()> {
        let path = data_dir.join(SETTINGS_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(LauncherError::io(&path))
    }

    pub fn validate(&self) -> LauncherResult<()> {
        if self.max_concurrent_downloads == 0 {
            return Err(LauncherError::Settings(
                "max_concurrent_downloads must be at least 1".into(),
            ));
        }
        if self.asset_chunk_size == 0 {
            return Err(LauncherError::Settings(
                "asset_chunk_size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, Duration::from_millis(self.retry_delay_ms))
    }

    pub fn java_binary(&self) -> PathBuf {
        self.java_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("java"))
    }
}

/// Remote endpoints. Overridable for mirrors and tests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Endpoints {
    pub version_manifest: String,
    pub mojang_libraries: String,
    pub resources: String,
    pub fabric_meta: String,
    pub fabric_maven: String,
    pub quilt_meta: String,
    pub quilt_maven: String,
    pub forge_maven: String,
    pub forge_promotions: String,
    pub neoforge_maven: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            version_manifest: "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json"
                .into(),
            mojang_libraries: MOJANG_LIBRARIES.into(),
            resources: "https://resources.download.minecraft.net".into(),
            fabric_meta: "https://meta.fabricmc.net/v2".into(),
            fabric_maven: FABRIC_MAVEN.into(),
            quilt_meta: "https://meta.quiltmc.org/v3".into(),
            quilt_maven: QUILT_MAVEN.into(),
            forge_maven: FORGE_MAVEN.into(),
            forge_promotions:
                "https://files.minecraftforge.net/net/minecraftforge/forge/promotions_slim.json"
                    .into(),
            neoforge_maven: NEOFORGE_MAVEN.into(),
        }
    }
}

impl Endpoints {
    /// Every endpoint rooted at one base URL, laid out as
    /// `{base}/mojang/...`, `{base}/fabric/...` and so on.
    pub fn rooted_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            version_manifest: format!("{}/mojang/version_manifest_v2.json", base),
            mojang_libraries: format!("{}/mojang/libraries", base),
            resources: format!("{}/resources", base),
            fabric_meta: format!("{}/fabric/meta", base),
            fabric_maven: format!("{}/fabric/maven", base),
            quilt_meta: format!("{}/quilt/meta", base),
            quilt_maven: format!("{}/quilt/maven", base),
            forge_maven: format!("{}/forge/maven", base),
            forge_promotions: format!("{}/forge/promotions_slim.json", base),
            neoforge_maven: format!("{}/neoforge/maven", base),
        }
    }
}
