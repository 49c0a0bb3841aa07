use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

const APP_DIR_NAME: &str = "InterfaceOficial";
const BOOTSTRAP_FILE: &str = "launcher_bootstrap.json";

#[derive(Debug, Deserialize)]
struct BootstrapConfig {
    data_dir: PathBuf,
}

/// Filesystem layout of one launcher data directory.
///
/// ```text
/// <data_dir>/
///   libraries/
///   versions/<id>/<id>.json, <id>.jar
///   assets/indexes/, assets/objects/, assets/log_configs/
///   profiles/<name>/
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherPaths {
    data_dir: PathBuf,
}

impl LauncherPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Resolve the default data directory, honouring a bootstrap redirect
    /// written next to it.
    pub fn discover() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        let bootstrap_path = base.join(BOOTSTRAP_FILE);

        if let Ok(raw) = std::fs::read_to_string(&bootstrap_path) {
            if let Ok(cfg) = serde_json::from_str::<BootstrapConfig>(&raw) {
                debug!("Using data dir from {:?}", bootstrap_path);
                return Self::new(cfg.data_dir);
            }
        }

        Self::new(base.join(APP_DIR_NAME))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.data_dir.join("libraries")
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.data_dir.join("versions")
    }

    pub fn version_dir(&self, version_id: &str) -> PathBuf {
        self.versions_dir().join(version_id)
    }

    /// `versions/<id>/<id>.jar`
    pub fn client_jar(&self, version_id: &str) -> PathBuf {
        self.version_dir(version_id)
            .join(format!("{}.jar", version_id))
    }

    /// `versions/<id>/<id>.json`
    pub fn version_json(&self, version_id: &str) -> PathBuf {
        self.version_dir(version_id)
            .join(format!("{}.json", version_id))
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.data_dir.join("assets")
    }

    pub fn asset_indexes_dir(&self) -> PathBuf {
        self.assets_dir().join("indexes")
    }

    pub fn asset_objects_dir(&self) -> PathBuf {
        self.assets_dir().join("objects")
    }

    pub fn log_configs_dir(&self) -> PathBuf {
        self.assets_dir().join("log_configs")
    }

    pub fn profiles_dir(&self) -> PathBuf {
        self.data_dir.join("profiles")
    }

    pub fn profile_dir(&self, name: &str) -> PathBuf {
        self.profiles_dir().join(name)
    }

    /// Create the whole directory tree.
    pub async fn ensure_layout(&self) -> LauncherResult<()> {
        for dir in [
            self.libraries_dir(),
            self.versions_dir(),
            self.asset_indexes_dir(),
            self.asset_objects_dir(),
            self.profiles_dir(),
        ] {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(LauncherError::io(&dir))?;
        }
        Ok(())
    }

    /// Fail with a configuration error when `dir` is not an existing directory.
    pub fn require_dir(dir: &Path) -> LauncherResult<()> {
        if dir.is_dir() {
            Ok(())
        } else {
            Err(LauncherError::MissingDirectory(dir.to_path_buf()))
        }
    }
}
