// ─── Loader Profile ───
// The resolved, loader-agnostic description of what a loader version needs:
// libraries, main class and (Forge/NeoForge only) install processors.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::downloader::DownloadTask;
use crate::core::maven::{resolve_path_or_raw, MavenArtifact};
use crate::core::version::rules::{self, PlatformRule};

/// Token some loader manifests use in place of the game version.
pub const GAME_VERSION_PLACEHOLDER: &str = "${gameVersion-placeholder}";

/// One library a profile depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub name: String,
    pub download_url: Option<String>,
    /// Relative to the libraries directory.
    pub destination_path: PathBuf,
    pub expected_sha1: Option<String>,
    pub platform_rules: Vec<PlatformRule>,
    pub include_in_classpath: bool,
    pub downloadable: bool,
}

impl LibraryEntry {
    /// Library located purely by its Maven coordinate under `repo`.
    pub fn from_coordinate(name: &str, repo: Option<&str>) -> Self {
        let artifact = MavenArtifact::parse(name).ok();
        let download_url = match (&artifact, repo) {
            (Some(artifact), Some(repo)) => Some(artifact.url(repo)),
            _ => None,
        };
        Self {
            name: name.to_string(),
            downloadable: download_url.is_some(),
            download_url,
            destination_path: resolve_path_or_raw(name),
            expected_sha1: None,
            platform_rules: Vec::new(),
            include_in_classpath: true,
        }
    }

    pub fn with_sha1(mut self, sha1: Option<String>) -> Self {
        self.expected_sha1 = sha1.filter(|s| !s.is_empty());
        self
    }

    pub fn is_allowed_for(&self, os: &str) -> bool {
        rules::is_allowed(&self.platform_rules, os)
    }

    pub fn is_allowed_for_current_os(&self) -> bool {
        self.is_allowed_for(rules::current_os_name())
    }

    pub fn absolute_path(&self, libs_dir: &Path) -> PathBuf {
        libs_dir.join(&self.destination_path)
    }

    /// Task that fetches this library, if it has anywhere to be fetched from.
    pub fn download_task(&self, libs_dir: &Path) -> Option<DownloadTask> {
        if !self.downloadable {
            return None;
        }
        let url = self.download_url.as_deref()?;
        Some(
            DownloadTask::new(url, self.absolute_path(libs_dir))
                .with_sha1(self.expected_sha1.clone())
                .named(self.name.clone()),
        )
    }

    /// Replace the game-version placeholder in every coordinate-derived field.
    pub fn substitute_game_version(&mut self, game_version: &str) {
        if !self.name.contains(GAME_VERSION_PLACEHOLDER) {
            return;
        }
        self.name = self.name.replace(GAME_VERSION_PLACEHOLDER, game_version);
        self.destination_path = PathBuf::from(
            self.destination_path
                .to_string_lossy()
                .replace(GAME_VERSION_PLACEHOLDER, game_version),
        );
        if let Some(url) = &mut self.download_url {
            *url = url.replace(GAME_VERSION_PLACEHOLDER, game_version);
        }
    }
}

/// A legacy install-time program declared by Forge/NeoForge profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Processor {
    pub jar: String,
    #[serde(default)]
    pub classpath: Vec<String>,
    #[serde(default)]
    pub args: Vec<String>,
    /// `{path} -> {sha1}`, both sides may contain placeholders.
    #[serde(default)]
    pub outputs: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub sides: Option<Vec<String>>,
}

impl Processor {
    /// A missing `sides` list means the processor always runs.
    pub fn runs_on_client(&self) -> bool {
        self.sides
            .as_ref()
            .map_or(true, |sides| sides.iter().any(|s| s == "client"))
    }
}

/// Sided value from the profile's `data` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataField {
    pub client: String,
    #[serde(default)]
    pub server: Option<String>,
}

/// Shape of a raw data value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataValue {
    /// `group:artifact:version[:classifier][@ext]`
    Coordinate(MavenArtifact),
    /// `[group:artifact:version...]`
    ListLiteral(MavenArtifact),
    /// Anything else: literals, installer paths, hashes.
    Opaque(String),
}

impl DataValue {
    pub fn classify(raw: &str) -> Self {
        let trimmed = raw.trim();

        if let Some(inner) = trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            return match parse_bare_coordinate(inner) {
                Some(artifact) => DataValue::ListLiteral(artifact),
                None => DataValue::Opaque(raw.to_string()),
            };
        }

        match parse_bare_coordinate(trimmed) {
            Some(artifact) => DataValue::Coordinate(artifact),
            None => DataValue::Opaque(raw.to_string()),
        }
    }
}

fn parse_bare_coordinate(raw: &str) -> Option<MavenArtifact> {
    if raw.contains(['/', '\\', '\'', ',', ' ']) {
        return None;
    }
    MavenArtifact::parse(raw).ok()
}

/// Everything one loader version needs on top of the base game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderProfile {
    pub loader_version: String,
    pub main_class: String,
    pub libraries: Vec<LibraryEntry>,
    #[serde(default)]
    pub processors: Option<Vec<Processor>>,
    #[serde(default)]
    pub data: Option<BTreeMap<String, DataField>>,
    #[serde(default)]
    pub jvm_args: Vec<String>,
    #[serde(default)]
    pub game_args: Vec<String>,
    /// Installer jar the processors and embedded artifacts come from.
    #[serde(default)]
    pub installer: Option<PathBuf>,
}

impl LoaderProfile {
    pub fn new(loader_version: impl Into<String>, main_class: impl Into<String>) -> Self {
        Self {
            loader_version: loader_version.into(),
            main_class: main_class.into(),
            libraries: Vec::new(),
            processors: None,
            data: None,
            jvm_args: Vec::new(),
            game_args: Vec::new(),
            installer: None,
        }
    }

    /// Rewrite placeholder coordinates with the resolved game version.
    pub fn substitute_game_version(&mut self, game_version: &str) {
        for lib in &mut self.libraries {
            lib.substitute_game_version(game_version);
        }
        for processor in self.processors.iter_mut().flatten() {
            processor.jar = processor.jar.replace(GAME_VERSION_PLACEHOLDER, game_version);
            for cp in &mut processor.classpath {
                *cp = cp.replace(GAME_VERSION_PLACEHOLDER, game_version);
            }
        }
    }

    pub fn has_processors(&self) -> bool {
        self.processors.as_ref().is_some_and(|p| !p.is_empty())
    }

    /// Download tasks for every library that applies to `os` and can be fetched.
    pub fn download_tasks(&self, libs_dir: &Path, os: &str) -> Vec<DownloadTask> {
        self.libraries
            .iter()
            .filter(|lib| lib.is_allowed_for(os))
            .filter_map(|lib| lib.download_task(libs_dir))
            .collect()
    }
}
