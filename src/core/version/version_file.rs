// ─── Version File ───
// Parses a version JSON (Mojang's, or the one embedded in a Forge/NeoForge
// installer) and turns it into download tasks and library entries.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;

use super::rules::{self, PlatformRule, RuleAction};
use crate::core::downloader::{dedup_by_destination, DownloadTask};
use crate::core::loaders::profile::LibraryEntry;
use crate::core::maven::resolve_path_or_raw;
use crate::core::state::LauncherPaths;

/// A fully parsed version JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionJson {
    pub id: String,
    pub main_class: String,
    #[serde(default)]
    pub inherits_from: Option<String>,
    #[serde(default)]
    pub libraries: Vec<VersionLibrary>,
    #[serde(default)]
    pub downloads: Option<VersionDownloads>,
    #[serde(default)]
    pub asset_index: Option<AssetIndexInfo>,
    #[serde(default)]
    pub arguments: Option<Arguments>,
    /// Legacy `minecraftArguments` field (pre-1.13).
    #[serde(default)]
    pub minecraft_arguments: Option<String>,
    #[serde(default)]
    pub logging: Option<LoggingInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionDownloads {
    pub client: Option<DownloadArtifact>,
    #[serde(default)]
    pub server: Option<DownloadArtifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadArtifact {
    pub sha1: String,
    #[serde(default)]
    pub size: u64,
    pub url: String,
}

/// Asset index descriptor handed to the asset pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexInfo {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub total_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Arguments {
    #[serde(default)]
    pub game: Vec<serde_json::Value>,
    #[serde(default)]
    pub jvm: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingInfo {
    #[serde(default)]
    pub client: Option<LoggingClient>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingClient {
    #[serde(default)]
    pub argument: Option<String>,
    pub file: LoggingFile,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingFile {
    pub id: String,
    pub sha1: String,
    #[serde(default)]
    pub size: u64,
    pub url: String,
}

// ─── Library ───

/// One `libraries[]` element. Covers the Mojang shape (`downloads.artifact`)
/// and the bare Maven shape (`name` + `url`) used by older profiles.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionLibrary {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    #[serde(default)]
    pub rules: Option<Vec<LibraryRule>>,
    #[serde(default)]
    pub natives: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<LibDownloadArtifact>,
    #[serde(default)]
    pub classifiers: Option<HashMap<String, LibDownloadArtifact>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibDownloadArtifact {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryRule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsRule>,
    #[serde(default)]
    pub features: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OsRule {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
}

impl LibraryRule {
    /// The OS-name part of the rule, or `None` when it can never apply here
    /// (feature-gated, or pinned to another architecture).
    fn to_platform_rule(&self) -> Option<PlatformRule> {
        if self.features.is_some() {
            return None;
        }
        let os = self.os.as_ref();
        if let Some(arch) = os.and_then(|os| os.arch.as_deref()) {
            if arch != current_arch() {
                return None;
            }
        }
        Some(PlatformRule {
            os_name: os.and_then(|os| os.name.clone()),
            action: self.action,
        })
    }
}

fn current_arch() -> &'static str {
    if cfg!(target_pointer_width = "64") {
        "x86_64"
    } else {
        "x86"
    }
}

impl VersionLibrary {
    pub fn platform_rules(&self) -> Vec<PlatformRule> {
        self.rules
            .iter()
            .flatten()
            .filter_map(LibraryRule::to_platform_rule)
            .collect()
    }

    pub fn is_allowed_for(&self, os: &str) -> bool {
        rules::is_allowed(&self.platform_rules(), os)
    }

    /// Native classifier artifact for `os`, if this library ships one.
    pub fn native_artifact(&self, os: &str) -> Option<&LibDownloadArtifact> {
        let classifier = self.natives.as_ref()?.get(os)?;
        let arch = if cfg!(target_pointer_width = "64") { "64" } else { "32" };
        let classifier = classifier.replace("${arch}", arch);
        self.downloads
            .as_ref()?
            .classifiers
            .as_ref()?
            .get(&classifier)
    }

    /// Normalize into a [`LibraryEntry`]. Bare Maven entries without their
    /// own `url` are looked up in `default_repo`.
    pub fn to_library_entry(&self, default_repo: &str) -> LibraryEntry {
        let mut entry = match &self.downloads {
            Some(downloads) => match &downloads.artifact {
                Some(artifact) => {
                    let download_url = Some(artifact.url.clone()).filter(|u| !u.is_empty());
                    LibraryEntry {
                        name: self.name.clone(),
                        downloadable: download_url.is_some(),
                        download_url,
                        destination_path: artifact
                            .path
                            .as_deref()
                            .filter(|p| !p.is_empty())
                            .map(PathBuf::from)
                            .unwrap_or_else(|| resolve_path_or_raw(&self.name)),
                        expected_sha1: artifact.sha1.clone().filter(|s| !s.is_empty()),
                        platform_rules: Vec::new(),
                        include_in_classpath: true,
                    }
                }
                // Classifier-only: natives are fetched separately, nothing to
                // put on the classpath.
                None => {
                    let mut entry = LibraryEntry::from_coordinate(&self.name, None);
                    entry.include_in_classpath = false;
                    entry
                }
            },
            None => {
                let repo = self.url.as_deref().unwrap_or(default_repo);
                LibraryEntry::from_coordinate(&self.name, Some(repo)).with_sha1(self.sha1.clone())
            }
        };
        entry.platform_rules = self.platform_rules();
        entry
    }
}

impl VersionJson {
    /// Every library as a normalized entry, in declaration order.
    pub fn library_entries(&self, default_repo: &str) -> Vec<LibraryEntry> {
        self.libraries
            .iter()
            .map(|lib| lib.to_library_entry(default_repo))
            .collect()
    }

    /// Client jar, libraries, natives and logging config for `os`.
    pub fn core_tasks(
        &self,
        paths: &LauncherPaths,
        default_repo: &str,
        os: &str,
    ) -> Vec<DownloadTask> {
        let mut tasks = Vec::new();

        if let Some(client) = self.downloads.as_ref().and_then(|d| d.client.as_ref()) {
            tasks.push(
                DownloadTask::new(&client.url, paths.client_jar(&self.id))
                    .with_sha1(Some(client.sha1.clone()))
                    .named(format!("{}.jar", self.id)),
            );
        }

        let libs_dir = paths.libraries_dir();
        for lib in &self.libraries {
            if !lib.is_allowed_for(os) {
                debug!("Skipping library (OS rule): {}", lib.name);
                continue;
            }
            if let Some(task) = lib.to_library_entry(default_repo).download_task(&libs_dir) {
                tasks.push(task);
            }
            if let Some(native) = lib.native_artifact(os) {
                if let Some(path) = native.path.as_deref().filter(|_| !native.url.is_empty()) {
                    tasks.push(
                        DownloadTask::new(&native.url, libs_dir.join(path))
                            .with_sha1(native.sha1.clone()),
                    );
                }
            }
        }

        if let Some(logging) = self.logging.as_ref().and_then(|l| l.client.as_ref()) {
            tasks.push(
                DownloadTask::new(&logging.file.url, paths.log_configs_dir().join(&logging.file.id))
                    .with_sha1(Some(logging.file.sha1.clone())),
            );
        }

        dedup_by_destination(&mut tasks);
        tasks
    }

    /// Extract simple game arguments (string-only, no feature-gated entries).
    pub fn simple_game_args(&self, os: &str) -> Vec<String> {
        match &self.arguments {
            Some(args) => args
                .game
                .iter()
                .flat_map(|v| extract_argument_values(v, os))
                .collect(),
            None => match &self.minecraft_arguments {
                Some(s) => s.split_whitespace().map(str::to_string).collect(),
                None => vec![],
            },
        }
    }

    /// Extract simple JVM arguments (string-only, no feature-gated entries).
    pub fn simple_jvm_args(&self, os: &str) -> Vec<String> {
        match &self.arguments {
            Some(args) => args
                .jvm
                .iter()
                .flat_map(|v| extract_argument_values(v, os))
                .collect(),
            None => vec![],
        }
    }
}

fn extract_argument_values(value: &serde_json::Value, os: &str) -> Vec<String> {
    if let Some(arg) = value.as_str() {
        return vec![arg.to_string()];
    }

    let Some(obj) = value.as_object() else {
        return vec![];
    };

    if let Some(raw_rules) = obj.get("rules") {
        let Ok(rules) = serde_json::from_value::<Vec<LibraryRule>>(raw_rules.clone()) else {
            return vec![];
        };
        if !argument_allowed(&rules, os) {
            return vec![];
        }
    }

    match obj.get("value") {
        Some(serde_json::Value::String(s)) => vec![s.clone()],
        Some(serde_json::Value::Array(arr)) => arr
            .iter()
            .filter_map(|v| v.as_str().map(ToString::to_string))
            .collect(),
        _ => vec![],
    }
}

/// Argument rules are allow-lists: a conditional argument is only used when
/// some rule explicitly applies to this platform.
fn argument_allowed(rules: &[LibraryRule], os: &str) -> bool {
    if rules.iter().any(|r| r.features.is_some()) {
        return false;
    }
    let platform: Vec<PlatformRule> = rules.iter().filter_map(LibraryRule::to_platform_rule).collect();
    let any_applies = platform
        .iter()
        .any(|r| r.os_name.as_deref().map_or(true, |name| name == os));
    any_applies && rules::is_allowed(&platform, os)
}
