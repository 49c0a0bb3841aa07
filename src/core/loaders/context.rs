use serde::Serialize;

use crate::core::downloader::Downloader;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::state::{Endpoints, LauncherPaths};

/// Everything a loader source needs to discover versions and fetch profiles
/// for one game version.
pub struct InstallContext<'a> {
    pub game_version: &'a str,
    pub paths: &'a LauncherPaths,
    pub endpoints: &'a Endpoints,
    pub downloader: &'a Downloader,
    pub http_client: &'a reqwest::Client,
}

/// One published loader version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoaderVersion {
    pub version: String,
    pub stable: bool,
}

impl LoaderVersion {
    pub fn new(version: impl Into<String>, stable: bool) -> Self {
        Self {
            version: version.into(),
            stable,
        }
    }
}

/// Pick the first stable entry, falling back to the first entry.
pub fn select_version<'v>(
    versions: &'v [LoaderVersion],
    loader: &str,
    game_version: &str,
) -> LauncherResult<&'v LoaderVersion> {
    versions
        .iter()
        .find(|v| v.stable)
        .or_else(|| versions.first())
        .ok_or_else(|| LauncherError::LoaderVersionNotFound {
            loader: loader.to_string(),
            game_version: game_version.to_string(),
        })
}
