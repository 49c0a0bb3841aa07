use async_trait::async_trait;
use tracing::info;

use super::context::{InstallContext, LoaderVersion};
use super::install_profile::read_installer_profile;
use super::installer::LoaderSource;
use super::profile::LoaderProfile;
use crate::core::downloader::DownloadTask;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::fetch_text;
use crate::core::maven::{MavenArtifact, MavenMetadata};

/// Game version whose NeoForge builds were published as `net.neoforged:forge`.
const LEGACY_GAME_VERSION: &str = "1.20.1";

/// NeoForge: similar to Forge but uses the NeoForge Maven and versioning.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeoForgeSource;

/// Where a game version's NeoForge builds live and how they are named.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Route {
    /// `net.neoforged:forge:1.20.1-47.1.x`
    Legacy,
    /// `net.neoforged:neoforge:{minor}.{patch}.x`
    Modern { prefix: String },
}

impl Route {
    fn for_game(game_version: &str) -> Self {
        if game_version == LEGACY_GAME_VERSION {
            return Route::Legacy;
        }
        // 1.21.1 -> "21.1.", 1.21 -> "21.0."
        let mut parts = game_version.split('.').skip(1);
        let minor = parts.next().unwrap_or("0");
        let patch = parts.next().unwrap_or("0");
        Route::Modern {
            prefix: format!("{}.{}.", minor, patch),
        }
    }

    fn artifact_id(&self) -> &'static str {
        match self {
            Route::Legacy => "forge",
            Route::Modern { .. } => "neoforge",
        }
    }

    /// Loader versions for this game version out of the full listing.
    fn filter(&self, all: &[String], game_version: &str) -> Vec<String> {
        match self {
            Route::Legacy => {
                let prefix = format!("{}-", game_version);
                all.iter()
                    .filter_map(|v| v.strip_prefix(&prefix))
                    .map(str::to_string)
                    .collect()
            }
            Route::Modern { prefix } => all
                .iter()
                .filter(|v| v.starts_with(prefix.as_str()))
                .cloned()
                .collect(),
        }
    }

    fn installer_artifact(&self, game_version: &str, loader_version: &str) -> MavenArtifact {
        let version = match self {
            Route::Legacy => format!("{}-{}", game_version, loader_version),
            Route::Modern { .. } => loader_version.to_string(),
        };
        MavenArtifact {
            group_id: "net.neoforged".into(),
            artifact_id: self.artifact_id().into(),
            version,
            classifier: Some("installer".into()),
            packaging: "jar".into(),
        }
    }
}

fn is_stable(version: &str) -> bool {
    !(version.contains("-beta") || version.contains("-alpha"))
}

#[async_trait]
impl LoaderSource for NeoForgeSource {
    async fn list_versions(&self, ctx: &InstallContext<'_>) -> LauncherResult<Vec<LoaderVersion>> {
        let route = Route::for_game(ctx.game_version);
        let url = format!(
            "{}/net/neoforged/{}/maven-metadata.xml",
            ctx.endpoints.neoforge_maven.trim_end_matches('/'),
            route.artifact_id()
        );
        let metadata = MavenMetadata::parse(&fetch_text(ctx.http_client, &url).await?)?;

        Ok(route
            .filter(&metadata.versions_newest_first(), ctx.game_version)
            .into_iter()
            .map(|v| {
                let stable = is_stable(&v);
                LoaderVersion::new(v, stable)
            })
            .collect())
    }

    async fn fetch_profile(
        &self,
        ctx: &InstallContext<'_>,
        loader_version: &str,
    ) -> LauncherResult<LoaderProfile> {
        info!(
            "Resolving NeoForge {} for MC {}",
            loader_version, ctx.game_version
        );

        let route = Route::for_game(ctx.game_version);
        let artifact = route.installer_artifact(ctx.game_version, loader_version);
        let installer = ctx.paths.libraries_dir().join(artifact.local_path());
        let task = DownloadTask::new(artifact.url(&ctx.endpoints.neoforge_maven), &installer)
            .named(artifact.to_string());
        ctx.downloader.fetch_verified(&task).await?;

        let neoforge_maven = ctx.endpoints.neoforge_maven.clone();
        let loader_version = loader_version.to_string();
        tokio::task::spawn_blocking(move || {
            read_installer_profile(&installer, &loader_version, &neoforge_maven)
        })
        .await
        .map_err(|e| LauncherError::Worker(e.to_string()))?
    }
}
