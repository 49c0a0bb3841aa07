use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use super::context::{InstallContext, LoaderVersion};
use super::install_profile::read_installer_profile;
use super::installer::LoaderSource;
use super::profile::LoaderProfile;
use crate::core::downloader::DownloadTask;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::{fetch_json, fetch_text};
use crate::core::maven::{MavenArtifact, MavenMetadata};

/// Forge, resolved from its maven listing and installer jars.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForgeSource;

/// `promotions_slim.json`
#[derive(Debug, Deserialize)]
pub struct ForgePromotions {
    #[serde(default)]
    pub promos: HashMap<String, String>,
}

impl ForgePromotions {
    pub fn recommended(&self, game_version: &str) -> Option<&str> {
        self.promos
            .get(&format!("{}-recommended", game_version))
            .map(String::as_str)
    }
}

/// Loader versions for `game_version` from a full Forge listing
/// (`1.20.1-47.2.0` -> `47.2.0`), keeping the listing's order.
pub fn versions_for_game(all: &[String], game_version: &str) -> Vec<String> {
    let prefix = format!("{}-", game_version);
    all.iter()
        .filter_map(|v| v.strip_prefix(&prefix))
        .map(str::to_string)
        .collect()
}

impl ForgeSource {
    fn installer_artifact(game_version: &str, loader_version: &str) -> MavenArtifact {
        MavenArtifact {
            group_id: "net.minecraftforge".into(),
            artifact_id: "forge".into(),
            version: format!("{}-{}", game_version, loader_version),
            classifier: Some("installer".into()),
            packaging: "jar".into(),
        }
    }

    async fn promotions(ctx: &InstallContext<'_>) -> Option<ForgePromotions> {
        match fetch_json(ctx.http_client, &ctx.endpoints.forge_promotions).await {
            Ok(promos) => Some(promos),
            Err(e) => {
                warn!("Forge promotions unavailable, no version marked stable: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl LoaderSource for ForgeSource {
    async fn list_versions(&self, ctx: &InstallContext<'_>) -> LauncherResult<Vec<LoaderVersion>> {
        let url = format!(
            "{}/net/minecraftforge/forge/maven-metadata.xml",
            ctx.endpoints.forge_maven.trim_end_matches('/')
        );
        let metadata = MavenMetadata::parse(&fetch_text(ctx.http_client, &url).await?)?;
        let versions = versions_for_game(&metadata.versions_newest_first(), ctx.game_version);

        let promotions = Self::promotions(ctx).await;
        let recommended = promotions
            .as_ref()
            .and_then(|p| p.recommended(ctx.game_version));

        Ok(versions
            .into_iter()
            .map(|v| {
                let stable = recommended == Some(v.as_str());
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
            "Resolving Forge {} for MC {}",
            loader_version, ctx.game_version
        );

        let artifact = Self::installer_artifact(ctx.game_version, loader_version);
        let installer = ctx.paths.libraries_dir().join(artifact.local_path());
        let task = DownloadTask::new(artifact.url(&ctx.endpoints.forge_maven), &installer)
            .named(artifact.to_string());
        ctx.downloader.fetch_verified(&task).await?;

        let forge_maven = ctx.endpoints.forge_maven.clone();
        let loader_version = loader_version.to_string();
        tokio::task::spawn_blocking(move || {
            read_installer_profile(&installer, &loader_version, &forge_maven)
        })
        .await
        .map_err(|e| LauncherError::Worker(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_is_filtered_by_game_version_prefix() {
        let all = vec![
            "1.20.2-48.0.1".to_string(),
            "1.20.1-47.2.20".to_string(),
            "1.20.1-47.2.0".to_string(),
            "1.20-46.0.14".to_string(),
        ];
        assert_eq!(versions_for_game(&all, "1.20.1"), vec!["47.2.20", "47.2.0"]);
        assert_eq!(versions_for_game(&all, "1.20"), vec!["46.0.14"]);
    }

    #[test]
    fn recommended_promotion_lookup() {
        let promos: ForgePromotions = serde_json::from_str(
            r#"{"homepage": "https://files.minecraftforge.net/", "promos": {
                "1.20.1-latest": "47.2.20", "1.20.1-recommended": "47.2.0"
            }}"#,
        )
        .unwrap();
        assert_eq!(promos.recommended("1.20.1"), Some("47.2.0"));
        assert_eq!(promos.recommended("1.20.2"), None);
    }

    #[test]
    fn installer_lives_in_the_maven_layout() {
        let artifact = ForgeSource::installer_artifact("1.20.1", "47.2.0");
        assert_eq!(
            artifact.url("https://maven.minecraftforge.net"),
            "https://maven.minecraftforge.net/net/minecraftforge/forge/1.20.1-47.2.0/forge-1.20.1-47.2.0-installer.jar"
        );
    }
}
