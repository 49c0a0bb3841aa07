use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::context::{InstallContext, LoaderVersion};
use super::installer::LoaderSource;
use super::profile::LoaderProfile;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::fetch_json;
use crate::core::version::VersionLibrary;

/// `GET {meta}/versions/loader/{mc}` element. Shared by Fabric and Quilt.
#[derive(Debug, Deserialize)]
pub struct MetaLoaderEntry {
    pub loader: MetaLoader,
}

#[derive(Debug, Deserialize)]
pub struct MetaLoader {
    pub version: String,
    /// Fabric only; Quilt leaves stability to the version string.
    #[serde(default)]
    pub stable: Option<bool>,
}

/// `GET {meta}/versions/loader/{mc}/{loader}/profile/json`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaProfile {
    pub main_class: String,
    #[serde(default)]
    pub libraries: Vec<VersionLibrary>,
    #[serde(default)]
    pub arguments: Option<MetaArguments>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MetaArguments {
    #[serde(default)]
    pub jvm: Vec<String>,
    #[serde(default)]
    pub game: Vec<String>,
}

/// Fetch a meta-API profile and normalize it. Libraries without their own
/// repository URL come from `default_maven`.
pub(crate) async fn fetch_meta_profile(
    ctx: &InstallContext<'_>,
    meta_base: &str,
    default_maven: &str,
    loader_version: &str,
) -> LauncherResult<LoaderProfile> {
    let url = format!(
        "{}/versions/loader/{}/{}/profile/json",
        meta_base.trim_end_matches('/'),
        ctx.game_version,
        loader_version
    );
    let meta: MetaProfile = fetch_json(ctx.http_client, &url).await?;

    if meta.main_class.trim().is_empty() {
        return Err(LauncherError::InvalidDocument {
            source_name: url,
            reason: "profile has no mainClass".into(),
        });
    }

    let arguments = meta.arguments.unwrap_or_default();
    Ok(LoaderProfile {
        loader_version: loader_version.to_string(),
        main_class: meta.main_class,
        libraries: meta
            .libraries
            .iter()
            .map(|lib| lib.to_library_entry(default_maven))
            .collect(),
        processors: None,
        data: None,
        jvm_args: arguments.jvm,
        game_args: arguments.game,
        installer: None,
    })
}

pub(crate) async fn fetch_meta_versions(
    ctx: &InstallContext<'_>,
    meta_base: &str,
) -> LauncherResult<Vec<MetaLoader>> {
    let url = format!(
        "{}/versions/loader/{}",
        meta_base.trim_end_matches('/'),
        ctx.game_version
    );
    let entries: Vec<MetaLoaderEntry> = fetch_json(ctx.http_client, &url).await?;
    Ok(entries.into_iter().map(|e| e.loader).collect())
}

/// Fabric via the Fabric Meta API.
#[derive(Debug, Clone, Copy, Default)]
pub struct FabricSource;

#[async_trait]
impl LoaderSource for FabricSource {
    async fn list_versions(&self, ctx: &InstallContext<'_>) -> LauncherResult<Vec<LoaderVersion>> {
        let loaders = fetch_meta_versions(ctx, &ctx.endpoints.fabric_meta).await?;
        Ok(loaders
            .into_iter()
            .map(|l| LoaderVersion::new(l.version, l.stable.unwrap_or(false)))
            .collect())
    }

    async fn fetch_profile(
        &self,
        ctx: &InstallContext<'_>,
        loader_version: &str,
    ) -> LauncherResult<LoaderProfile> {
        info!(
            "Resolving Fabric {} for Minecraft {}",
            loader_version, ctx.game_version
        );
        fetch_meta_profile(
            ctx,
            &ctx.endpoints.fabric_meta,
            &ctx.endpoints.fabric_maven,
            loader_version,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_meta_listing_and_profile() {
        let listing: Vec<MetaLoaderEntry> = serde_json::from_str(
            r#"[
                {"loader": {"separator": ".", "build": 7, "maven": "net.fabricmc:fabric-loader:0.15.7", "version": "0.15.7", "stable": true},
                 "intermediary": {"maven": "net.fabricmc:intermediary:1.20.1", "version": "1.20.1", "stable": true}}
            ]"#,
        )
        .unwrap();
        assert_eq!(listing[0].loader.version, "0.15.7");
        assert_eq!(listing[0].loader.stable, Some(true));

        let profile: MetaProfile = serde_json::from_str(
            r#"{
                "id": "fabric-loader-0.15.7-1.20.1",
                "inheritsFrom": "1.20.1",
                "mainClass": "net.fabricmc.loader.impl.launch.knot.KnotClient",
                "arguments": {"game": [], "jvm": ["-DFabricMcEmu= net.minecraft.client.main.Main "]},
                "libraries": [
                    {"name": "net.fabricmc:tiny-mappings-parser:0.3.0+build.17", "url": "https://maven.fabricmc.net/"},
                    {"name": "net.fabricmc:fabric-loader:0.15.7", "url": "https://maven.fabricmc.net/"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(profile.libraries.len(), 2);
        assert_eq!(profile.arguments.unwrap().jvm.len(), 1);
    }
}
