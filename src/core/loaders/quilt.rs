use async_trait::async_trait;
use tracing::info;

use super::context::{InstallContext, LoaderVersion};
use super::fabric::{fetch_meta_profile, fetch_meta_versions};
use super::installer::LoaderSource;
use super::profile::LoaderProfile;
use crate::core::error::LauncherResult;

/// Quilt via the Quilt Meta API (nearly identical to Fabric's API).
#[derive(Debug, Clone, Copy, Default)]
pub struct QuiltSource;

/// Quilt publishes no stability flag; pre-releases carry a suffix
/// (`0.26.0-beta.1`).
fn is_stable(version: &str) -> bool {
    !version.contains('-')
}

#[async_trait]
impl LoaderSource for QuiltSource {
    async fn list_versions(&self, ctx: &InstallContext<'_>) -> LauncherResult<Vec<LoaderVersion>> {
        let loaders = fetch_meta_versions(ctx, &ctx.endpoints.quilt_meta).await?;
        Ok(loaders
            .into_iter()
            .map(|l| {
                let stable = l.stable.unwrap_or_else(|| is_stable(&l.version));
                LoaderVersion::new(l.version, stable)
            })
            .collect())
    }

    async fn fetch_profile(
        &self,
        ctx: &InstallContext<'_>,
        loader_version: &str,
    ) -> LauncherResult<LoaderProfile> {
        info!(
            "Resolving Quilt loader {} for MC {}",
            loader_version, ctx.game_version
        );
        fetch_meta_profile(
            ctx,
            &ctx.endpoints.quilt_meta,
            &ctx.endpoints.quilt_maven,
            loader_version,
        )
        .await
    }
}
