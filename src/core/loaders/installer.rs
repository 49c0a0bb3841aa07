use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use super::cache::{ProfileCache, ProfileKey};
use super::context::{select_version, InstallContext, LoaderVersion};
use super::fabric::FabricSource;
use super::forge::ForgeSource;
use super::install_profile::extract_embedded_libraries;
use super::kind::LoaderType;
use super::neoforge::NeoForgeSource;
use super::processors::{JavaProcessorRunner, ProcessorExecutor, ProcessorRunner};
use super::profile::LoaderProfile;
use super::quilt::QuiltSource;
use crate::core::assets::AssetManager;
use crate::core::downloader::{dedup_by_destination, Downloader};
use crate::core::error::{LauncherError, LauncherResult, Silently};
use crate::core::http::build_http_client;
use crate::core::launch::{build_classpath, get_classpath_separator, merge_libraries};
use crate::core::progress::{CancellationToken, Phase, ProgressTracker};
use crate::core::state::{Endpoints, EngineSettings, LauncherPaths};
use crate::core::version::rules::current_os_name;
use crate::core::version::{GameVersionProvider, MojangVersionProvider, VersionJson};

/// One loader ecosystem: where its versions are listed and how a profile
/// for one of them is obtained.
#[async_trait]
pub trait LoaderSource: Send + Sync {
    /// Published loader versions for `ctx.game_version`, newest first.
    async fn list_versions(&self, ctx: &InstallContext<'_>) -> LauncherResult<Vec<LoaderVersion>>;

    /// Fetch and normalize the profile of one loader version.
    async fn fetch_profile(
        &self,
        ctx: &InstallContext<'_>,
        loader_version: &str,
    ) -> LauncherResult<LoaderProfile>;
}

/// Dispatch over the closed set of loader sources, without boxing.
#[derive(Debug, Clone, Copy)]
pub enum LoaderResolver {
    Fabric(FabricSource),
    Quilt(QuiltSource),
    Forge(ForgeSource),
    NeoForge(NeoForgeSource),
}

impl LoaderResolver {
    /// `None` for vanilla, which has no loader profile to resolve.
    pub fn for_kind(loader: LoaderType) -> Option<Self> {
        match loader {
            LoaderType::Vanilla => None,
            LoaderType::Fabric => Some(Self::Fabric(FabricSource)),
            LoaderType::Quilt => Some(Self::Quilt(QuiltSource)),
            LoaderType::Forge => Some(Self::Forge(ForgeSource)),
            LoaderType::NeoForge => Some(Self::NeoForge(NeoForgeSource)),
        }
    }

    pub fn kind(&self) -> LoaderType {
        match self {
            Self::Fabric(_) => LoaderType::Fabric,
            Self::Quilt(_) => LoaderType::Quilt,
            Self::Forge(_) => LoaderType::Forge,
            Self::NeoForge(_) => LoaderType::NeoForge,
        }
    }

    pub async fn list_versions(
        &self,
        ctx: &InstallContext<'_>,
    ) -> LauncherResult<Vec<LoaderVersion>> {
        match self {
            Self::Fabric(s) => s.list_versions(ctx).await,
            Self::Quilt(s) => s.list_versions(ctx).await,
            Self::Forge(s) => s.list_versions(ctx).await,
            Self::NeoForge(s) => s.list_versions(ctx).await,
        }
    }

    async fn fetch_profile(
        &self,
        ctx: &InstallContext<'_>,
        loader_version: &str,
    ) -> LauncherResult<LoaderProfile> {
        match self {
            Self::Fabric(s) => s.fetch_profile(ctx, loader_version).await,
            Self::Quilt(s) => s.fetch_profile(ctx, loader_version).await,
            Self::Forge(s) => s.fetch_profile(ctx, loader_version).await,
            Self::NeoForge(s) => s.fetch_profile(ctx, loader_version).await,
        }
    }

    /// Resolve `explicit`, or the preferred listed version, to a profile.
    ///
    /// Profiles are substituted once, then cached under
    /// `{game}-{loader version}`; cache hits are returned as stored.
    pub async fn resolve_version(
        &self,
        ctx: &InstallContext<'_>,
        cache: &ProfileCache,
        explicit: Option<&str>,
    ) -> LauncherResult<Arc<LoaderProfile>> {
        let loader_version = match explicit {
            Some(v) => v.to_string(),
            None => {
                let versions = self.list_versions(ctx).await?;
                select_version(&versions, &self.kind().to_string(), ctx.game_version)?
                    .version
                    .clone()
            }
        };

        let key = ProfileKey::new(self.kind(), ctx.game_version, &loader_version);
        if let Some(cached) = cache.get(&key) {
            debug!("Profile cache hit for {} {}", self.kind(), key);
            return Ok(cached);
        }

        let mut profile = self.fetch_profile(ctx, &loader_version).await?;
        profile.substitute_game_version(ctx.game_version);
        Ok(cache.insert(key, profile))
    }
}

/// Result of a successful loader setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoaderSetup {
    pub loader: LoaderType,
    pub game_version: String,
    pub loader_version: String,
    pub classpath: String,
    pub main_class: String,
    pub extra_jvm_args: Vec<String>,
    pub extra_game_args: Vec<String>,
}

/// Installation facade: resolves a loader profile, downloads everything it
/// and the base game need, runs install processors and builds the
/// classpath.
pub struct Installer {
    paths: LauncherPaths,
    endpoints: Endpoints,
    settings: EngineSettings,
    http_client: reqwest::Client,
    downloader: Downloader,
    cache: Arc<ProfileCache>,
    versions: Arc<dyn GameVersionProvider>,
    runner: Arc<dyn ProcessorRunner>,
}

impl Installer {
    pub fn new(
        paths: LauncherPaths,
        settings: EngineSettings,
        endpoints: Endpoints,
        progress: Arc<ProgressTracker>,
    ) -> LauncherResult<Self> {
        settings.validate()?;
        let http_client = build_http_client(settings.request_timeout())?;
        let downloader = Downloader::new(http_client.clone(), progress)
            .with_concurrency(settings.max_concurrent_downloads)
            .with_retry(settings.retry_policy());
        let versions = Arc::new(MojangVersionProvider::new(
            http_client.clone(),
            endpoints.version_manifest.clone(),
            paths.clone(),
        ));
        let runner = Arc::new(JavaProcessorRunner::new(settings.java_binary()));

        Ok(Self {
            paths,
            endpoints,
            settings,
            http_client,
            downloader,
            cache: Arc::new(ProfileCache::new()),
            versions,
            runner,
        })
    }

    pub fn with_version_provider(mut self, versions: Arc<dyn GameVersionProvider>) -> Self {
        self.versions = versions;
        self
    }

    pub fn with_processor_runner(mut self, runner: Arc<dyn ProcessorRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Share a profile cache between installers.
    pub fn with_cache(mut self, cache: Arc<ProfileCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn paths(&self) -> &LauncherPaths {
        &self.paths
    }

    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }

    pub fn cache(&self) -> &Arc<ProfileCache> {
        &self.cache
    }

    pub fn progress(&self) -> &Arc<ProgressTracker> {
        self.downloader.progress()
    }

    fn context<'a>(&'a self, game_version: &'a str) -> InstallContext<'a> {
        InstallContext {
            game_version,
            paths: &self.paths,
            endpoints: &self.endpoints,
            downloader: &self.downloader,
            http_client: &self.http_client,
        }
    }

    /// Loader versions available for `game_version`. Vanilla lists the game
    /// version itself.
    pub async fn list_versions(
        &self,
        loader: LoaderType,
        game_version: &str,
    ) -> LauncherResult<Vec<LoaderVersion>> {
        match LoaderResolver::for_kind(loader) {
            Some(resolver) => resolver.list_versions(&self.context(game_version)).await,
            None => Ok(vec![LoaderVersion::new(game_version, true)]),
        }
    }

    pub async fn resolve_version(
        &self,
        loader: LoaderType,
        game_version: &str,
        explicit: Option<&str>,
    ) -> LauncherResult<Arc<LoaderProfile>> {
        match LoaderResolver::for_kind(loader) {
            Some(resolver) => {
                resolver
                    .resolve_version(&self.context(game_version), &self.cache, explicit)
                    .await
            }
            None => {
                let version = self.versions.version_json(game_version).await?;
                Ok(Arc::new(vanilla_profile(&version)))
            }
        }
    }

    /// Install the preferred loader version for `game_version`.
    pub async fn setup(
        &self,
        loader: LoaderType,
        game_version: &str,
        profile_name: Option<&str>,
        cancel: &CancellationToken,
    ) -> LauncherResult<LoaderSetup> {
        self.install(loader, game_version, None, profile_name, cancel)
            .await
    }

    pub async fn setup_silent(
        &self,
        loader: LoaderType,
        game_version: &str,
        profile_name: Option<&str>,
        cancel: &CancellationToken,
    ) -> Option<LoaderSetup> {
        self.setup(loader, game_version, profile_name, cancel)
            .await
            .silently(&format!("{} setup for {}", loader, game_version))
    }

    pub async fn setup_with_specific_version(
        &self,
        loader: LoaderType,
        game_version: &str,
        loader_version: &str,
        profile_name: Option<&str>,
        cancel: &CancellationToken,
    ) -> LauncherResult<LoaderSetup> {
        self.install(loader, game_version, Some(loader_version), profile_name, cancel)
            .await
    }

    pub async fn setup_with_specific_version_silent(
        &self,
        loader: LoaderType,
        game_version: &str,
        loader_version: &str,
        profile_name: Option<&str>,
        cancel: &CancellationToken,
    ) -> Option<LoaderSetup> {
        self.setup_with_specific_version(loader, game_version, loader_version, profile_name, cancel)
            .await
            .silently(&format!(
                "{} {} setup for {}",
                loader, loader_version, game_version
            ))
    }

    async fn install(
        &self,
        loader: LoaderType,
        game_version: &str,
        explicit: Option<&str>,
        profile_name: Option<&str>,
        cancel: &CancellationToken,
    ) -> LauncherResult<LoaderSetup> {
        let progress = Arc::clone(self.downloader.progress());
        progress.reset();

        LauncherPaths::require_dir(self.paths.data_dir())?;
        self.paths.ensure_layout().await?;
        if let Some(name) = profile_name {
            let dir = self.paths.profile_dir(name);
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(LauncherError::io(&dir))?;
        }
        cancel.check()?;

        // 1. Base game + loader profile
        let version = self.versions.version_json(game_version).await?;
        let profile = match LoaderResolver::for_kind(loader) {
            Some(resolver) => {
                resolver
                    .resolve_version(&self.context(game_version), &self.cache, explicit)
                    .await?
            }
            None => Arc::new(vanilla_profile(&version)),
        };
        info!(
            "Installing {} {} for Minecraft {}",
            loader, profile.loader_version, game_version
        );

        // 2. Core files and resources
        let os = current_os_name();
        let libs_dir = self.paths.libraries_dir();
        let mut tasks = version.core_tasks(&self.paths, &self.endpoints.mojang_libraries, os);
        tasks.extend(profile.download_tasks(&libs_dir, os));
        dedup_by_destination(&mut tasks);

        let assets = AssetManager::new(
            self.downloader.clone(),
            self.paths.clone(),
            self.endpoints.resources.clone(),
        )
        .with_chunk_size(self.settings.asset_chunk_size);
        let resources = async {
            match &version.asset_index {
                Some(descriptor) => assets.download_assets(descriptor, cancel).await.map(|_| ()),
                None => {
                    debug!("Version {} declares no asset index", version.id);
                    Ok(())
                }
            }
        };
        tokio::try_join!(
            self.downloader
                .download_batch(tasks, Phase::CoreFiles, cancel),
            resources
        )?;

        // 3. Installer-embedded artifacts and processors
        if let Some(installer) = profile.installer.clone() {
            let libraries = profile.libraries.clone();
            let libs = libs_dir.clone();
            tokio::task::spawn_blocking(move || {
                extract_embedded_libraries(&installer, &libs, &libraries)
            })
            .await
            .map_err(|e| LauncherError::Worker(e.to_string()))??;
        }

        if let Some(processors) = profile.processors.as_deref().filter(|p| !p.is_empty()) {
            cancel.check()?;
            ProcessorExecutor::new(self.runner.as_ref(), &self.paths, &progress)
                .with_installer(profile.installer.clone())
                .run(
                    processors,
                    game_version,
                    profile.data.as_ref(),
                    profile_name,
                    cancel,
                )
                .await?;
        }

        // 4. Classpath
        let classpath = self.classpath_for(loader, &version, &profile);
        info!(
            "{} {} ready ({} classpath entries)",
            loader,
            profile.loader_version,
            classpath.split(get_classpath_separator()).count()
        );

        Ok(LoaderSetup {
            loader,
            game_version: game_version.to_string(),
            loader_version: profile.loader_version.clone(),
            classpath,
            main_class: profile.main_class.clone(),
            extra_jvm_args: profile.jvm_args.clone(),
            extra_game_args: profile.game_args.clone(),
        })
    }

    fn classpath_for(&self, loader: LoaderType, version: &VersionJson, profile: &LoaderProfile) -> String {
        let game_libraries = version.library_entries(&self.endpoints.mojang_libraries);
        let merged = LoaderProfile {
            libraries: merge_libraries(&profile.libraries, &game_libraries),
            ..profile.clone()
        };
        let mut classpath = build_classpath(&merged, &self.paths.libraries_dir());

        if !loader.patches_game_jar() {
            let client_jar = self.paths.client_jar(&version.id);
            if !classpath.is_empty() {
                classpath.push_str(get_classpath_separator());
            }
            classpath.push_str(&client_jar.to_string_lossy());
        }
        classpath
    }
}

/// The base game as a profile without extra libraries.
fn vanilla_profile(version: &VersionJson) -> LoaderProfile {
    LoaderProfile::new(&version.id, &version.main_class)
}
