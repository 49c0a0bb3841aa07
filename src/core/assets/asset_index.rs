use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::info;

use crate::core::downloader::{dedup_by_destination, DownloadTask, Downloader};
use crate::core::error::{LauncherError, LauncherResult, Silently};
use crate::core::progress::{CancellationToken, Phase};
use crate::core::state::LauncherPaths;
use crate::core::version::AssetIndexInfo;

/// Objects handed to one batch before moving on to the next.
pub const DEFAULT_ASSET_CHUNK: usize = 500;

/// Top-level asset index JSON structure.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetIndex {
    pub objects: HashMap<String, AssetObject>,
    #[serde(default, rename = "virtual")]
    pub is_virtual: bool,
    #[serde(default)]
    pub map_to_resources: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    pub size: u64,
}

impl AssetIndex {
    pub fn total_size(&self) -> u64 {
        self.objects.values().map(|o| o.size).sum()
    }
}

impl AssetObject {
    fn prefix(&self) -> &str {
        self.hash.get(..2).unwrap_or(&self.hash)
    }
}

/// Manages asset downloads (sounds, textures referenced by the asset index).
pub struct AssetManager {
    downloader: Downloader,
    paths: LauncherPaths,
    resources_url: String,
    chunk_size: usize,
}

impl AssetManager {
    pub fn new(downloader: Downloader, paths: LauncherPaths, resources_url: impl Into<String>) -> Self {
        Self {
            downloader,
            paths,
            resources_url: resources_url.into(),
            chunk_size: DEFAULT_ASSET_CHUNK,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// `objects/<hash[0:2]>/<hash>`
    pub fn object_path(&self, object: &AssetObject) -> PathBuf {
        self.paths
            .asset_objects_dir()
            .join(object.prefix())
            .join(&object.hash)
    }

    pub fn object_url(&self, object: &AssetObject) -> String {
        format!(
            "{}/{}/{}",
            self.resources_url.trim_end_matches('/'),
            object.prefix(),
            object.hash
        )
    }

    /// Download the asset index and every object it references.
    ///
    /// Objects are fetched in chunks of `chunk_size`, each chunk a full
    /// bounded-concurrency batch, with cancellation polled between chunks.
    /// The whole object count is registered with the tracker up front.
    pub async fn download_assets(
        &self,
        descriptor: &AssetIndexInfo,
        cancel: &CancellationToken,
    ) -> LauncherResult<AssetIndex> {
        // 1. Asset index itself
        let index_path = self
            .paths
            .asset_indexes_dir()
            .join(format!("{}.json", descriptor.id));
        let index_task = DownloadTask::new(&descriptor.url, &index_path)
            .with_sha1(descriptor.sha1.clone())
            .named(format!("asset index {}", descriptor.id));
        self.downloader.fetch_verified(&index_task).await?;

        let raw = tokio::fs::read_to_string(&index_path)
            .await
            .map_err(LauncherError::io(&index_path))?;
        let index: AssetIndex =
            serde_json::from_str(&raw).map_err(|e| LauncherError::InvalidDocument {
                source_name: index_path.display().to_string(),
                reason: e.to_string(),
            })?;

        // 2. One task per distinct object
        let mut objects: Vec<(&String, &AssetObject)> = index.objects.iter().collect();
        objects.sort_by(|a, b| a.0.cmp(b.0));
        let mut tasks: Vec<DownloadTask> = objects
            .into_iter()
            .map(|(name, object)| {
                DownloadTask::new(self.object_url(object), self.object_path(object))
                    .with_sha1(Some(object.hash.clone()))
                    .named(name.clone())
            })
            .collect();
        dedup_by_destination(&mut tasks);

        info!(
            "Downloading {} asset objects for index {} ({} bytes)",
            tasks.len(),
            descriptor.id,
            index.total_size()
        );

        // 3. Chunked batches
        self.downloader
            .progress()
            .add_total(Phase::Resources, tasks.len() as u64);
        for chunk in tasks.chunks(self.chunk_size) {
            cancel.check()?;
            self.downloader
                .run_batch(chunk.to_vec(), Phase::Resources, cancel)
                .await?;
        }

        Ok(index)
    }

    pub async fn download_assets_silent(
        &self,
        descriptor: &AssetIndexInfo,
        cancel: &CancellationToken,
    ) -> Option<AssetIndex> {
        self.download_assets(descriptor, cancel)
            .await
            .silently(&format!("asset download for index {}", descriptor.id))
    }
}
