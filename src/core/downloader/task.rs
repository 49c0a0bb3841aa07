use std::path::PathBuf;

/// A single file to fetch, consumed exactly once by the [`Downloader`].
///
/// [`Downloader`]: super::Downloader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub display_name: String,
    pub url: String,
    pub dest: PathBuf,
    pub sha1: Option<String>,
    /// Skip without touching the network or the filesystem.
    pub skip: bool,
}

impl DownloadTask {
    pub fn new(url: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        let dest = dest.into();
        let display_name = dest
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            display_name,
            url: url.into(),
            dest,
            sha1: None,
            skip: false,
        }
    }

    pub fn with_sha1(mut self, sha1: Option<String>) -> Self {
        self.sha1 = sha1.filter(|s| !s.is_empty());
        self
    }

    pub fn named(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn skipped(mut self) -> Self {
        self.skip = true;
        self
    }
}

/// Drop duplicate destinations, keeping the first task for each path.
pub fn dedup_by_destination(tasks: &mut Vec<DownloadTask>) {
    let mut seen = std::collections::HashSet::new();
    tasks.retain(|task| seen.insert(task.dest.clone()));
}
