use std::path::PathBuf;
use thiserror::Error;
use tracing::error;

/// Central error type for the installation engine.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Atomic move {from:?} -> {to:?} failed: {source}")]
    Commit {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    #[error("Download of {url} gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Download worker failed: {0}")]
    Worker(String),

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-1 mismatch for {path:?}: expected {expected}, got {actual}")]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── Validation ──────────────────────────────────────
    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    #[error("Unexpected document shape from {source_name}: {reason}")]
    InvalidDocument { source_name: String, reason: String },

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Resource ────────────────────────────────────────
    #[error("No {loader} versions found for Minecraft {game_version}")]
    LoaderVersionNotFound {
        loader: String,
        game_version: String,
    },

    #[error("Minecraft version {0} not found in manifest")]
    GameVersionNotFound(String),

    #[error("Entry {entry} not found in installer {installer:?}")]
    InstallerEntryNotFound { installer: PathBuf, entry: String },

    // ── Processors ──────────────────────────────────────
    #[error("Processor {jar} failed (code {code:?})\nSTDOUT:\n{stdout}\nSTDERR:\n{stderr}")]
    ProcessorFailed {
        jar: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("Java execution failed: {0}")]
    JavaExecution(String),

    // ── Configuration ───────────────────────────────────
    #[error("Required directory missing: {0:?}")]
    MissingDirectory(PathBuf),

    #[error("Invalid settings: {0}")]
    Settings(String),

    // ── Control ─────────────────────────────────────────
    #[error("Operation cancelled")]
    Cancelled,
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

/// Error taxonomy surfaced to collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Download,
    FileSystem,
    Validation,
    Resource,
    Configuration,
    Cancelled,
}

impl LauncherError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LauncherError::Io { .. } | LauncherError::Commit { .. } => ErrorKind::FileSystem,
            LauncherError::Http(_)
            | LauncherError::DownloadFailed { .. }
            | LauncherError::RetriesExhausted { .. }
            | LauncherError::Worker(_)
            | LauncherError::Sha1Mismatch { .. }
            | LauncherError::ProcessorFailed { .. }
            | LauncherError::JavaExecution(_) => ErrorKind::Download,
            LauncherError::InvalidMavenCoordinate(_)
            | LauncherError::InvalidDocument { .. }
            | LauncherError::Xml(_)
            | LauncherError::Json(_)
            | LauncherError::Zip(_) => ErrorKind::Validation,
            LauncherError::LoaderVersionNotFound { .. }
            | LauncherError::GameVersionNotFound(_)
            | LauncherError::InstallerEntryNotFound { .. } => ErrorKind::Resource,
            LauncherError::MissingDirectory(_) | LauncherError::Settings(_) => {
                ErrorKind::Configuration
            }
            LauncherError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Stable identifier suitable as a localization key.
    pub fn key(&self) -> &'static str {
        match self {
            LauncherError::Io { .. } => "file_system.io",
            LauncherError::Commit { .. } => "file_system.commit",
            LauncherError::Http(_) => "download.transport",
            LauncherError::DownloadFailed { .. } => "download.http_status",
            LauncherError::RetriesExhausted { .. } => "download.retries_exhausted",
            LauncherError::Worker(_) => "download.worker",
            LauncherError::Sha1Mismatch { .. } => "download.integrity",
            LauncherError::ProcessorFailed { .. } => "download.processor_failed",
            LauncherError::JavaExecution(_) => "download.java_execution",
            LauncherError::InvalidMavenCoordinate(_) => "validation.coordinate",
            LauncherError::InvalidDocument { .. } => "validation.document",
            LauncherError::Xml(_) => "validation.xml",
            LauncherError::Json(_) => "validation.json",
            LauncherError::Zip(_) => "validation.archive",
            LauncherError::LoaderVersionNotFound { .. } => "resource.loader_version",
            LauncherError::GameVersionNotFound(_) => "resource.game_version",
            LauncherError::InstallerEntryNotFound { .. } => "resource.installer_entry",
            LauncherError::MissingDirectory(_) => "configuration.missing_directory",
            LauncherError::Settings(_) => "configuration.settings",
            LauncherError::Cancelled => "cancelled",
        }
    }

    /// Transport-level failures that may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            LauncherError::Http(e) => {
                e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
            }
            LauncherError::DownloadFailed { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| LauncherError::Io { path, source }
    }
}

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

/// Turns the throwing form of an entry point into its silent form.
pub trait Silently<T> {
    /// Logs the error with its stable key and yields `None`.
    fn silently(self, operation: &str) -> Option<T>;
}

impl<T> Silently<T> for LauncherResult<T> {
    fn silently(self, operation: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                error!(key = e.key(), "{} failed: {}", operation, e);
                None
            }
        }
    }
}

// ── Serialization for IPC ───────────────────────────────
impl serde::Serialize for LauncherError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("LauncherError", 3)?;
        state.serialize_field("kind", &self.kind())?;
        state.serialize_field("key", self.key())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}
