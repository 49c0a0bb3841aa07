pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::core::error::{ErrorKind, LauncherError, LauncherResult, Silently};
pub use crate::core::loaders::{Installer, LoaderSetup, LoaderType, LoaderVersion};
pub use crate::core::progress::{CancellationToken, Phase, ProgressCallback, ProgressTracker};
pub use crate::core::state::{Endpoints, EngineSettings, LauncherPaths};

/// Install a `tracing` subscriber honouring `RUST_LOG`.
///
/// The engine itself never installs one; this is for binaries and embedders
/// that have no subscriber of their own.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,interface_installer=debug")),
        )
        .try_init();
}
