mod paths;
mod settings;

pub use paths::LauncherPaths;
pub use settings::{Endpoints, EngineSettings};
