pub mod manifest;
pub mod rules;
pub mod version_file;

pub use manifest::{GameVersionProvider, MojangVersionProvider, VersionEntry, VersionManifest};
pub use rules::{is_allowed, PlatformRule, RuleAction};
pub use version_file::{AssetIndexInfo, VersionJson, VersionLibrary};
