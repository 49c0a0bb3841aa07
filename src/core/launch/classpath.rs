// ─── Classpath Builder ───
// Constructs the classpath string handed to the game runtime.

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use crate::core::loaders::profile::{LibraryEntry, LoaderProfile};
use crate::core::maven::{resolve_path, MavenArtifact};
use crate::core::version::rules::current_os_name;

/// Builds the classpath for `profile` under `libs_dir`.
///
/// Only libraries marked for the classpath and allowed on this OS are
/// included. A library whose name is not a coordinate falls back to its
/// declared destination; one with neither is skipped. Uses `;` on Windows,
/// `:` on Linux/macOS.
pub fn build_classpath(profile: &LoaderProfile, libs_dir: &Path) -> String {
    build_classpath_for(profile, libs_dir, current_os_name())
}

pub fn build_classpath_for(profile: &LoaderProfile, libs_dir: &Path, os: &str) -> String {
    let mut entries: Vec<String> = profile
        .libraries
        .iter()
        .filter(|lib| lib.include_in_classpath && lib.is_allowed_for(os))
        .filter_map(|lib| resolve_library_entry(lib, libs_dir))
        .collect();
    dedup_preserving_order(&mut entries);
    debug!("Classpath has {} entries", entries.len());
    entries.join(get_classpath_separator())
}

/// Platform-specific Java classpath separator.
pub fn get_classpath_separator() -> &'static str {
    if cfg!(target_os = "windows") {
        ";"
    } else {
        ":"
    }
}

/// Loader libraries first, then game libraries that the loader does not
/// already put on the classpath under the same group, artifact and classifier.
pub fn merge_libraries(loader: &[LibraryEntry], game: &[LibraryEntry]) -> Vec<LibraryEntry> {
    merge_libraries_for(loader, game, current_os_name())
}

/// Install-time and OS-excluded loader entries never shadow a game library.
pub fn merge_libraries_for(
    loader: &[LibraryEntry],
    game: &[LibraryEntry],
    os: &str,
) -> Vec<LibraryEntry> {
    let key = |lib: &LibraryEntry| {
        MavenArtifact::parse(&lib.name)
            .map(|a| a.versionless_key())
            .unwrap_or_else(|_| lib.name.clone())
    };

    let overridden: HashSet<String> = loader
        .iter()
        .filter(|lib| lib.include_in_classpath && lib.is_allowed_for(os))
        .map(key)
        .collect();
    loader
        .iter()
        .cloned()
        .chain(game.iter().filter(|lib| !overridden.contains(&key(lib))).cloned())
        .collect()
}

fn resolve_library_entry(lib: &LibraryEntry, libs_dir: &Path) -> Option<String> {
    let relative = match resolve_path(&lib.name) {
        Some(path) if lib.destination_path.as_os_str().is_empty() => path,
        _ if !lib.destination_path.as_os_str().is_empty() => lib.destination_path.clone(),
        _ => {
            debug!("No artifact for classpath entry {}", lib.name);
            return None;
        }
    };
    Some(libs_dir.join(relative).to_string_lossy().to_string())
}

fn dedup_preserving_order(entries: &mut Vec<String>) {
    let mut seen = HashSet::new();
    entries.retain(|entry| {
        let key = if cfg!(target_os = "windows") {
            entry.to_lowercase()
        } else {
            entry.clone()
        };
        seen.insert(key)
    });
}
