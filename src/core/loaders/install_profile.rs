// ─── Installer Jar ───
// Reads the profile out of a Forge/NeoForge installer jar and extracts the
// files it carries (embedded maven artifacts, processor data).

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use super::profile::{DataField, LibraryEntry, LoaderProfile, Processor};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::rules::current_os_name;
use crate::core::version::{VersionJson, VersionLibrary};

/// Subset of `install_profile.json` (format version 1, Forge 1.13+).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallProfile {
    /// Absent on pre-1.13 installers (`install` + `versionInfo` layout).
    #[serde(default)]
    pub spec: Option<u32>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub minecraft: Option<String>,
    /// Location of the version JSON inside the jar.
    #[serde(default)]
    pub json: Option<String>,
    #[serde(default)]
    pub libraries: Vec<VersionLibrary>,
    #[serde(default)]
    pub processors: Vec<Processor>,
    #[serde(default)]
    pub data: BTreeMap<String, DataField>,
}

fn open_archive(installer: &Path) -> LauncherResult<zip::ZipArchive<File>> {
    let file = File::open(installer).map_err(LauncherError::io(installer))?;
    Ok(zip::ZipArchive::new(file)?)
}

fn read_json_entry<T: serde::de::DeserializeOwned>(
    archive: &mut zip::ZipArchive<File>,
    installer: &Path,
    entry: &str,
) -> LauncherResult<T> {
    let file = archive
        .by_name(entry)
        .map_err(|_| LauncherError::InstallerEntryNotFound {
            installer: installer.to_path_buf(),
            entry: entry.to_string(),
        })?;
    serde_json::from_reader(file).map_err(|e| LauncherError::InvalidDocument {
        source_name: format!("{}!{}", installer.display(), entry),
        reason: e.to_string(),
    })
}

/// Build a [`LoaderProfile`] from an installer jar.
///
/// Runtime libraries come from the embedded version JSON and go on the
/// classpath; install-time libraries only feed the processors. Entries
/// without a URL are either shipped under `maven/` in the jar or produced by
/// a processor, so neither is downloadable.
pub fn read_installer_profile(
    installer: &Path,
    loader_version: &str,
    default_repo: &str,
) -> LauncherResult<LoaderProfile> {
    let mut archive = open_archive(installer)?;

    let install: InstallProfile = read_json_entry(&mut archive, installer, "install_profile.json")?;
    if install.spec != Some(1) {
        return Err(LauncherError::InvalidDocument {
            source_name: format!("{}!install_profile.json", installer.display()),
            reason: match install.spec {
                Some(v) => format!("unsupported installer profile format {}", v),
                None => "legacy installer profile (pre-1.13) is not supported".to_string(),
            },
        });
    }
    let version_entry = install
        .json
        .as_deref()
        .map(|p| p.trim_start_matches('/'))
        .unwrap_or("version.json")
        .to_string();
    let version: VersionJson = read_json_entry(&mut archive, installer, &version_entry)?;

    let mut seen = HashSet::new();
    let mut libraries: Vec<LibraryEntry> = Vec::new();
    for lib in &version.libraries {
        let entry = lib.to_library_entry(default_repo);
        if seen.insert(entry.destination_path.clone()) {
            libraries.push(entry);
        }
    }
    for lib in &install.libraries {
        let mut entry = lib.to_library_entry(default_repo);
        entry.include_in_classpath = false;
        if seen.insert(entry.destination_path.clone()) {
            libraries.push(entry);
        }
    }

    let os = current_os_name();
    debug!(
        "Installer {:?}: {} libraries, {} processors",
        installer,
        libraries.len(),
        install.processors.len()
    );

    Ok(LoaderProfile {
        loader_version: loader_version.to_string(),
        main_class: version.main_class.clone(),
        libraries,
        processors: Some(install.processors),
        data: Some(install.data),
        jvm_args: version.simple_jvm_args(os),
        game_args: version.simple_game_args(os),
        installer: Some(installer.to_path_buf()),
    })
}

/// Copy one entry out of the installer jar to `dest`.
pub fn extract_entry(installer: &Path, entry: &str, dest: &Path) -> LauncherResult<PathBuf> {
    let mut archive = open_archive(installer)?;
    let entry_name = entry.trim_start_matches('/');
    let mut file = archive
        .by_name(entry_name)
        .map_err(|_| LauncherError::InstallerEntryNotFound {
            installer: installer.to_path_buf(),
            entry: entry_name.to_string(),
        })?;

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(LauncherError::io(parent))?;
    }
    let mut out = File::create(dest).map_err(LauncherError::io(dest))?;
    io::copy(&mut file, &mut out).map_err(LauncherError::io(dest))?;
    Ok(dest.to_path_buf())
}

/// Extract every non-downloadable library the installer ships under
/// `maven/`. Libraries already on disk are left alone. Returns the number of
/// files written.
pub fn extract_embedded_libraries(
    installer: &Path,
    libs_dir: &Path,
    libraries: &[LibraryEntry],
) -> LauncherResult<usize> {
    let mut archive = open_archive(installer)?;
    let mut extracted = 0;

    for lib in libraries.iter().filter(|lib| !lib.downloadable) {
        let dest = lib.absolute_path(libs_dir);
        if dest.exists() {
            continue;
        }
        let entry_name = format!(
            "maven/{}",
            lib.destination_path.to_string_lossy().replace('\\', "/")
        );
        let Ok(mut file) = archive.by_name(&entry_name) else {
            // Produced by a processor later on.
            continue;
        };

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(LauncherError::io(parent))?;
        }
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(LauncherError::io(installer))?;
        std::fs::write(&dest, bytes).map_err(LauncherError::io(&dest))?;
        extracted += 1;
    }

    if extracted > 0 {
        info!("Extracted {} embedded libraries from {:?}", extracted, installer);
    }
    Ok(extracted)
}
