// ─── Install Processors ───
// Runs the post-install programs Forge/NeoForge profiles declare, in
// manifest order, with `{KEY}` / `[KEY]` substitution.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use super::install_profile::extract_entry;
use super::profile::{DataField, DataValue, Processor};
use crate::core::downloader::sha1_file;
use crate::core::error::{LauncherError, LauncherResult, Silently};
use crate::core::launch::get_classpath_separator;
use crate::core::maven::{resolve_path, resolve_path_or_raw};
use crate::core::progress::{CancellationToken, ProgressTracker};
use crate::core::state::LauncherPaths;

/// One fully resolved processor invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorInvocation {
    /// Coordinate of the processor jar, for diagnostics.
    pub coordinate: String,
    pub jar: PathBuf,
    pub classpath: Vec<PathBuf>,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

/// Executes a processor. The production runner spawns Java.
#[async_trait]
pub trait ProcessorRunner: Send + Sync {
    async fn run(&self, invocation: &ProcessorInvocation) -> LauncherResult<()>;
}

/// Runs `java -cp <jar><sep><classpath...> <Main-Class> <args...>`.
#[derive(Debug, Clone)]
pub struct JavaProcessorRunner {
    java: PathBuf,
}

impl JavaProcessorRunner {
    pub fn new(java: impl Into<PathBuf>) -> Self {
        Self { java: java.into() }
    }
}

#[async_trait]
impl ProcessorRunner for JavaProcessorRunner {
    async fn run(&self, invocation: &ProcessorInvocation) -> LauncherResult<()> {
        let jar = invocation.jar.clone();
        let main_class = tokio::task::spawn_blocking(move || read_main_class_from_jar(&jar))
            .await
            .map_err(|e| LauncherError::JavaExecution(e.to_string()))??;

        let classpath = std::iter::once(&invocation.jar)
            .chain(invocation.classpath.iter())
            .map(|p| p.to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join(get_classpath_separator());

        info!(
            "Running processor {} with main class {}",
            invocation.coordinate, main_class
        );

        let output = tokio::process::Command::new(&self.java)
            .arg("-cp")
            .arg(&classpath)
            .arg(&main_class)
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .output()
            .await
            .map_err(|e| LauncherError::JavaExecution(e.to_string()))?;

        if !output.status.success() {
            return Err(LauncherError::ProcessorFailed {
                jar: invocation.coordinate.clone(),
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }
        Ok(())
    }
}

/// `Main-Class` attribute of a jar manifest, honouring continuation lines.
pub fn read_main_class_from_jar(path: &Path) -> LauncherResult<String> {
    let file = std::fs::File::open(path).map_err(LauncherError::io(path))?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut manifest = archive
        .by_name("META-INF/MANIFEST.MF")
        .map_err(|_| LauncherError::InstallerEntryNotFound {
            installer: path.to_path_buf(),
            entry: "META-INF/MANIFEST.MF".into(),
        })?;

    let mut text = String::new();
    manifest
        .read_to_string(&mut text)
        .map_err(LauncherError::io(path))?;

    let mut main_class: Option<String> = None;
    let mut current_key: Option<String> = None;
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix(' ') {
            if current_key.as_deref() == Some("Main-Class") {
                if let Some(value) = &mut main_class {
                    value.push_str(rest.trim_end());
                }
            }
            continue;
        }

        if let Some((key, value)) = line.split_once(':') {
            current_key = Some(key.trim().to_string());
            if key.trim() == "Main-Class" {
                main_class = Some(value.trim().to_string());
            }
        }
    }

    main_class.ok_or_else(|| LauncherError::InvalidDocument {
        source_name: path.display().to_string(),
        reason: "Main-Class missing from manifest".into(),
    })
}

/// Sequential processor pipeline for one installation.
pub struct ProcessorExecutor<'a> {
    runner: &'a dyn ProcessorRunner,
    paths: &'a LauncherPaths,
    progress: &'a ProgressTracker,
    installer: Option<PathBuf>,
}

impl<'a> ProcessorExecutor<'a> {
    pub fn new(
        runner: &'a dyn ProcessorRunner,
        paths: &'a LauncherPaths,
        progress: &'a ProgressTracker,
    ) -> Self {
        Self {
            runner,
            paths,
            progress,
            installer: None,
        }
    }

    /// Installer jar that `/path` data values and `{INSTALLER}` refer to.
    pub fn with_installer(mut self, installer: Option<PathBuf>) -> Self {
        self.installer = installer;
        self
    }

    /// Run every client-side processor in declared order.
    ///
    /// The first failure aborts the rest. After each processor (run or
    /// skipped because its outputs already verify) progress is reported on
    /// the core-files scale.
    pub async fn run(
        &self,
        processors: &[Processor],
        game_version: &str,
        data: Option<&BTreeMap<String, DataField>>,
        profile_name: Option<&str>,
        cancel: &CancellationToken,
    ) -> LauncherResult<()> {
        let client: Vec<&Processor> = processors.iter().filter(|p| p.runs_on_client()).collect();
        if client.is_empty() {
            debug!("No client processors to run");
            return Ok(());
        }

        let env = self.environment(game_version, data, profile_name).await?;
        let libs_dir = self.paths.libraries_dir();
        let total = client.len() as u64;

        info!("Running {} install processors", total);

        for (idx, processor) in client.iter().enumerate() {
            cancel.check()?;

            let outputs = resolve_outputs(processor, &env, &libs_dir);
            if !outputs.is_empty() && outputs_verify(&outputs).await? {
                debug!("Outputs of {} already present, skipping", processor.jar);
            } else {
                let invocation = ProcessorInvocation {
                    coordinate: processor.jar.clone(),
                    jar: libs_dir.join(resolve_path_or_raw(&processor.jar)),
                    classpath: processor
                        .classpath
                        .iter()
                        .map(|cp| libs_dir.join(resolve_path_or_raw(cp)))
                        .collect(),
                    args: processor
                        .args
                        .iter()
                        .map(|arg| substitute(arg, &env, &libs_dir))
                        .collect(),
                    working_dir: libs_dir.clone(),
                };
                self.runner.run(&invocation).await?;
                check_outputs(&outputs).await?;
            }

            self.progress.report_processor(
                &format!("Processor {}", processor.jar),
                idx as u64 + 1,
                total,
            );
        }

        Ok(())
    }

    pub async fn run_silent(
        &self,
        processors: &[Processor],
        game_version: &str,
        data: Option<&BTreeMap<String, DataField>>,
        profile_name: Option<&str>,
        cancel: &CancellationToken,
    ) -> bool {
        self.run(processors, game_version, data, profile_name, cancel)
            .await
            .silently("install processors")
            .is_some()
    }

    /// Base variables merged with the profile's client-side data values.
    async fn environment(
        &self,
        game_version: &str,
        data: Option<&BTreeMap<String, DataField>>,
        profile_name: Option<&str>,
    ) -> LauncherResult<HashMap<String, String>> {
        let libs_dir = self.paths.libraries_dir();
        let mut env = HashMap::new();
        env.insert("SIDE".to_string(), "client".to_string());
        env.insert("MINECRAFT_VERSION".to_string(), game_version.to_string());
        env.insert("LIBRARY_DIR".to_string(), display(&libs_dir));
        env.insert(
            "MINECRAFT_JAR".to_string(),
            display(&self.paths.client_jar(game_version)),
        );
        if let Some(name) = profile_name {
            env.insert("ROOT".to_string(), display(&self.paths.profile_dir(name)));
        }
        if let Some(installer) = &self.installer {
            env.insert("INSTALLER".to_string(), display(installer));
        }

        let work_dir = self.paths.version_dir(game_version).join("installer-data");
        for (key, field) in data.into_iter().flatten() {
            let value = match DataValue::classify(&field.client) {
                DataValue::Coordinate(artifact) | DataValue::ListLiteral(artifact) => {
                    display(&libs_dir.join(artifact.local_path()))
                }
                DataValue::Opaque(raw) => self.resolve_opaque(&raw, &work_dir).await?,
            };
            env.insert(key.clone(), value);
        }

        Ok(env)
    }

    async fn resolve_opaque(&self, raw: &str, work_dir: &Path) -> LauncherResult<String> {
        if let Some(literal) = raw.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')) {
            return Ok(literal.to_string());
        }
        match (&self.installer, raw.strip_prefix('/')) {
            (Some(installer), Some(entry)) => {
                let installer = installer.clone();
                let entry = entry.to_string();
                let dest = work_dir.join(&entry);
                let path =
                    tokio::task::spawn_blocking(move || extract_entry(&installer, &entry, &dest))
                        .await
                        .map_err(|e| LauncherError::Worker(e.to_string()))??;
                Ok(display(&path))
            }
            _ => Ok(raw.to_string()),
        }
    }
}

fn display(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Replace `{KEY}` and `[KEY]` tokens. A whole-argument `[coordinate]` not
/// present in the environment resolves to that library's path. Unknown
/// tokens are left untouched.
pub fn substitute(arg: &str, env: &HashMap<String, String>, libs_dir: &Path) -> String {
    if let Some(inner) = arg.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        if let Some(value) = env.get(inner) {
            return value.clone();
        }
        if let Some(path) = resolve_path(inner) {
            return display(&libs_dir.join(path));
        }
    }

    let mut out = String::with_capacity(arg.len());
    let mut rest = arg;
    while let Some(start) = rest.find(['{', '[']) {
        let close = if rest[start..].starts_with('{') { '}' } else { ']' };
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find(close) {
            Some(end) => {
                match env.get(&after[..end]) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[start..start + end + 2]),
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn resolve_outputs(
    processor: &Processor,
    env: &HashMap<String, String>,
    libs_dir: &Path,
) -> Vec<(PathBuf, String)> {
    processor
        .outputs
        .iter()
        .flatten()
        .map(|(path, sha1)| {
            let path = substitute(path, env, libs_dir);
            let sha1 = substitute(sha1, env, libs_dir);
            let sha1 = sha1.trim_matches('\'').to_string();
            (PathBuf::from(path), sha1)
        })
        .collect()
}

async fn outputs_verify(outputs: &[(PathBuf, String)]) -> LauncherResult<bool> {
    for (path, expected) in outputs {
        if !path.is_file() || !sha1_file(path).await?.eq_ignore_ascii_case(expected) {
            return Ok(false);
        }
    }
    Ok(true)
}

async fn check_outputs(outputs: &[(PathBuf, String)]) -> LauncherResult<()> {
    for (path, expected) in outputs {
        let actual = if path.is_file() {
            sha1_file(path).await?
        } else {
            String::new()
        };
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(LauncherError::Sha1Mismatch {
                path: path.clone(),
                expected: expected.clone(),
                actual,
            });
        }
    }
    Ok(())
}
