//! Command-line driver for the installation engine.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use interface_installer::{
    init_tracing, CancellationToken, Endpoints, EngineSettings, Installer, LauncherPaths,
    LauncherResult, LoaderType, ProgressTracker,
};

#[derive(Debug, Parser)]
#[command(name = "interface-installer", version, about = "Resolve and install Minecraft loader versions")]
struct Args {
    /// Data directory; defaults to the platform data dir (or its bootstrap redirect).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List loader versions available for a game version.
    Versions {
        #[arg(long)]
        loader: LoaderType,
        #[arg(long)]
        game: String,
    },
    /// Download everything a game + loader combination needs and print the
    /// resulting launch parameters as JSON.
    Install {
        #[arg(long)]
        game: String,
        #[arg(long, default_value = "vanilla")]
        loader: LoaderType,
        /// Exact loader version; the preferred stable one when omitted.
        #[arg(long)]
        loader_version: Option<String>,
        /// Profile directory name under `profiles/`.
        #[arg(long)]
        profile: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(key = e.key(), "{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> LauncherResult<()> {
    let paths = match args.data_dir {
        Some(dir) => LauncherPaths::new(dir),
        None => LauncherPaths::discover(),
    };
    tokio::fs::create_dir_all(paths.data_dir()).await?;
    let settings = EngineSettings::load(paths.data_dir())?;

    let progress = Arc::new(ProgressTracker::with_callback(Arc::new(
        |message: &str, done: u64, total: u64| {
            info!("[{}/{}] {}", done, total, message);
        },
    )));
    let installer = Installer::new(paths, settings, Endpoints::default(), progress)?;

    match args.command {
        Command::Versions { loader, game } => {
            for version in installer.list_versions(loader, &game).await? {
                let marker = if version.stable { " (stable)" } else { "" };
                println!("{}{}", version.version, marker);
            }
        }
        Command::Install {
            game,
            loader,
            loader_version,
            profile,
        } => {
            let cancel = CancellationToken::new();
            let ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Cancellation requested");
                    ctrl_c.cancel();
                }
            });

            let setup = match loader_version.as_deref() {
                Some(v) => {
                    installer
                        .setup_with_specific_version(loader, &game, v, profile.as_deref(), &cancel)
                        .await?
                }
                None => {
                    installer
                        .setup(loader, &game, profile.as_deref(), &cancel)
                        .await?
                }
            };
            println!("{}", serde_json::to_string_pretty(&setup)?);
        }
    }

    Ok(())
}
