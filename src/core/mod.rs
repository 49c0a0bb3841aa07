// ─── InterfaceOficial Installer Core ───
// Installation resolution and download engine for the launcher.
//
// Architecture:
//   core/
//     maven/     : Coordinate parser, repository layout, maven-metadata.xml
//     version/   : Mojang manifest + version JSON + OS rules
//     downloader/: Concurrent downloads with SHA-1 validation
//     assets/    : Asset index + chunked object downloads
//     loaders/   : Fabric, Quilt, Forge, NeoForge profiles + processors
//     launch/    : Classpath builder
//     progress   : Phase counters + cancellation
//     state/     : Settings, endpoints, filesystem layout

pub mod assets;
pub mod downloader;
pub mod error;
pub mod http;
pub mod launch;
pub mod loaders;
pub mod maven;
pub mod progress;
pub mod state;
pub mod version;
