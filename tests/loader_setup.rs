//! End-to-end loader setup against a mock Mojang + loader backend.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use interface_installer::core::launch::get_classpath_separator;
use interface_installer::core::loaders::{ProcessorInvocation, ProcessorRunner};
use interface_installer::{
    CancellationToken, ErrorKind, LauncherError, LauncherResult, LoaderType, Phase,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{
    assert_exists, build_jar, maven_metadata, mount_game_version, serve, sha1_hex, Fixture,
    GAME_VERSION, VANILLA_MAIN,
};

const FABRIC_MAIN: &str = "net.fabricmc.loader.impl.launch.knot.KnotClient";
const FORGE_MAIN: &str = "cpw.mods.bootstraplauncher.BootstrapLauncher";

fn entries(classpath: &str) -> Vec<String> {
    classpath
        .split(get_classpath_separator())
        .map(str::to_string)
        .collect()
}

fn lib_path(libs: &Path, rel: &str) -> String {
    libs.join(rel).to_string_lossy().to_string()
}

// ─── Vanilla ───

#[tokio::test]
async fn vanilla_setup_downloads_the_game_and_its_assets() {
    let fx = Fixture::start().await;
    mount_game_version(&fx.server, Some(3)).await;
    let installer = fx.installer();

    let setup = installer
        .setup(LoaderType::Vanilla, GAME_VERSION, None, &CancellationToken::new())
        .await
        .unwrap();

    let libs = fx.libraries();
    let paths = fx.paths();
    assert_eq!(setup.loader_version, GAME_VERSION);
    assert_eq!(setup.main_class, VANILLA_MAIN);
    assert_eq!(
        entries(&setup.classpath),
        vec![
            lib_path(&libs, "com/mojang/brigadier/1.1.8/brigadier-1.1.8.jar"),
            lib_path(&libs, "org/ow2/asm/asm/9.3/asm-9.3.jar"),
            paths.client_jar(GAME_VERSION).to_string_lossy().to_string(),
        ]
    );
    assert_exists(&paths.client_jar(GAME_VERSION));
    assert_exists(&paths.version_json(GAME_VERSION));
    assert_eq!(installer.progress().snapshot(Phase::CoreFiles), (3, 3));
    assert_eq!(installer.progress().snapshot(Phase::Resources), (3, 3));
}

#[tokio::test]
async fn unknown_game_version_is_a_resource_error() {
    let fx = Fixture::start().await;
    mount_game_version(&fx.server, None).await;

    let err = fx
        .installer()
        .setup(LoaderType::Vanilla, "0.0.1", None, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, LauncherError::GameVersionNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::Resource);
}

// ─── Fabric ───

async fn mount_fabric(server: &MockServer) {
    let base = server.uri();
    let maven = format!("{}/fabric/maven/", base);

    let listing = json!([
        {"loader": {"separator": ".", "build": 1, "maven": "net.fabricmc:fabric-loader:0.16.0-beta.1", "version": "0.16.0-beta.1", "stable": false}},
        {"loader": {"separator": ".", "build": 2, "maven": "net.fabricmc:fabric-loader:0.15.7", "version": "0.15.7", "stable": true}},
        {"loader": {"separator": ".", "build": 3, "maven": "net.fabricmc:fabric-loader:0.15.6", "version": "0.15.6", "stable": true}}
    ]);
    serve(
        server,
        "/fabric/meta/versions/loader/1.20.1",
        serde_json::to_vec(&listing).unwrap(),
    )
    .await;

    let profile = json!({
        "id": "fabric-loader-0.15.7-1.20.1",
        "inheritsFrom": "1.20.1",
        "mainClass": FABRIC_MAIN,
        "arguments": {"game": [], "jvm": ["-DFabricMcEmu= net.minecraft.client.main.Main "]},
        "libraries": [
            {"name": "net.fabricmc:fabric-loader:0.15.7", "url": maven},
            {"name": "org.ow2.asm:asm:9.6", "url": maven},
            {"name": "net.fabricmc:intermediary:${gameVersion-placeholder}", "url": maven}
        ]
    });
    Mock::given(method("GET"))
        .and(path("/fabric/meta/versions/loader/1.20.1/0.15.7/profile/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile))
        .expect(1)
        .mount(server)
        .await;

    for rel in [
        "net/fabricmc/fabric-loader/0.15.7/fabric-loader-0.15.7.jar",
        "org/ow2/asm/asm/9.6/asm-9.6.jar",
        "net/fabricmc/intermediary/1.20.1/intermediary-1.20.1.jar",
    ] {
        serve(server, &format!("/fabric/maven/{}", rel), rel.as_bytes().to_vec()).await;
    }
}

#[tokio::test]
async fn fabric_setup_picks_the_first_stable_loader() {
    let fx = Fixture::start().await;
    mount_game_version(&fx.server, Some(2)).await;
    mount_fabric(&fx.server).await;
    let installer = fx.installer();

    let setup = installer
        .setup(LoaderType::Fabric, GAME_VERSION, Some("fabric-test"), &CancellationToken::new())
        .await
        .unwrap();

    let libs = fx.libraries();
    assert_eq!(setup.loader_version, "0.15.7");
    assert_eq!(setup.main_class, FABRIC_MAIN);
    assert_eq!(setup.extra_jvm_args.len(), 1);
    assert_eq!(
        entries(&setup.classpath),
        vec![
            lib_path(&libs, "net/fabricmc/fabric-loader/0.15.7/fabric-loader-0.15.7.jar"),
            lib_path(&libs, "org/ow2/asm/asm/9.6/asm-9.6.jar"),
            lib_path(&libs, "net/fabricmc/intermediary/1.20.1/intermediary-1.20.1.jar"),
            lib_path(&libs, "com/mojang/brigadier/1.1.8/brigadier-1.1.8.jar"),
            fx.paths().client_jar(GAME_VERSION).to_string_lossy().to_string(),
        ]
    );
    assert_exists(&libs.join("net/fabricmc/intermediary/1.20.1/intermediary-1.20.1.jar"));
    assert!(fx.paths().profile_dir("fabric-test").is_dir());

    // Served from the cache: the profile endpoint expects exactly one hit.
    let first = installer
        .resolve_version(LoaderType::Fabric, GAME_VERSION, Some("0.15.7"))
        .await
        .unwrap();
    let second = installer
        .resolve_version(LoaderType::Fabric, GAME_VERSION, None)
        .await
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(first
        .libraries
        .iter()
        .all(|lib| !lib.name.contains("${gameVersion-placeholder}")));
}

#[tokio::test]
async fn fabric_rerun_is_idempotent() {
    let fx = Fixture::start().await;
    mount_game_version(&fx.server, None).await;
    mount_fabric(&fx.server).await;
    let installer = fx.installer();
    let cancel = CancellationToken::new();

    let first = installer
        .setup_with_specific_version(LoaderType::Fabric, GAME_VERSION, "0.15.7", None, &cancel)
        .await
        .unwrap();
    let second = installer
        .setup_with_specific_version(LoaderType::Fabric, GAME_VERSION, "0.15.7", None, &cancel)
        .await
        .unwrap();
    assert_eq!(first, second);

    // Counters are reset per run, not accumulated.
    let (done, total) = installer.progress().snapshot(Phase::CoreFiles);
    assert_eq!(done, total);
    assert_eq!(total, 6);
}

#[tokio::test]
async fn missing_loader_profile_fails_the_whole_setup() {
    let fx = Fixture::start().await;
    mount_game_version(&fx.server, None).await;

    let installer = fx.installer();
    let err = installer
        .setup_with_specific_version(
            LoaderType::Fabric,
            GAME_VERSION,
            "9.9.9",
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LauncherError::DownloadFailed { status: 404, .. }));

    assert!(installer
        .setup_with_specific_version_silent(
            LoaderType::Fabric,
            GAME_VERSION,
            "9.9.9",
            None,
            &CancellationToken::new(),
        )
        .await
        .is_none());
}

#[tokio::test]
async fn empty_loader_listing_is_a_resource_error() {
    let fx = Fixture::start().await;
    mount_game_version(&fx.server, None).await;
    serve(&fx.server, "/fabric/meta/versions/loader/1.20.1", b"[]".to_vec()).await;

    let err = fx
        .installer()
        .setup(LoaderType::Fabric, GAME_VERSION, None, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, LauncherError::LoaderVersionNotFound { .. }));
    assert_eq!(err.key(), "resource.loader_version");
}

#[tokio::test]
async fn malformed_loader_profile_is_a_validation_error() {
    let fx = Fixture::start().await;
    mount_game_version(&fx.server, None).await;
    serve(
        &fx.server,
        "/fabric/meta/versions/loader/1.20.1/0.15.7/profile/json",
        b"{\"libraries\": \"nope\"}".to_vec(),
    )
    .await;

    let err = fx
        .installer()
        .setup_with_specific_version(
            LoaderType::Fabric,
            GAME_VERSION,
            "0.15.7",
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

// ─── Listings ───

#[tokio::test]
async fn quilt_listing_marks_prereleases_unstable() {
    let fx = Fixture::start().await;
    let listing = json!([
        {"loader": {"separator": ".", "build": 1, "maven": "org.quiltmc:quilt-loader:0.27.0-beta.1", "version": "0.27.0-beta.1"}},
        {"loader": {"separator": ".", "build": 2, "maven": "org.quiltmc:quilt-loader:0.26.4", "version": "0.26.4"}}
    ]);
    serve(
        &fx.server,
        "/quilt/meta/versions/loader/1.20.1",
        serde_json::to_vec(&listing).unwrap(),
    )
    .await;

    let versions = fx
        .installer()
        .list_versions(LoaderType::Quilt, GAME_VERSION)
        .await
        .unwrap();
    let flags: Vec<(&str, bool)> = versions
        .iter()
        .map(|v| (v.version.as_str(), v.stable))
        .collect();
    assert_eq!(flags, vec![("0.27.0-beta.1", false), ("0.26.4", true)]);
}

#[tokio::test]
async fn neoforge_listing_filters_by_game_version() {
    let fx = Fixture::start().await;
    serve(
        &fx.server,
        "/neoforge/maven/net/neoforged/neoforge/maven-metadata.xml",
        maven_metadata(
            "net.neoforged",
            "neoforge",
            &["21.0.167", "21.1.1-beta", "21.1.77", "20.4.237"],
        ),
    )
    .await;

    let versions = fx
        .installer()
        .list_versions(LoaderType::NeoForge, "1.21.1")
        .await
        .unwrap();
    let flags: Vec<(&str, bool)> = versions
        .iter()
        .map(|v| (v.version.as_str(), v.stable))
        .collect();
    assert_eq!(flags, vec![("21.1.77", true), ("21.1.1-beta", false)]);
}

// ─── Forge ───

/// Records every invocation instead of spawning Java.
#[derive(Default)]
struct RecordingRunner {
    calls: Mutex<Vec<(ProcessorInvocation, bool)>>,
}

#[async_trait]
impl ProcessorRunner for RecordingRunner {
    async fn run(&self, invocation: &ProcessorInvocation) -> LauncherResult<()> {
        let jar_present = invocation.jar.is_file();
        self.calls
            .lock()
            .unwrap()
            .push((invocation.clone(), jar_present));
        Ok(())
    }
}

const FORGE_VERSION: &str = "47.2.0";
const MAPPINGS: &str = "de.oceanlabs.mcp:mcp_config:1.20.1-20230612.114412:mappings@txt";

/// Serve a Forge library under the Forge maven, returning its JSON entry.
async fn forge_library(server: &MockServer, name: &str, rel: &str) -> serde_json::Value {
    let body = format!("forge:{}", name).into_bytes();
    let url = serve(server, &format!("/forge/maven/{}", rel), body.clone()).await;
    json!({
        "name": name,
        "downloads": {"artifact": {"path": rel, "url": url, "sha1": sha1_hex(&body), "size": body.len()}}
    })
}

async fn mount_forge(server: &MockServer) {
    serve(
        server,
        "/forge/maven/net/minecraftforge/forge/maven-metadata.xml",
        maven_metadata(
            "net.minecraftforge",
            "forge",
            &["1.20.1-47.2.0", "1.20.1-47.2.20", "1.20.2-48.0.1"],
        ),
    )
    .await;
    serve(
        server,
        "/forge/promotions_slim.json",
        serde_json::to_vec(&json!({"promos": {
            "1.20.1-latest": "47.2.20",
            "1.20.1-recommended": FORGE_VERSION
        }}))
        .unwrap(),
    )
    .await;

    let version = json!({
        "id": "1.20.1-forge-47.2.0",
        "inheritsFrom": "1.20.1",
        "mainClass": FORGE_MAIN,
        "arguments": {"game": ["--launchTarget", "forgeclient"], "jvm": ["-Dforge.test=1"]},
        "libraries": [
            forge_library(
                server,
                "net.minecraftforge:fmlloader:1.20.1-47.2.0",
                "net/minecraftforge/fmlloader/1.20.1-47.2.0/fmlloader-1.20.1-47.2.0.jar",
            ).await,
            {
                "name": "net.minecraftforge:forge:1.20.1-47.2.0:universal",
                "downloads": {"artifact": {
                    "path": "net/minecraftforge/forge/1.20.1-47.2.0/forge-1.20.1-47.2.0-universal.jar",
                    "url": "",
                    "sha1": ""
                }}
            },
            forge_library(server, "org.ow2.asm:asm:9.5", "org/ow2/asm/asm/9.5/asm-9.5.jar").await
        ]
    });

    let install_profile = json!({
        "spec": 1,
        "profile": "forge",
        "version": "1.20.1-forge-47.2.0",
        "minecraft": GAME_VERSION,
        "json": "/version.json",
        "data": {
            "MAPPINGS": {"client": format!("[{}]", MAPPINGS), "server": format!("[{}]", MAPPINGS)},
            "BINPATCH": {"client": "/data/client.lzma", "server": "/data/server.lzma"},
            "MOJMAPS_SHA": {"client": "'abc123'", "server": "'def456'"}
        },
        "processors": [
            {
                "jar": "net.minecraftforge:installertools:1.3.0",
                "classpath": ["net.minecraftforge:srgutils:0.5.6"],
                "args": ["--task", "MCP_DATA", "--input", "{MINECRAFT_JAR}", "--output", "{MAPPINGS}", "--sha", "{MOJMAPS_SHA}"]
            },
            {
                "sides": ["server"],
                "jar": "net.minecraftforge:installertools:1.3.0",
                "classpath": [],
                "args": ["--task", "SERVER_ONLY"]
            },
            {
                "sides": ["client"],
                "jar": "net.minecraftforge:binarypatcher:1.1.1",
                "classpath": [],
                "args": ["--patch", "{BINPATCH}", "--output", "[net.minecraftforge:forge:1.20.1-47.2.0:client]", "--root", "{ROOT}"]
            }
        ],
        "libraries": [
            forge_library(
                server,
                "net.minecraftforge:installertools:1.3.0",
                "net/minecraftforge/installertools/1.3.0/installertools-1.3.0.jar",
            ).await,
            forge_library(
                server,
                "net.minecraftforge:srgutils:0.5.6",
                "net/minecraftforge/srgutils/0.5.6/srgutils-0.5.6.jar",
            ).await,
            forge_library(
                server,
                "net.minecraftforge:binarypatcher:1.1.1",
                "net/minecraftforge/binarypatcher/1.1.1/binarypatcher-1.1.1.jar",
            ).await
        ]
    });

    let install_raw = serde_json::to_vec(&install_profile).unwrap();
    let version_raw = serde_json::to_vec(&version).unwrap();
    let jar = build_jar(&[
        ("install_profile.json", &install_raw),
        ("version.json", &version_raw),
        (
            "maven/net/minecraftforge/forge/1.20.1-47.2.0/forge-1.20.1-47.2.0-universal.jar",
            b"universal",
        ),
        ("data/client.lzma", b"client patches"),
        ("data/server.lzma", b"server patches"),
    ]);
    serve(
        server,
        "/forge/maven/net/minecraftforge/forge/1.20.1-47.2.0/forge-1.20.1-47.2.0-installer.jar",
        jar,
    )
    .await;
}

#[tokio::test]
async fn forge_setup_runs_client_processors_in_order() {
    let fx = Fixture::start().await;
    mount_game_version(&fx.server, None).await;
    mount_forge(&fx.server).await;
    let runner = Arc::new(RecordingRunner::default());
    let installer = fx.installer().with_processor_runner(runner.clone());

    let setup = installer
        .setup(LoaderType::Forge, GAME_VERSION, Some("forge-test"), &CancellationToken::new())
        .await
        .unwrap();

    let libs = fx.libraries();
    let paths = fx.paths();

    // Recommended promotion wins over the newer build.
    assert_eq!(setup.loader_version, FORGE_VERSION);
    assert_eq!(setup.main_class, FORGE_MAIN);
    assert_eq!(setup.extra_game_args, vec!["--launchTarget", "forgeclient"]);
    assert_eq!(setup.extra_jvm_args, vec!["-Dforge.test=1"]);

    // Embedded artifact extracted before processors.
    let universal = libs.join("net/minecraftforge/forge/1.20.1-47.2.0/forge-1.20.1-47.2.0-universal.jar");
    assert_eq!(std::fs::read(&universal).unwrap(), b"universal");

    let calls = runner.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 2, "server-only processor must be skipped");
    assert!(calls.iter().all(|(_, jar_present)| *jar_present));

    let (mcp, _) = &calls[0];
    assert_eq!(
        mcp.jar,
        libs.join("net/minecraftforge/installertools/1.3.0/installertools-1.3.0.jar")
    );
    assert_eq!(
        mcp.classpath,
        vec![libs.join("net/minecraftforge/srgutils/0.5.6/srgutils-0.5.6.jar")]
    );
    assert_eq!(
        mcp.args,
        vec![
            "--task".to_string(),
            "MCP_DATA".to_string(),
            "--input".to_string(),
            paths.client_jar(GAME_VERSION).to_string_lossy().to_string(),
            "--output".to_string(),
            lib_path(
                &libs,
                "de/oceanlabs/mcp/mcp_config/1.20.1-20230612.114412/mcp_config-1.20.1-20230612.114412-mappings.txt"
            ),
            "--sha".to_string(),
            "abc123".to_string(),
        ]
    );

    let (patcher, _) = &calls[1];
    let binpatch = PathBuf::from(&patcher.args[1]);
    assert_eq!(
        binpatch,
        paths.version_dir(GAME_VERSION).join("installer-data/data/client.lzma")
    );
    assert_eq!(std::fs::read(&binpatch).unwrap(), b"client patches");
    assert_eq!(
        patcher.args[3],
        lib_path(&libs, "net/minecraftforge/forge/1.20.1-47.2.0/forge-1.20.1-47.2.0-client.jar")
    );
    assert_eq!(
        patcher.args[5],
        paths.profile_dir("forge-test").to_string_lossy()
    );

    // Loader libraries first, game jar left to the patched artifacts.
    let cp = entries(&setup.classpath);
    assert_eq!(
        cp,
        vec![
            lib_path(&libs, "net/minecraftforge/fmlloader/1.20.1-47.2.0/fmlloader-1.20.1-47.2.0.jar"),
            universal.to_string_lossy().to_string(),
            lib_path(&libs, "org/ow2/asm/asm/9.5/asm-9.5.jar"),
            lib_path(&libs, "com/mojang/brigadier/1.1.8/brigadier-1.1.8.jar"),
        ]
    );
}

#[tokio::test]
async fn forge_progress_is_one_continuous_scale() {
    let fx = Fixture::start().await;
    mount_game_version(&fx.server, None).await;
    mount_forge(&fx.server).await;
    let installer = fx
        .installer()
        .with_processor_runner(Arc::new(RecordingRunner::default()));

    installer
        .setup_with_specific_version(
            LoaderType::Forge,
            GAME_VERSION,
            FORGE_VERSION,
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let (downloaded, download_total) = installer.progress().snapshot(Phase::CoreFiles);
    assert_eq!(downloaded, download_total);
    let final_count = download_total + 2;

    let events = fx.progress.events();
    assert_eq!(events.last(), Some(&(final_count, final_count)));
    assert_eq!(
        events
            .iter()
            .filter(|e| **e == (final_count, final_count))
            .count(),
        1
    );
    assert!(events.windows(2).all(|w| w[0].0 < w[1].0));
}

#[tokio::test]
async fn cancelled_setup_never_reaches_processors() {
    let fx = Fixture::start().await;
    mount_game_version(&fx.server, None).await;
    mount_forge(&fx.server).await;
    let runner = Arc::new(RecordingRunner::default());
    let installer = fx.installer().with_processor_runner(runner.clone());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = installer
        .setup_with_specific_version(LoaderType::Forge, GAME_VERSION, FORGE_VERSION, None, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, LauncherError::Cancelled));
    assert!(runner.calls.lock().unwrap().is_empty());
}
