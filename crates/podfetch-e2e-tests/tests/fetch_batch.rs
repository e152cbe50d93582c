use podfetch_e2e_tests::{create_test_manifest, setup_test_environment, wait_for_file_creation};
use podfetch_lib::cli::{Command, FetchParams, ResolvedCommand, resolve_command, run_fetch};
use podfetch_lib::postprocess::sidecar_path;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn build_fetch_params(
    manifest_path: &Path,
    output_dir: &Path,
    archive_path: &Path,
    write_metadata: bool,
) -> FetchParams {
    let command = Command::Fetch {
        manifest_path: manifest_path.to_str().unwrap().to_string(),
        config_path: None,
        output_dir: Some(output_dir.to_str().unwrap().to_string()),
        archive_path: Some(archive_path.to_str().unwrap().to_string()),
        threads: Some(2),
        max_attempts: None,
        overwrite: false,
        always_postprocess: false,
        write_metadata,
        quiet: true,
    };
    let ResolvedCommand::Fetch(params) =
        resolve_command(command).expect("Failed to resolve fetch command");
    params
}

async fn mount_file(server: &MockServer, route: &str, body: &[u8], expected_hits: u64) {
    Mock::given(method("HEAD"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).insert_header(
            "content-length",
            body.len().to_string().as_str(),
        ))
        .expect(expected_hits)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .expect(expected_hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_end_to_end_with_warm_rerun() {
    init_tracing();

    let server = MockServer::start().await;
    // Each file must be requested exactly once across both runs.
    mount_file(&server, "/episodes/ep01.mp3", b"audio one", 1).await;
    mount_file(&server, "/episodes/ep02.mp3", b"audio two", 1).await;
    mount_file(&server, "/episodes/cover01.jpg", b"cover art", 1).await;

    let manifest = create_test_manifest(&server.uri());
    let temp_dir = setup_test_environment(&manifest).expect("Failed to setup test environment");

    let manifest_path = temp_dir.path().join("podfetch.json");
    let output_dir = temp_dir.path().join("downloads");
    let archive_path = temp_dir.path().join("archive.txt");

    let params = build_fetch_params(&manifest_path, &output_dir, &archive_path, true);
    let result = run_fetch(params).await.expect("Fetch should succeed");

    assert_eq!(result.downloaded, 2, "both episodes should download");
    assert!(!result.had_errors, "no errors expected: {result:?}");

    let ep01 = output_dir.join("show/ep01.mp3");
    let ep02 = output_dir.join("show/ep02.mp3");
    assert!(
        wait_for_file_creation(&ep01, 10).await,
        "Episode 1 should be published"
    );
    assert_eq!(std::fs::read(&ep01).unwrap(), b"audio one");
    assert_eq!(std::fs::read(&ep02).unwrap(), b"audio two");
    assert_eq!(
        std::fs::read(output_dir.join("show/ep01.jpg")).unwrap(),
        b"cover art"
    );

    let sidecar = sidecar_path(&ep01);
    assert!(sidecar.exists(), "metadata sidecar should be written");
    let metadata: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&sidecar).unwrap()).unwrap();
    assert_eq!(metadata["number"], 1);

    let archive_content = std::fs::read_to_string(&archive_path).unwrap();
    assert!(archive_content.lines().any(|line| line == "show-ep01"));
    assert!(archive_content.lines().any(|line| line == "show-ep02"));
    assert!(archive_content.lines().any(|line| line == "show-ep01-cover"));

    // Remove one published file: the warm archive must still prevent any
    // network traffic on the second run.
    std::fs::remove_file(&ep01).unwrap();

    let rerun_params = build_fetch_params(&manifest_path, &output_dir, &archive_path, false);
    let rerun_result = run_fetch(rerun_params).await.expect("Rerun should succeed");

    assert_eq!(rerun_result.downloaded, 0, "warm rerun downloads nothing");
    assert!(!rerun_result.had_errors);
    assert!(
        !ep01.exists(),
        "archive-based skip must not re-download the removed file"
    );
}

#[tokio::test]
async fn test_failing_episode_is_isolated_and_reported() {
    init_tracing();

    let server = MockServer::start().await;
    mount_file(&server, "/episodes/ep01.mp3", b"audio one", 1).await;
    mount_file(&server, "/episodes/cover01.jpg", b"cover art", 1).await;
    // Episode 2 probes fine but every stream attempt fails.
    Mock::given(method("HEAD"))
        .and(path("/episodes/ep02.mp3"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/episodes/ep02.mp3"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let manifest = create_test_manifest(&server.uri());
    let temp_dir = setup_test_environment(&manifest).expect("Failed to setup test environment");

    let manifest_path = temp_dir.path().join("podfetch.json");
    let output_dir = temp_dir.path().join("downloads");
    let archive_path = temp_dir.path().join("archive.txt");

    let params = build_fetch_params(&manifest_path, &output_dir, &archive_path, false);
    let result = run_fetch(params).await.expect("Batch itself never fails");

    assert_eq!(result.downloaded, 1, "healthy episode still downloads");
    assert!(result.had_errors, "failing episode must be reported");
    assert!(output_dir.join("show/ep01.mp3").exists());
    assert!(!output_dir.join("show/ep02.mp3").exists());

    let archive_content = std::fs::read_to_string(&archive_path).unwrap();
    assert!(
        archive_content.lines().any(|line| line == "show-ep01"),
        "sibling archive entry must still be recorded"
    );
    assert!(archive_content.lines().all(|line| line != "show-ep02"));
}

#[tokio::test]
async fn test_postprocess_command_runs_on_published_episodes() {
    init_tracing();

    let server = MockServer::start().await;
    mount_file(&server, "/episodes/ep01.mp3", b"audio one", 1).await;
    mount_file(&server, "/episodes/ep02.mp3", b"audio two", 1).await;
    mount_file(&server, "/episodes/cover01.jpg", b"cover art", 1).await;

    let manifest = create_test_manifest(&server.uri());
    let temp_dir = setup_test_environment(&manifest).expect("Failed to setup test environment");

    let mut params = build_fetch_params(
        &temp_dir.path().join("podfetch.json"),
        &temp_dir.path().join("downloads"),
        &temp_dir.path().join("archive.txt"),
        false,
    );
    // `test -f` fails unless the hook receives the published file path.
    params.postprocess_command = Some(vec!["test".to_string(), "-f".to_string()]);

    let result = run_fetch(params).await.expect("Fetch should succeed");
    assert_eq!(result.downloaded, 2);
    assert!(!result.had_errors, "hook must run against published files");
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("podfetch_lib=debug,podfetch_e2e_tests=debug")
        .with_test_writer()
        .try_init()
        .ok();
}
