use eyre::Result;
use podfetch_lib::manifest::{Manifest, ManifestEpisode, ManifestExtra};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn create_test_manifest(server_uri: &str) -> Manifest {
    Manifest::new(
        None,
        vec![
            ManifestEpisode {
                title: "Interview with a Rustacean".to_string(),
                audio_url: Some(format!("{server_uri}/episodes/ep01.mp3")),
                destination: PathBuf::from("show/ep01.mp3"),
                archive_key: Some("show-ep01".to_string()),
                extras: vec![ManifestExtra {
                    url: Some(format!("{server_uri}/episodes/cover01.jpg")),
                    destination: PathBuf::from("show/ep01.jpg"),
                    archive_key: Some("show-ep01-cover".to_string()),
                }],
                metadata: Some(serde_json::json!({
                    "title": "Interview with a Rustacean",
                    "number": 1
                })),
            },
            ManifestEpisode {
                title: "Async in Practice".to_string(),
                audio_url: Some(format!("{server_uri}/episodes/ep02.mp3")),
                destination: PathBuf::from("show/ep02.mp3"),
                archive_key: Some("show-ep02".to_string()),
                extras: Vec::new(),
                metadata: Some(serde_json::json!({
                    "title": "Async in Practice",
                    "number": 2
                })),
            },
        ],
    )
}

pub fn setup_test_environment(manifest: &Manifest) -> Result<TempDir> {
    let temp_dir = tempfile::tempdir()?;

    let manifest_path = temp_dir.path().join("podfetch.json");
    manifest.save_to_file(&manifest_path)?;

    Ok(temp_dir)
}

pub async fn wait_for_file_creation(path: &Path, timeout_secs: u64) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed().as_secs() < timeout_secs {
        if path.exists() {
            return true;
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    }
    false
}
