use crate::archive::DownloadArchive;
use crate::batch::{self, BatchItem, BatchResult, ExtraDownload, FetchContext};
use crate::cli::params::FetchParams;
use crate::error::PodfetchError;
use crate::manifest::Manifest;
use crate::postprocess::{CommandPostProcessor, PostProcessor};
use std::path::Path;
use std::sync::Arc;
use url::Url;

pub async fn run_fetch(params: FetchParams) -> Result<BatchResult, PodfetchError> {
    let FetchParams {
        manifest,
        output_dir,
        archive_path,
        postprocess_command,
        options,
    } = params;

    std::fs::create_dir_all(&output_dir)?;

    let archive = match &archive_path {
        Some(path) => Some(Arc::new(DownloadArchive::open(path)?)),
        None => None,
    };

    let client = reqwest::Client::builder()
        .user_agent(concat!("podfetch/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let hook: Option<Arc<dyn PostProcessor>> = postprocess_command
        .as_deref()
        .and_then(CommandPostProcessor::from_command_line)
        .map(|processor| Arc::new(processor) as Arc<dyn PostProcessor>);

    let items = build_items(&manifest, &output_dir);

    tracing::info!("Fetching {} episodes...", items.len());
    let ctx = Arc::new(FetchContext { client, archive });
    let result = batch::run_batch(ctx, items, hook, options).await;

    if result.had_errors {
        tracing::warn!(downloaded = result.downloaded, "Fetch finished with errors");
    } else {
        tracing::info!(
            downloaded = result.downloaded,
            "Fetch completed successfully"
        );
    }

    Ok(result)
}

fn build_items(manifest: &Manifest, output_dir: &Path) -> Vec<BatchItem> {
    let total = manifest.episodes.len();

    manifest
        .episodes
        .iter()
        .enumerate()
        .map(|(index, episode)| {
            let marker = format!("{}/{} {}", index + 1, total, episode.title);

            let source_url = episode
                .audio_url
                .as_deref()
                .and_then(|raw| parse_manifest_url(&marker, raw));

            let extras = episode
                .extras
                .iter()
                .map(|extra| ExtraDownload {
                    source_url: extra
                        .url
                        .as_deref()
                        .and_then(|raw| parse_manifest_url(&marker, raw)),
                    destination: output_dir.join(&extra.destination),
                    archive_key: extra.archive_key.clone(),
                })
                .collect();

            BatchItem {
                marker,
                source_url,
                destination: output_dir.join(&episode.destination),
                archive_key: episode.archive_key.clone(),
                extras,
                metadata: episode.metadata.clone(),
            }
        })
        .collect()
}

/// An unparseable URL is treated the same as a missing one: the item fails
/// through the batch's resolution-failure path instead of aborting the run.
fn parse_manifest_url(marker: &str, raw: &str) -> Option<Url> {
    match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::warn!(marker = %marker, url = raw, error = %e, "invalid URL in manifest");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{ManifestEpisode, ManifestExtra};
    use std::path::PathBuf;

    #[test]
    fn test_build_items_markers_and_paths() {
        let manifest = Manifest::new(
            None,
            vec![
                ManifestEpisode {
                    title: "First".to_string(),
                    audio_url: Some("https://example.com/1.mp3".to_string()),
                    destination: PathBuf::from("show/1.mp3"),
                    archive_key: Some("k1".to_string()),
                    extras: vec![ManifestExtra {
                        url: Some("https://example.com/1.jpg".to_string()),
                        destination: PathBuf::from("show/1.jpg"),
                        archive_key: None,
                    }],
                    metadata: None,
                },
                ManifestEpisode {
                    title: "Second".to_string(),
                    audio_url: None,
                    destination: PathBuf::from("show/2.mp3"),
                    archive_key: None,
                    extras: Vec::new(),
                    metadata: None,
                },
            ],
        );

        let items = build_items(&manifest, Path::new("/downloads"));

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].marker, "1/2 First");
        assert_eq!(items[0].destination, PathBuf::from("/downloads/show/1.mp3"));
        assert_eq!(
            items[0].extras[0].destination,
            PathBuf::from("/downloads/show/1.jpg")
        );
        assert_eq!(items[1].marker, "2/2 Second");
        assert!(items[1].source_url.is_none());
    }

    #[test]
    fn test_invalid_url_becomes_unresolved() {
        let manifest = Manifest::new(
            None,
            vec![ManifestEpisode {
                title: "Broken".to_string(),
                audio_url: Some("not a url".to_string()),
                destination: PathBuf::from("broken.mp3"),
                archive_key: None,
                extras: Vec::new(),
                metadata: None,
            }],
        );

        let items = build_items(&manifest, Path::new("/downloads"));
        assert!(items[0].source_url.is_none());
    }
}
