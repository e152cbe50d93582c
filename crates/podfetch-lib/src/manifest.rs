use crate::error::PodfetchError;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManifestEpisode {
    /// Episode title, used for log markers only.
    pub title: String,
    /// Resolved audio URL; absent when the feed layer could not resolve one.
    pub audio_url: Option<String>,
    /// Destination path, relative to the output directory.
    pub destination: PathBuf,
    /// Cross-run dedup key.
    pub archive_key: Option<String>,
    /// Auxiliary files tied to this episode.
    #[serde(default)]
    pub extras: Vec<ManifestExtra>,
    /// Sidecar metadata, persisted when metadata writing is enabled.
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManifestExtra {
    pub url: Option<String>,
    pub destination: PathBuf,
    pub archive_key: Option<String>,
}

/// Fetch manifest produced by the external feed/naming layer: the ordered
/// list of episodes to download, with pre-resolved URLs, destination paths
/// and archive keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Version of the manifest format.
    pub version: u32,
    /// Hash of the configuration the manifest was generated from.
    pub config_hash: Option<String>,
    /// Episodes in feed order.
    pub episodes: Vec<ManifestEpisode>,
}

impl Manifest {
    pub const VERSION: u32 = 1;

    pub fn new(config_hash: Option<String>, episodes: Vec<ManifestEpisode>) -> Self {
        Self {
            version: Self::VERSION,
            config_hash,
            episodes,
        }
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), PodfetchError> {
        let json =
            serde_json::to_string_pretty(self).map_err(|e| PodfetchError::ManifestSave {
                path: path.to_path_buf(),
                reason: format!("JSON serialization failed: {}", e),
            })?;
        std::fs::write(path, json).map_err(|e| PodfetchError::ManifestSave {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self, PodfetchError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| PodfetchError::ManifestLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        let manifest: Manifest =
            serde_json::from_str(&content).map_err(|e| PodfetchError::ManifestLoad {
                path: path.to_path_buf(),
                reason: format!("JSON parsing failed: {}", e),
            })?;

        if manifest.version != Self::VERSION {
            return Err(PodfetchError::ManifestValidation {
                details: format!(
                    "Manifest version {} is not supported. Expected version {}",
                    manifest.version,
                    Self::VERSION
                ),
            });
        }

        manifest.validate()?;
        Ok(manifest)
    }

    /// Destination paths must stay inside the output directory and be
    /// pairwise distinct, so concurrent pipelines never touch the same file.
    fn validate(&self) -> Result<(), PodfetchError> {
        let mut destinations = self.episodes.iter().map(|episode| &episode.destination).chain(
            self.episodes
                .iter()
                .flat_map(|episode| episode.extras.iter().map(|extra| &extra.destination)),
        );

        for destination in destinations.clone() {
            validate_destination(destination)?;
        }

        if !destinations.all_unique() {
            return Err(PodfetchError::ManifestValidation {
                details: "Destination paths must be unique across episodes and extras"
                    .to_string(),
            });
        }

        Ok(())
    }
}

fn validate_destination(path: &Path) -> Result<(), PodfetchError> {
    if path.as_os_str().is_empty() || path.file_name().is_none() {
        return Err(PodfetchError::ManifestValidation {
            details: format!("Invalid destination path: {}", path.display()),
        });
    }

    if !path
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
    {
        return Err(PodfetchError::ManifestValidation {
            details: format!(
                "Destination path must be relative and must not escape the output directory: {}",
                path.display()
            ),
        });
    }

    Ok(())
}
