use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum PostProcessError {
    #[error("Failed to spawn post-processing command `{command}`: {reason}")]
    Spawn { command: String, reason: String },

    #[error("Post-processing command `{command}` exited with {status}")]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
    },

    #[error("Failed to write metadata sidecar {path}: {reason}")]
    Sidecar { path: PathBuf, reason: String },
}

/// Capability invoked with the final path of a published file. Pipelines
/// depend on this abstraction rather than on free-form closures.
#[async_trait]
pub trait PostProcessor: Send + Sync {
    async fn run(&self, published_file: &Path) -> Result<(), PostProcessError>;
}

/// Runs a user-configured external command with the published file path
/// appended as the last argument.
pub struct CommandPostProcessor {
    program: String,
    args: Vec<String>,
}

impl CommandPostProcessor {
    /// Build from a `[program, arg...]` command line. Returns `None` for an
    /// empty command line.
    pub fn from_command_line(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn describe(&self) -> String {
        let mut description = self.program.clone();
        for arg in &self.args {
            description.push(' ');
            description.push_str(arg);
        }
        description
    }
}

#[async_trait]
impl PostProcessor for CommandPostProcessor {
    async fn run(&self, published_file: &Path) -> Result<(), PostProcessError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(published_file)
            .status()
            .await
            .map_err(|e| PostProcessError::Spawn {
                command: self.describe(),
                reason: e.to_string(),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(PostProcessError::CommandFailed {
                command: self.describe(),
                status,
            })
        }
    }
}

/// Sidecar path for a destination file: the full file name with `.info.json`
/// appended, so `ep01.mp3` gets `ep01.mp3.info.json` next to it.
pub fn sidecar_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".info.json");
    destination.with_file_name(name)
}

/// Write the episode metadata sidecar next to the destination file,
/// regardless of whether the destination itself was freshly downloaded.
pub async fn write_metadata_sidecar(
    destination: &Path,
    metadata: &serde_json::Value,
) -> Result<PathBuf, PostProcessError> {
    let path = sidecar_path(destination);

    let json = serde_json::to_string_pretty(metadata).map_err(|e| PostProcessError::Sidecar {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| PostProcessError::Sidecar {
                path: path.clone(),
                reason: e.to_string(),
            })?;
    }

    tokio::fs::write(&path, json)
        .await
        .map_err(|e| PostProcessError::Sidecar {
            path: path.clone(),
            reason: e.to_string(),
        })?;

    Ok(path)
}
