use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Clone, Debug, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub output: OutputConfig,
    pub archive: Option<ArchiveConfig>,
    pub fetch: FetchConfig,
    pub postprocess: Option<PostprocessConfig>,
}

#[derive(Clone, Debug, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct OutputConfig {
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveConfig {
    pub path: PathBuf,
}

#[derive(Clone, Debug, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct FetchConfig {
    pub threads: Option<usize>,
    pub max_attempts: Option<u32>,
    pub overwrite: bool,
    pub always_postprocess: bool,
    pub write_metadata: bool,
    pub quiet: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PostprocessConfig {
    /// External command run after each published episode, invoked with the
    /// file path appended as the last argument.
    pub command: Vec<String>,
}
