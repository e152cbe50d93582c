use crate::batch::BatchOptions;
use crate::cli::args::Command;
use crate::cli::params::FetchParams;
use crate::config::{hash_config_file, load_config};
use crate::error::PodfetchError;
use crate::manifest::Manifest;
use crate::transfer::DEFAULT_MAX_ATTEMPTS;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub enum ResolvedCommand {
    Fetch(FetchParams),
}

pub fn resolve_command(command: Command) -> Result<ResolvedCommand, PodfetchError> {
    match command {
        Command::Fetch {
            manifest_path,
            config_path,
            output_dir,
            archive_path,
            threads,
            max_attempts,
            overwrite,
            always_postprocess,
            write_metadata,
            quiet,
        } => {
            for (name, value) in [
                ("threads", threads.map(|v| v as u64)),
                ("max-attempts", max_attempts.map(u64::from)),
            ] {
                if value == Some(0) {
                    return Err(PodfetchError::CliArgumentValidation {
                        details: format!("{name} must be greater than 0."),
                    });
                }
            }

            let manifest = Manifest::load_from_file(Path::new(&manifest_path))?;

            let app_config = match &config_path {
                Some(config_path) => {
                    let app_config = load_config(config_path)?;
                    let config_hash = hash_config_file(Path::new(config_path))?;
                    if let Some(manifest_hash) = &manifest.config_hash
                        && *manifest_hash != config_hash
                    {
                        tracing::warn!(
                            "Configuration file has changed since the manifest was generated. \
                             Consider regenerating the manifest."
                        );
                    }
                    Some(app_config)
                }
                None => None,
            };

            let resolved_output_dir = output_dir
                .map(PathBuf::from)
                .or_else(|| {
                    app_config
                        .as_ref()
                        .and_then(|config| config.output.path.clone())
                })
                .ok_or_else(|| PodfetchError::CliArgumentValidation {
                    details:
                        "No output directory provided. Pass --output-dir or provide --config with output.path."
                            .to_string(),
                })?;

            let resolved_archive_path = archive_path.map(PathBuf::from).or_else(|| {
                app_config
                    .as_ref()
                    .and_then(|config| config.archive.as_ref())
                    .map(|archive| archive.path.clone())
            });

            let fetch_config = app_config
                .as_ref()
                .map(|config| config.fetch.clone())
                .unwrap_or_default();

            let options = BatchOptions {
                threads: threads.or(fetch_config.threads).unwrap_or(1),
                max_attempts: max_attempts
                    .or(fetch_config.max_attempts)
                    .unwrap_or(DEFAULT_MAX_ATTEMPTS),
                overwrite: overwrite || fetch_config.overwrite,
                always_postprocess: always_postprocess || fetch_config.always_postprocess,
                write_metadata: write_metadata || fetch_config.write_metadata,
                quiet: quiet || fetch_config.quiet,
            };

            let postprocess_command = app_config
                .as_ref()
                .and_then(|config| config.postprocess.as_ref())
                .map(|postprocess| postprocess.command.clone())
                .filter(|command| !command.is_empty());

            Ok(ResolvedCommand::Fetch(FetchParams {
                manifest,
                output_dir: resolved_output_dir,
                archive_path: resolved_archive_path,
                postprocess_command,
                options,
            }))
        }
    }
}
