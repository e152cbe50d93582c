use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber;

#[derive(Debug, Clone)]
pub enum Command {
    Fetch {
        manifest_path: String,
        config_path: Option<String>,
        output_dir: Option<String>,
        archive_path: Option<String>,
        threads: Option<usize>,
        max_attempts: Option<u32>,
        overwrite: bool,
        always_postprocess: bool,
        write_metadata: bool,
        quiet: bool,
    },
}

pub struct Args {
    pub command: Command,
    pub log_level: Level,
}

#[derive(Debug, Parser)]
#[command(
    name = "podfetch",
    version,
    about = "Fetch a batch of podcast episodes to local storage, skipping episodes already retrieved"
)]
struct Cli {
    #[arg(
        short = 'v',
        long = "verbose",
        help = "Sets the level of verbosity",
        action = ArgAction::Count,
        global = true
    )]
    verbose: u8,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Read a fetch manifest and download every episode it lists
    Fetch {
        #[arg(
            short = 'm',
            long = "manifest",
            value_name = "FILE",
            help = "Sets the input manifest path",
            default_value = "podfetch.json"
        )]
        manifest: String,

        #[arg(
            short = 'c',
            long = "config",
            value_name = "FILE",
            help = "Optional config file for output-dir/archive fallbacks and manifest hash validation"
        )]
        config: Option<String>,

        #[arg(
            short = 'o',
            long = "output-dir",
            value_name = "DIR",
            help = "Overrides output directory for downloaded episodes"
        )]
        output_dir: Option<String>,

        #[arg(
            long = "archive",
            value_name = "FILE",
            help = "Overrides the download archive path used for cross-run dedup"
        )]
        archive: Option<String>,

        #[arg(
            short = 't',
            long = "threads",
            value_name = "N",
            help = "Maximum number of simultaneous episode downloads"
        )]
        threads: Option<usize>,

        #[arg(
            long = "max-attempts",
            value_name = "N",
            help = "Maximum transfer attempts per download"
        )]
        max_attempts: Option<u32>,

        #[arg(
            long = "overwrite",
            help = "Download even when the destination file already exists"
        )]
        overwrite: bool,

        #[arg(
            long = "always-postprocess",
            help = "Run the post-processing command even when an existing local file is skipped"
        )]
        always_postprocess: bool,

        #[arg(
            long = "write-metadata",
            help = "Write a metadata sidecar next to each episode"
        )]
        write_metadata: bool,

        #[arg(
            short = 'q',
            long = "quiet",
            help = "Suppresses transfer progress output"
        )]
        quiet: bool,
    },
}

pub fn parse_args() -> Args {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    let command = match cli.command {
        CliCommand::Fetch {
            manifest,
            config,
            output_dir,
            archive,
            threads,
            max_attempts,
            overwrite,
            always_postprocess,
            write_metadata,
            quiet,
        } => Command::Fetch {
            manifest_path: manifest,
            config_path: config,
            output_dir,
            archive_path: archive,
            threads,
            max_attempts,
            overwrite,
            always_postprocess,
            write_metadata,
            quiet,
        },
    };

    Args { command, log_level }
}
