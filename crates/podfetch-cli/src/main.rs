use podfetch_lib::cli::{ResolvedCommand, parse_args, resolve_command, run_fetch};
use podfetch_lib::error::PodfetchError;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), PodfetchError> {
    color_eyre::install()?;

    let args = parse_args();
    let command = resolve_command(args.command)?;

    match command {
        ResolvedCommand::Fetch(params) => {
            let result = run_fetch(params).await?;
            if result.had_errors {
                return Err(PodfetchError::BatchFinishedWithErrors {
                    downloaded: result.downloaded,
                });
            }
        }
    }

    Ok(())
}
