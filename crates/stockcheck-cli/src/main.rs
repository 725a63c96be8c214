//! `stockcheck` binary

use std::process::ExitCode;
use stockcheck_cli::{command, decode, logging, run_with, CliConfig};
use stockcheck_core::ReviewError;

#[tokio::main]
async fn main() -> ExitCode {
    let matches = command().get_matches();

    let result = async {
        let invocation = decode(&matches)?;
        let config = CliConfig::load(invocation.config.as_deref())?;
        logging::init(&config.logging);
        run_with(&config, invocation).await
    }
    .await;

    match result {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            match e.downcast_ref::<ReviewError>() {
                Some(ReviewError::Blocked { .. }) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}
