//! Binary entrypoint for the `carto` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    // A local .env may supply CARTO_* configuration during development.
    let _ = dotenvy::dotenv();
    env_logger::init();

    match carto::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
