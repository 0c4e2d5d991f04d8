//! Entry point for the hygiene map command-line interface.
#![forbid(unsafe_code)]
#![expect(
    clippy::print_stderr,
    reason = "the binary reports fatal errors on stderr"
)]

use hygiene_cli::CliError;
use tracing_subscriber::EnvFilter;

fn main() {
    init_logging();
    match hygiene_cli::run() {
        Ok(()) => {}
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("hygiene-map: {err}");
            std::process::exit(1);
        }
    }
}

/// Route `log` records to stderr, filtered by `RUST_LOG` (default `info`).
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("hygiene-map: logging disabled: {err}");
    }
}
