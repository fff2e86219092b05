use crate::cli::BookwindCli;
use clap::Parser;

/// Initialise the CLI and logging for the Bookwind runner.
///
/// Logs at `info` unless `RUST_LOG` says otherwise, so that check failures and cache timing
/// observations show up by default.
pub fn init() -> BookwindCli {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    BookwindCli::parse()
}
