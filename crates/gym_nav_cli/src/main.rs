use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;
mod ui;
mod utils;

const DEFAULT_LOG_FILTER: &str = "gym_nav=info,gym_nav_core=info";

fn main() -> ExitCode {
    init_tracing();

    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::error(format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so command output on stdout stays pipeable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
