//! Interactive membership console.
//!
//! Logs go to stderr and are filtered by `RUST_LOG` (default `warn`).

use std::io;
use std::process::ExitCode;
use subvault::{Console, Exit, Session, SubvaultConfig};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    init_logging();

    let mut session = match SubvaultConfig::default_location().and_then(Session::open) {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "startup failed");
            eprintln!("subvault: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut console = Console::new(&mut session, stdin.lock(), stdout.lock());

    match console.run() {
        Ok(Exit::Saved) => ExitCode::SUCCESS,
        Ok(Exit::SaveFailed(_)) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "console I/O failed");
            eprintln!("subvault: {}", e);
            ExitCode::FAILURE
        }
    }
}
