mod app;

use std::process::ExitCode;

use tracing::error;

fn main() -> ExitCode {
    app::init_tracing();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    match app::run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(app::ClientError::Usage(message)) => {
            eprintln!("{message}");
            ExitCode::from(2)
        }
        Err(err) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}
