//! EEG Command Pipeline - Main Entry Point

use app::{describe_failure, init_logging, run, AppSettings};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

fn main() -> ExitCode {
    init_logging();

    info!("=== EEG Command Pipeline v{} ===", env!("CARGO_PKG_VERSION"));

    let settings_path = std::env::args().nth(1).map(PathBuf::from);
    let result = AppSettings::load(settings_path.as_deref()).and_then(run);

    match result {
        Ok(predictions) => {
            for prediction in &predictions {
                match serde_json::to_string(prediction) {
                    Ok(line) => println!("{}", line),
                    Err(e) => error!("Failed to encode prediction: {}", e),
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            match describe_failure(&e) {
                Some(message) => eprintln!("{}", message),
                None => eprintln!("Error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}
