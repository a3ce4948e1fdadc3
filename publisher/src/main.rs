//! Publisher - Entry Point
//!
//! Publishes a generated application to a source repository and a hosting
//! provider, and answers status, cancel and quota queries.

use std::env;
use std::process::ExitCode;

use publisher::app::options::{parse_args, CliOptions, Command, USAGE};
use publisher::app::run::{error_output, run, step_summary};
use publisher::app::state::AppState;
use publisher::filesys::file::File;
use publisher::logs::{init_logging, LogOptions};
use publisher::storage::layout::StorageLayout;
use publisher::storage::settings::Settings;
use publisher::utils::version_info;

use serde_json::Value;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command line arguments
    let cli_args = parse_args(env::args().skip(1));
    let options = match CliOptions::from_args(&cli_args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}", e);
            if !cli_args.is_empty() {
                eprintln!("{}", USAGE);
            }
            return ExitCode::from(2);
        }
    };

    // Print version and exit
    if options.command == Command::Version {
        print_json(&serde_json::json!(version_info()));
        return ExitCode::SUCCESS;
    }

    // Retrieve the settings file
    let layout = StorageLayout::default();
    let settings_file = match &options.config {
        Some(path) => File::new(path.clone()),
        None => layout.settings_file(),
    };
    let settings = if settings_file.exists().await {
        match settings_file.read_json::<Settings>().await {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!(
                    "Unable to read settings file {}: {}",
                    settings_file.path().display(),
                    e
                );
                return ExitCode::FAILURE;
            }
        }
    } else if options.config.is_some() {
        eprintln!(
            "Settings file {} does not exist",
            settings_file.path().display()
        );
        return ExitCode::FAILURE;
    } else {
        Settings::default()
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        log_dir: settings.log_dir.clone(),
        json_format: settings.log_json,
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    let state = match AppState::init(settings, &layout) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to start publisher: {}", e);
            print_json(&error_output(&e));
            return ExitCode::FAILURE;
        }
    };

    info!("Running publisher {}", version_info().version);
    match run(options.command, &state).await {
        Ok(output) => {
            for line in step_summary(&output.steps) {
                eprintln!("{}", line);
            }
            print_json(&output.value);
            if output.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!("Command failed: {}", e);
            print_json(&error_output(&e));
            ExitCode::FAILURE
        }
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{}", value),
    }
}
