mod alerts;
mod analysis;
mod api;
mod classifier;
mod cli;
mod config;
mod database;
mod error;
mod feeds;
mod geocode;
mod schema;
mod sentiment;
mod server;
mod text;

use cli::Cli;
use config::{Config, CONFIG};
use directories::ProjectDirs;
use flexi_logger::{
    Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{debug, error};

use crate::error::HazardPulseError;

const LOG_FILE_SIZE: u64 = 10 * 1024 * 1024;
const LOG_FILES_KEPT: usize = 7;

fn setup_logging(
    project_dirs: &ProjectDirs,
    config: &Config,
) -> Result<LoggerHandle, HazardPulseError> {
    let log_dir = project_dirs.data_local_dir().join("logs");

    Logger::try_with_str(config.logging.log_spec())
        .and_then(|logger| {
            logger
                .log_to_file(FileSpec::default().directory(log_dir).basename("hazardpulse"))
                .rotate(
                    Criterion::Size(LOG_FILE_SIZE),
                    Naming::Timestamps,
                    Cleanup::KeepLogFiles(LOG_FILES_KEPT),
                )
                .duplicate_to_stderr(Duplicate::Warn)
                .format_for_files(flexi_logger::detailed_format)
                .write_mode(WriteMode::BufferAndFlush)
                .start()
        })
        .map_err(|e| HazardPulseError::Error(format!("Failed to start logger: {}", e)))
}

fn main() {
    let Some(project_dirs) = ProjectDirs::from("", "", "hazardpulse") else {
        eprintln!("Could not determine a data directory for hazardpulse");
        std::process::exit(1);
    };

    let config = Config::load_config(&project_dirs);

    // Keep the handle alive for the life of the process so buffered
    // log lines are flushed on exit
    let logger = match setup_logging(&project_dirs, &config) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("{} - continuing without file logging", e);
            None
        }
    };

    debug!("Command-line args: {:?}", std::env::args_os().collect::<Vec<_>>());

    if CONFIG.set(config).is_err() {
        eprintln!("Configuration was already initialized");
        std::process::exit(1);
    }

    if let Err(err) = Cli::handle_command_line() {
        error!("{:?}", err);
        eprintln!("{}", err);
        if let Some(handle) = &logger {
            handle.flush();
        }
        std::process::exit(1);
    }
}
