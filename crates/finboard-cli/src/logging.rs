use std::fs;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use finboard_core::LoggingConfig;
use tracing_subscriber::EnvFilter;

use crate::config_file::default_log_dir;

pub enum LogTarget {
    /// Headless commands: diagnostics go to stderr, output to stdout.
    Stderr,
    /// The TUI owns the terminal, so logs go to a file.
    File,
}

/// `RUST_LOG` wins over the configured level. Returns the log file path when
/// logging to a file.
pub fn init_logging(config: &LoggingConfig, target: LogTarget) -> Option<PathBuf> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match target {
        LogTarget::Stderr => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .try_init();
            None
        }
        LogTarget::File => {
            let path = config
                .dir
                .clone()
                .or_else(default_log_dir)
                .map(|dir| dir.join("finboard.log"));
            let file = path.as_ref().and_then(|path| {
                if let Some(parent) = path.parent() {
                    let _ = fs::create_dir_all(parent);
                }
                File::options().create(true).append(true).open(path).ok()
            });
            match file {
                Some(file) => {
                    let _ = tracing_subscriber::fmt()
                        .with_env_filter(filter)
                        .with_ansi(false)
                        .with_writer(Mutex::new(file))
                        .try_init();
                    path
                }
                None => {
                    let _ = tracing_subscriber::fmt()
                        .with_env_filter(filter)
                        .with_writer(io::sink)
                        .try_init();
                    None
                }
            }
        }
    }
}
