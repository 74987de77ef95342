mod args;
mod error;
mod logger;

pub use args::CliArgs;
pub use error::ClusterError;
pub use logger::{FATAL_TARGET, LogGuard, log_file_path, setup_logging};
