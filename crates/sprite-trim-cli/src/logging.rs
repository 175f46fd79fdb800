//! Stderr logging for the command-line front-end.
//!
//! The core crate only emits through the `log` facade; this installs the
//! backend once per process.

use flexi_logger::{Logger, LoggerHandle};

/// Initialize stderr logging at `level`.
///
/// The returned handle must be kept alive for the duration of the program.
///
/// # Errors
/// - Returns an error when `level` is unsupported.
/// - Returns an error when the logger backend cannot start.
pub fn init_logging(level: &str) -> Result<LoggerHandle, String> {
    let level = normalize_level(level)?;
    Logger::try_with_str(level)
        .map_err(|err| format!("invalid log level `{level}`: {err}"))?
        .log_to_stderr()
        .format(flexi_logger::default_format)
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))
}

/// Level used when none is given on the command line.
pub fn default_log_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        "off" => Ok("off"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error|off"
        )),
    }
}
