use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Error, Result};

/// `<program name>.log` in the working directory.
pub fn default_log_path() -> PathBuf {
    let program = std::env::current_exe()
        .ok()
        .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());
    PathBuf::from(format!("{program}.log"))
}

/// Log to `log_file` (truncated) and mirror everything to stderr.
///
/// The level defaults to `info` and can be changed through `RUST_LOG`. Fails
/// without touching `log_file` when a global subscriber is already installed.
pub fn init_logging(log_file: &Path) -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Err(Error::Configuration("a logger is already installed".into()));
    }
    let file = File::create(log_file)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .map_err(|e| Error::Configuration(format!("cannot install logger: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_path_is_named_after_program() {
        let p = default_log_path();
        assert_eq!(p.extension().and_then(|e| e.to_str()), Some("log"));
        assert_eq!(p.parent(), Some(Path::new("")));
    }

    #[test]
    fn messages_reach_the_log_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("run.log");
        init_logging(&path).unwrap();
        tracing::error!("Making API request for 2018");
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Making API request for 2018"));
        assert!(init_logging(&path).is_err());
        let again = std::fs::read_to_string(&path).unwrap();
        assert!(again.contains("Making API request for 2018"));
    }
}
