use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "genai_text=info";
const LOG_FILE_PREFIX: &str = "genai-text.log";

/// Install the global tracing subscriber.
///
/// Logs always go to stderr. When `log_dir` is given a daily rolling file is
/// written as well; keep the returned guard alive for the life of the process
/// or buffered lines are lost on exit.
pub fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);

            let result = tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(file_layer)
                .try_init();

            match result {
                Ok(()) => Some(guard),
                Err(e) => {
                    eprintln!(
                        "file logging to {} disabled, subscriber already installed: {}",
                        dir.display(),
                        e
                    );
                    None
                }
            }
        }
        None => {
            // A subscriber may already be installed (tests, embedding apps).
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .try_init();
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_file_layer_skipped_when_subscriber_already_installed() {
        let temp_dir = TempDir::new().unwrap();

        let guard = init_logging(Some(temp_dir.path()));
        assert!(guard.is_none());

        tracing::info!("still captured by the existing subscriber");
        assert!(logs_contain("still captured by the existing subscriber"));
    }
}
