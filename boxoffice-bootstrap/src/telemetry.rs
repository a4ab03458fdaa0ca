use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use boxoffice_infrastructure::AppConfig;

const LOG_FILE_PREFIX: &str = "boxoffice.log";

/// Installs the global subscriber: stdout in the configured format, plus a
/// daily rolling file when `log_dir` is set. The returned guard must outlive
/// the server or buffered file output is lost.
pub fn init_tracing(config: &AppConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = config.log_format == "json";

    let (file_writer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let stdout_text = (!json).then(fmt::layer);
    let stdout_json = json.then(|| fmt::layer().json());
    let file_layer = file_writer.map(|writer| fmt::layer().with_ansi(false).with_writer(writer));

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_text)
        .with(stdout_json)
        .with(file_layer)
        .try_init()?;
    Ok(guard)
}
