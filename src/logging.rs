use std::io;
use std::path::Path;
use tracing_appender::rolling;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const STDOUT_FILTER: &str = "info,web_request=warn,llm_request=info,db_query=warn";
const FILE_FILTER: &str = "info,newsgate=debug,web_request=debug,llm_request=debug,db_query=debug";

/// Log to stdout (filtered by `RUST_LOG` when set) and to a daily file under `log_dir`.
pub fn configure_logging(log_dir: &Path) {
    let stdout_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(STDOUT_FILTER));
    let stdout_log = fmt::layer()
        .with_writer(io::stdout)
        .with_filter(stdout_filter);

    let file_appender = rolling::daily(log_dir, "newsgate.log");
    let file_log = fmt::layer()
        .with_ansi(false)
        .with_writer(file_appender)
        .with_filter(EnvFilter::new(FILE_FILTER));

    tracing_subscriber::Registry::default()
        .with(stdout_log)
        .with(file_log)
        .init();
}
