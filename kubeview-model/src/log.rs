use std::{fs::File, path::Path, sync::OnceLock};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::error::Result;

pub const LOG_FILE: &str = "kubeview.log";
/// Overrides the default `info` level, e.g. `KUBEVIEW_LOG=kubeview_model=debug`.
pub const LOG_ENV: &str = "KUBEVIEW_LOG";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Sends traces to `<dir>/kubeview.log`. Only the first call installs the
/// subscriber; later calls are no-ops.
pub fn setup_logger(dir: impl AsRef<Path>) -> Result<()> {
    if LOG_GUARD.get().is_some() {
        return Ok(());
    }

    let file = File::create(dir.as_ref().join(LOG_FILE))?;
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file);
    if LOG_GUARD.set(guard).is_err() {
        return Ok(());
    }

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = fmt::layer()
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(non_blocking_writer)
        .with_filter(filter);

    tracing_subscriber::registry().with(file_layer).try_init().ok();

    Ok(())
}
