use std::path::Path;

use anyhow::Result;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use pulsar_config::{LogFormat, LoggingConfig};

// ---------------------------------------------------------------------------
// init_tracing
// ---------------------------------------------------------------------------

/// Install the global `tracing` subscriber from [`LoggingConfig`].
///
/// The stack is one filter plus up to two output layers: stderr, and a
/// non-blocking file writer when `logging.file` is set. Events carry their
/// `ps_*!` domain as an ordinary `domain` field, which the stock
/// formatters render inline and JSON consumers can query by key.
///
/// Returns the file writer's flush guard; hold it until process exit.
/// A `RUST_LOG` env-var, when present, replaces the config-driven
/// directives entirely.
pub fn init_tracing(config: &LoggingConfig, base_dir: &Path) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(config)?;
    let (file, guard) = file_output(config, base_dir)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_output(config.format))
        .with(file)
        .init();

    Ok(guard)
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if std::env::var("RUST_LOG").is_ok() {
        return Ok(EnvFilter::from_default_env());
    }
    let directives = config.directives();
    EnvFilter::try_new(&directives).map_err(|e| {
        anyhow::anyhow!("logging directives {directives:?} do not form a valid filter: {e}")
    })
}

// ---------------------------------------------------------------------------
// Output layers
// ---------------------------------------------------------------------------

/// Boxing lets plain and JSON variants share one composition path instead
/// of branching the whole subscriber assembly per format.
fn stderr_output<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    match format {
        LogFormat::Plain => fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed(),
    }
}

type FileOutput<S> = (Option<Box<dyn Layer<S> + Send + Sync>>, Option<WorkerGuard>);

fn file_output<S>(config: &LoggingConfig, base_dir: &Path) -> Result<FileOutput<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let Some(path) = config.log_file(base_dir) else {
        return Ok((None, None));
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .map_err(|e| anyhow::anyhow!("create log directory {}: {e}", dir.display()))?;
    let name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("log path {} names no file", path.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name.to_os_string()));

    let layer = match config.format {
        LogFormat::Plain => fmt::layer()
            .compact()
            .with_target(false)
            .with_ansi(false)
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(false)
            .with_ansi(false)
            .with_writer(writer)
            .boxed(),
    };

    Ok((Some(layer), Some(guard)))
}
