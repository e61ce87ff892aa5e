use anyhow::Result;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Initialize structured logging system
///
/// Console output goes to stderr as text or JSON; with `log_file` set, JSON
/// lines are also written to a daily rolling file next to it. Keep the
/// returned guard alive until exit or buffered file lines are lost.
pub fn init_logging(
    log_level: Option<&str>,
    log_file: Option<&Path>,
    format: &str,
) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            let level = log_level.unwrap_or("info");
            EnvFilter::try_new(level)
        })
        .map_err(|e| anyhow::anyhow!("Failed to create log filter: {}", e))?;

    let json = format == "json";
    let console_text = (!json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true)
    });
    let console_json = json.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .json()
    });

    let (file_layer, guard) = match log_file {
        Some(log_path) => {
            let dir = log_path.parent().unwrap_or(Path::new("."));
            let name = log_path
                .file_name()
                .map_or_else(|| "cleannest.log".into(), |n| n.to_string_lossy().into_owned());
            let (writer, guard) = non_blocking(rolling::daily(dir, name));
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .json();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    Registry::default()
        .with(env_filter)
        .with(console_text)
        .with(console_json)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;

    info!("Logging system initialized");
    Ok(guard)
}

/// Wall-clock timer for one pipeline stage
///
/// Logs the stage name, the rows it handled and the elapsed time. Dropping the
/// timer without calling [`StageTimer::finish`] still logs at debug level.
pub struct StageTimer {
    stage: &'static str,
    rows: Option<usize>,
    start: Instant,
}

impl StageTimer {
    #[must_use]
    pub fn start(stage: &'static str) -> Self {
        debug!(stage, "Stage started");
        Self {
            stage,
            rows: None,
            start: Instant::now(),
        }
    }

    /// Attach the number of rows the stage produced
    pub fn set_rows(&mut self, rows: usize) {
        self.rows = Some(rows);
    }

    /// Log at info level and return the elapsed time
    pub fn finish(mut self) -> Duration {
        let elapsed = self.start.elapsed();
        info!(
            stage = self.stage,
            rows = self.rows,
            elapsed_ms = elapsed.as_millis(),
            "Stage completed"
        );
        self.rows = None;
        self.stage = "";
        elapsed
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        if self.stage.is_empty() || std::thread::panicking() {
            return;
        }
        debug!(
            stage = self.stage,
            rows = self.rows,
            elapsed_ms = self.start.elapsed().as_millis(),
            "Stage finished"
        );
    }
}
