use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use anyhow::{Result, anyhow, bail};
use chrono::Local;
use tracing::{Event, Level, Subscriber, error};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::{FmtContext, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_FILTER: &str = "info";

// Local timestamp, padded level, source location, then fields.
struct LocalFmt;

impl<S, N> FormatEvent<S, N> for LocalFmt
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let ansi = writer.has_ansi_escapes();
        let timestamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");

        if ansi {
            write!(writer, "\x1b[2m{timestamp}\x1b[0m ")?;
        } else {
            write!(writer, "{timestamp} ")?;
        }

        let color = match *meta.level() {
            Level::ERROR => "\x1b[1;31m",
            Level::WARN => "\x1b[1;33m",
            Level::INFO => "\x1b[1;32m",
            Level::DEBUG => "\x1b[1;34m",
            Level::TRACE => "\x1b[1;35m",
        };
        if ansi {
            write!(writer, "{color}{:>5}\x1b[0m ", meta.level())?;
        } else {
            write!(writer, "{:>5} ", meta.level())?;
        }

        match (meta.file(), meta.line()) {
            (Some(file), Some(line)) => write!(writer, "{file}:{line} ")?,
            _ => write!(writer, "{} ", meta.target())?,
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Log file that can be opened after the subscriber is installed.
/// Records are dropped while the slot is empty.
#[derive(Clone, Default)]
struct FileSlot(Arc<Mutex<Option<File>>>);

impl FileSlot {
    fn lock(&self) -> MutexGuard<'_, Option<File>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct SlotWriter<'a>(MutexGuard<'a, Option<File>>);

impl Write for SlotWriter<'_> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        match &mut *self.0 {
            Some(file) => file.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut *self.0 {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for FileSlot {
    type Writer = SlotWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SlotWriter(self.lock())
    }
}

static FILE_SLOT: OnceLock<FileSlot> = OnceLock::new();

/// Explicit directive first, then `RUST_LOG`, then [`DEFAULT_FILTER`].
fn make_filter(directive: Option<&str>) -> Result<EnvFilter> {
    match directive {
        Some(directive) => EnvFilter::try_new(directive)
            .map_err(|e| anyhow!("invalid log level '{directive}': {e}")),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}

/// Installs the global subscriber. Call once at startup.
///
/// Stdout is colored only when attached to a terminal. File output stays
/// inactive until [`enable_file_logging`] is called.
pub fn init_logging(level: Option<&str>) -> Result<()> {
    let slot = FILE_SLOT.get_or_init(FileSlot::default).clone();
    let level_filter = make_filter(level)?;

    let stdout_layer = tracing_subscriber::fmt::layer()
        .event_format(LocalFmt)
        .with_ansi(io::stdout().is_terminal());

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(LocalFmt)
        .with_ansi(false)
        .with_writer(slot);

    tracing_subscriber::registry()
        .with(level_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("logging already initialized: {e}"))
}

/// Appends log records to `path`, replacing any file already open.
pub fn enable_file_logging(path: &Path) -> Result<()> {
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| anyhow!("cannot open log file '{}': {e}", path.display()))?;

    match FILE_SLOT.get() {
        Some(slot) => {
            *slot.lock() = Some(file);
            Ok(())
        }
        None => bail!("logging not yet initialized"),
    }
}

/// Logs the failure of a background task.
pub fn log_task_error(
    task_name: &'static str,
    result: Result<()>,
) {
    if let Err(error) = result {
        error!(task = task_name, ?error, "Background task failed");
    }
}
