//! Process-wide tracing setup shared by the API server and the CLI tools.

use std::any::Any;
use std::env;
use std::panic;
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

const DEFAULT_FILTER: &str = "info";

// Dropping the guard would stop the background writer thread.
static FILE_WRITER_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Logging knobs read from `CT_LOG_DIR` and `CT_LOG_INCLUDE_BACKTRACE`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogOptions {
    /// When set, logs go to `<dir>/<app>.log`, rotated daily, instead of stdout.
    pub log_dir: Option<PathBuf>,
    /// Also run the default panic hook, which prints a backtrace if enabled.
    pub include_backtrace: bool,
}

impl LogOptions {
    pub fn from_env() -> Self {
        Self {
            log_dir: env::var_os("CT_LOG_DIR")
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            include_backtrace: env::var("CT_LOG_INCLUDE_BACKTRACE")
                .map(|raw| parse_flag(&raw))
                .unwrap_or(false),
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn panic_payload_text(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Reports panics as `error` events tagged with the application name.
/// Only the first call per process installs the hook.
pub fn install_tracing_panic_hook(app_name: &'static str) {
    static HOOK: OnceLock<()> = OnceLock::new();

    HOOK.get_or_init(|| {
        let include_backtrace = LogOptions::from_env().include_backtrace;
        let previous = panic::take_hook();

        panic::set_hook(Box::new(move |info| {
            let thread = std::thread::current();
            let location = info
                .location()
                .map(|loc| format!("{}:{}", loc.file(), loc.line()))
                .unwrap_or_else(|| "unknown".to_string());

            tracing::error!(
                application = app_name,
                thread = thread.name().unwrap_or("unnamed"),
                %location,
                message = %panic_payload_text(info.payload()),
                "thread panicked"
            );

            if include_backtrace {
                previous(info);
            }
        }));
    });
}

fn file_writer(dir: PathBuf, app_name: &str) -> Option<BoxMakeWriter> {
    if let Err(err) = std::fs::create_dir_all(&dir) {
        eprintln!(
            "cannot create log directory {} ({err}); falling back to stdout",
            dir.display()
        );
        return None;
    }

    let appender = tracing_appender::rolling::daily(dir, format!("{app_name}.log"));
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = FILE_WRITER_GUARD.set(guard);
    Some(BoxMakeWriter::new(writer))
}

/// Installs the global `fmt` subscriber, filtered by `RUST_LOG`.
/// A subscriber that is already installed is left in place.
pub fn init_tracing_subscriber(app_name: &'static str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    let writer = LogOptions::from_env()
        .log_dir
        .and_then(|dir| file_writer(dir, app_name));

    let installed = match writer {
        Some(writer) => subscriber.with_writer(writer).try_init(),
        None => subscriber.try_init(),
    };

    if installed.is_ok() {
        tracing::debug!(application = app_name, "tracing initialised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_common_truthy_spellings() {
        for raw in ["1", "true", "TRUE", " yes ", "on"] {
            assert!(parse_flag(raw), "{raw}");
        }
        for raw in ["0", "false", "", "maybe"] {
            assert!(!parse_flag(raw), "{raw}");
        }
    }

    #[test]
    fn panic_payloads_are_rendered_as_text() {
        let borrowed: Box<dyn Any + Send> = Box::new("boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("bang"));
        let other: Box<dyn Any + Send> = Box::new(7_u8);

        assert_eq!(panic_payload_text(borrowed.as_ref()), "boom");
        assert_eq!(panic_payload_text(owned.as_ref()), "bang");
        assert_eq!(panic_payload_text(other.as_ref()), "non-string panic payload");
    }
}
