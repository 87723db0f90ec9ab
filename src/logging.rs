use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Global crash log directory, set during init.
static CRASH_LOG_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Initialize tracing with stdout and Sentry layers.
///
/// - Stdout: compact, human-readable for the server console
/// - Sentry: captures ERROR events as issues, WARN as breadcrumbs
/// - Default level: INFO (crate at DEBUG), override via RUST_LOG env
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,clinic_desk=debug"));

    let stdout_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .compact();

    // No-op when Sentry DSN is not configured.
    let sentry_layer = sentry_tracing::layer().event_filter(|meta| match *meta.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    });

    let result = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(sentry_layer)
        .try_init();

    if result.is_ok() {
        tracing::debug!("Tracing initialized");
    }
}

/// Install a panic hook that writes crash details to `<data_dir>/crash_logs`.
pub fn install_crash_hook(data_dir: &Path) {
    let crash_dir = data_dir.join("crash_logs");
    let _ = std::fs::create_dir_all(&crash_dir);
    if CRASH_LOG_DIR.set(crash_dir).is_err() {
        return;
    }

    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if let Some(dir) = CRASH_LOG_DIR.get() {
            let path = dir.join(crash_file_name(chrono::Local::now()));
            let _ = std::fs::write(&path, crash_report(info));
            eprintln!("[CRASH] Report written to: {}", path.display());
        }

        // Call the previous hook (Sentry, default, etc.)
        prev_hook(info);
    }));

    tracing::info!("Crash hook installed");
}

fn crash_file_name(now: chrono::DateTime<chrono::Local>) -> String {
    format!("crash_{}.log", now.format("%Y%m%d_%H%M%S"))
}

fn crash_report(info: &std::panic::PanicHookInfo<'_>) -> String {
    let mut report = format!(
        "=== CLINIC DESK CRASH REPORT ===\nTime: {}\nVersion: {}\n\n",
        chrono::Local::now().to_rfc3339(),
        env!("CARGO_PKG_VERSION"),
    );

    if let Some(msg) = info.payload().downcast_ref::<&str>() {
        report.push_str(&format!("Panic: {}\n", msg));
    } else if let Some(msg) = info.payload().downcast_ref::<String>() {
        report.push_str(&format!("Panic: {}\n", msg));
    } else {
        report.push_str("Panic: <unknown payload>\n");
    }

    if let Some(loc) = info.location() {
        report.push_str(&format!("Location: {}:{}:{}\n", loc.file(), loc.line(), loc.column()));
    }

    report.push_str(&format!(
        "\nBacktrace:\n{}\n",
        std::backtrace::Backtrace::force_capture()
    ));

    let thread = std::thread::current();
    report.push_str(&format!("\nThread: {:?} (id: {:?})\n", thread.name(), thread.id()));
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_crash_file_name_is_sortable() {
        let t = chrono::Local.with_ymd_and_hms(2026, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(crash_file_name(t), "crash_20260309_070501.log");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init();
        init();
    }
}
