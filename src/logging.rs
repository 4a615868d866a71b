//! Tracing subscriber setup and the component event macros.
//!
//! Levels come from `[logging]` in the configuration unless `RUST_LOG` is
//! set and parses, in which case it wins outright:
//!
//! ```bash
//! RUST_LOG=catalogd::catalog=trace catalogd scan
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;

use crate::config::LoggingConfig;

/// Wall-clock time of day with milliseconds.
struct TimeOfDay;

impl FormatTime for TimeOfDay {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// `EnvFilter` directives for a logging section: the default level, then
/// `target=level` for each override.
pub fn filter_directives(config: &LoggingConfig) -> String {
    std::iter::once(config.default.clone())
        .chain(
            config
                .modules
                .iter()
                .map(|(target, level)| format!("{target}={level}")),
        )
        .collect::<Vec<_>>()
        .join(",")
}

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directives(config)))
}

/// Install the global subscriber, writing to stderr.
///
/// Returns false when a subscriber was already installed; the existing one
/// stays in place.
pub fn init_with_config(config: &LoggingConfig) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(config))
        .with_timer(TimeOfDay)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

#[doc(hidden)]
#[macro_export]
macro_rules! component_event {
    ($level:ident, $component:expr, $event:expr) => {
        tracing::$level!("[{}] {}", $component, $event)
    };
    ($level:ident, $component:expr, $event:expr, $($arg:tt)+) => {
        tracing::$level!("[{}] {}: {}", $component, $event, format!($($arg)+))
    };
}

/// Info-level `[component] event: details` line.
///
/// ```ignore
/// log_event!("catalog", "adding", "{}", path.display());
/// ```
#[macro_export]
macro_rules! log_event {
    ($($t:tt)+) => {
        $crate::component_event!(info, $($t)+)
    };
}

/// Debug-level counterpart of [`log_event!`].
#[macro_export]
macro_rules! debug_event {
    ($($t:tt)+) => {
        $crate::component_event!(debug, $($t)+)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives() {
        let mut config = LoggingConfig::default();
        assert_eq!(filter_directives(&config), "info");

        config.default = "warn".to_string();
        config
            .modules
            .insert("catalogd::watcher".to_string(), "debug".to_string());
        config
            .modules
            .insert("catalogd::catalog".to_string(), "trace".to_string());

        // BTreeMap keeps overrides in target order.
        assert_eq!(
            filter_directives(&config),
            "warn,catalogd::catalog=trace,catalogd::watcher=debug"
        );
    }

    #[test]
    fn test_second_init_is_rejected() {
        let config = LoggingConfig::default();
        init_with_config(&config);
        assert!(!init_with_config(&config));
    }
}
