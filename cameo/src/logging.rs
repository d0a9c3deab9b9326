// Logging for cameo
//
// The runtime itself only emits `tracing` events: actor lifecycle at INFO/DEBUG,
// dead letters and double stops at WARN, dropped messages at ERROR. This module
// installs a global `tracing-subscriber` for applications and tests that want
// to see them.
//
// # Usage Examples
//
// ```rust
// use cameo::logging;
//
// // INFO level, human readable console output
// logging::init_default();
//
// // Or pick the settings yourself
// let config = logging::LogConfig {
//     level: tracing::Level::DEBUG,
//     json_format: false,
//     ..Default::default()
// };
// logging::init(config);
// ```
//
// The `RUST_LOG` environment variable is honored on top of the configured level.

use std::sync::Once;

use tracing::{Level, Subscriber};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Configuration for the global subscriber.
///
/// # Examples
///
/// ```rust
/// use cameo::logging::LogConfig;
/// use tracing::Level;
///
/// let config = LogConfig {
///     level: Level::DEBUG,
///     json_format: true,
///     show_file_line: false,
///     show_thread_info: true,
///     show_time: true,
///     target_filters: Some("cameo=debug,cameo::engine=trace".to_string()),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: Level,
    /// Whether to use JSON format for logs
    pub json_format: bool,
    /// Whether to include file and line information
    pub show_file_line: bool,
    /// Whether to include thread name/id
    pub show_thread_info: bool,
    /// Whether to include timestamps (text format only)
    pub show_time: bool,
    /// Target filter expressions (format: "target=level,target2=level2,...")
    pub target_filters: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            show_file_line: true,
            show_thread_info: true,
            show_time: true,
            target_filters: None,
        }
    }
}

static INIT: Once = Once::new();

fn env_filter(config: &LogConfig) -> EnvFilter {
    let mut filter = EnvFilter::from_default_env().add_directive(config.level.into());
    if let Some(filters) = &config.target_filters {
        for directive in filters.split(',') {
            match directive.trim().parse() {
                Ok(directive) => filter = filter.add_directive(directive),
                Err(err) => eprintln!("Ignoring invalid log directive '{}': {}", directive, err),
            }
        }
    }
    filter
}

fn text_layer<S>(config: &LogConfig) -> fmt::Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_ansi(atty::is(atty::Stream::Stdout))
        .with_file(config.show_file_line)
        .with_line_number(config.show_file_line)
        .with_thread_names(config.show_thread_info)
        .with_thread_ids(config.show_thread_info)
}

/// Install the global subscriber.
///
/// Safe to call more than once; only the first call takes effect. If another
/// subscriber was already installed elsewhere, the error is reported on stderr
/// and the existing one is kept.
pub fn init(config: LogConfig) {
    INIT.call_once(|| {
        let registry = tracing_subscriber::registry().with(env_filter(&config));

        let result = if config.json_format {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .flatten_event(true)
                        .with_file(config.show_file_line)
                        .with_line_number(config.show_file_line)
                        .with_thread_names(config.show_thread_info)
                        .with_thread_ids(config.show_thread_info),
                )
                .try_init()
        } else if config.show_time {
            registry.with(text_layer(&config)).try_init()
        } else {
            registry.with(text_layer(&config).without_time()).try_init()
        };

        if let Err(err) = result {
            eprintln!("Error setting global tracing subscriber: {}", err);
        }
    });
}

/// INFO level, human readable console output.
pub fn init_default() {
    init(LogConfig::default());
}

/// DEBUG level with engine internals at TRACE.
pub fn init_development() {
    init(LogConfig {
        level: Level::DEBUG,
        target_filters: Some("cameo=debug,cameo::engine=trace".to_string()),
        ..Default::default()
    });
}

/// INFO level JSON output without source locations.
pub fn init_production() {
    init(LogConfig {
        level: Level::INFO,
        json_format: true,
        show_file_line: false,
        show_thread_info: true,
        show_time: true,
        target_filters: None,
    });
}

/// Only warnings and errors, compact, for test output.
pub fn init_test() {
    init(LogConfig {
        level: Level::WARN,
        json_format: false,
        show_file_line: true,
        show_thread_info: false,
        show_time: false,
        target_filters: None,
    });
}

/// Span covering everything an actor's task does.
///
/// ```rust
/// let span = cameo::actor_span!("my_crate::Baker", "baker");
/// let _guard = span.enter();
///
/// let span = cameo::actor_span!("my_crate::Baker", "baker", shift = "night");
/// ```
#[macro_export]
macro_rules! actor_span {
    ($actor_type:expr, $actor_id:expr) => {
        $crate::tracing::info_span!("actor", actor_type = $actor_type, actor_id = $actor_id)
    };
    ($actor_type:expr, $actor_id:expr, $($fields:tt)*) => {
        $crate::tracing::info_span!("actor", actor_type = $actor_type, actor_id = $actor_id, $($fields)*)
    };
}

/// Record an actor lifecycle transition.
///
/// ```rust
/// cameo::log_lifecycle!("baker", "started");
/// cameo::log_lifecycle!("baker", "stopped", drained = 3);
/// ```
#[macro_export]
macro_rules! log_lifecycle {
    ($actor_id:expr, $event:expr) => {
        $crate::tracing::debug!(actor_id = $actor_id, event = $event, "lifecycle")
    };
    ($actor_id:expr, $event:expr, $($fields:tt)*) => {
        $crate::tracing::debug!(actor_id = $actor_id, event = $event, $($fields)*, "lifecycle")
    };
}
