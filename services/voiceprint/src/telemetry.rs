use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging with JSON output
///
/// `RUST_LOG` takes precedence over `log_level`. Panics if a global
/// subscriber is already installed; use [`try_init_tracing`] in tests.
pub fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(log_level))
        .with(fmt::layer().json())
        .init();
}

/// Like [`init_tracing`], but returns false instead of panicking when a
/// subscriber is already set
pub fn try_init_tracing(log_level: &str) -> bool {
    tracing_subscriber::registry()
        .with(env_filter(log_level))
        .with(fmt::layer().json())
        .try_init()
        .is_ok()
}

fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
}
