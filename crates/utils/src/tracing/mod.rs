use conformer_core::{OutcomeKind, CONFORMER_LOG_VAR};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export tracing macros for convenience
pub use tracing::{debug, error, info, instrument, span, trace, warn, Level, Span};

/// Initialize the tracing system
///
/// The filter comes from `CONFORMER_LOG`, then `RUST_LOG`, then defaults to
/// `info`. Output goes to stderr so stdout stays free for reports; ANSI colours
/// are only used on a terminal.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = EnvFilter::try_from_env(CONFORMER_LOG_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(is_tty())
        .compact()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

fn is_tty() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}

/// Create a span covering one test invocation
pub fn test_span(file: &str) -> Span {
    span!(Level::INFO, "test", file = %file)
}

/// Emit a structured event for a cache lookup
pub fn cache_event(file: &str, hit: bool, reason: &str) {
    if hit {
        debug!(file = %file, reason = %reason, "cache_hit");
    } else {
        debug!(file = %file, reason = %reason, "cache_miss");
    }
}

/// Emit a structured event for a finished test
pub fn test_completed(file: &str, kind: OutcomeKind, duration_ms: u64, cached: bool) {
    match kind {
        OutcomeKind::Success => info!(
            file = %file,
            result = %kind,
            duration_ms = %duration_ms,
            cached = cached,
            "test_completed"
        ),
        _ => warn!(
            file = %file,
            result = %kind,
            duration_ms = %duration_ms,
            cached = cached,
            "test_failed"
        ),
    }
}
