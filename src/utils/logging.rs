/// Installs the global `tracing` subscriber used by the demo binary.
///
/// `default_level` usually comes from `Settings::logging.level`; unknown
/// values fall back to `INFO`. Later calls are ignored.
pub fn init(default_level: &str) {
    let lvl = parse_level(default_level);

    // try_init: tests and embedding binaries may call this more than once
    let _ = tracing_subscriber::fmt()
        .with_max_level(lvl)
        .with_target(false)
        .try_init();
}

/// Maps a textual level to a `tracing::Level`, falling back to `INFO`.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.trim().to_lowercase().as_str() {
        "error" => tracing::Level::ERROR,
        "warn" | "warning" => tracing::Level::WARN,
        "debug" => tracing::Level::DEBUG,
        "trace" => tracing::Level::TRACE,
        _ => tracing::Level::INFO,
    }
}
