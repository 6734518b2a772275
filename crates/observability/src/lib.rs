//! Tracing and logging (shared setup).

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    self::tracing::init();
}

/// Initialize with explicit settings instead of the defaults.
pub fn init_with(config: ObservabilityConfig) {
    self::tracing::init_with(&config);
}

pub use self::tracing::ObservabilityConfig;

/// Tracing configuration (filters, output format).
pub mod tracing;
