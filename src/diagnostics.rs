//! Injectable sink for the diagnostics emitted by silent `Set`/`Get`/`Remove`
//! failures. Injectable rather than a hard-coded standard-error writer, so a
//! hosting process can route these diagnostics wherever it routes its own.

use std::sync::Arc;

use crate::error::Error;

/// Receives a diagnostic whenever the façade swallows an error to preserve
/// void/Option return semantics.
pub trait DiagnosticsSink: Send + Sync {
    /// Reports `err` that occurred while performing `operation` on `key`.
    fn report(&self, operation: &str, key: &[u8], err: &Error);
}

/// The default sink: forwards to the `log` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDiagnosticsSink;

impl DiagnosticsSink for LogDiagnosticsSink {
    fn report(&self, operation: &str, key: &[u8], err: &Error) {
        log::warn!(
            "{operation} failed for key {:?}: {err}",
            String::from_utf8_lossy(key)
        );
    }
}

/// Returns the default injectable diagnostics sink.
pub fn default_sink() -> Arc<dyn DiagnosticsSink> {
    Arc::new(LogDiagnosticsSink)
}
