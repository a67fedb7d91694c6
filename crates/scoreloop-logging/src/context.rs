use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::warn;

use crate::{init_tracing, LogFormat};

/// State that must exist at most once per process.
///
/// Created at start-up and handed to every loop run. Owns tracing
/// installation and the set of warnings already emitted, so a warning keyed
/// by `warn_once` appears a single time however many loops run.
#[derive(Debug)]
pub struct ProcessContext {
    format: LogFormat,
    tracing_installed: bool,
    warned: Mutex<HashSet<String>>,
}

impl ProcessContext {
    /// Install tracing at `level` and return the shared context
    pub fn init(level: &str, format: LogFormat) -> Arc<Self> {
        let tracing_installed = init_tracing(level, format);
        Arc::new(Self {
            format,
            tracing_installed,
            warned: Mutex::new(HashSet::new()),
        })
    }

    /// Context that leaves the global subscriber alone (tests, embedding)
    pub fn without_tracing() -> Arc<Self> {
        Arc::new(Self {
            format: LogFormat::default(),
            tracing_installed: false,
            warned: Mutex::new(HashSet::new()),
        })
    }

    pub fn log_format(&self) -> LogFormat {
        self.format
    }

    /// Whether this context installed the global subscriber
    pub fn tracing_installed(&self) -> bool {
        self.tracing_installed
    }

    /// Emit `message` as a warning the first time `key` is seen.
    /// Returns `true` if the warning was emitted.
    pub fn warn_once(&self, key: &str, message: &str) -> bool {
        let mut warned = self.warned.lock().unwrap_or_else(|e| e.into_inner());
        if !warned.insert(key.to_string()) {
            return false;
        }
        warn!(key, "{}", message);
        true
    }

    pub fn has_warned(&self, key: &str) -> bool {
        self.warned
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warn_once_per_key() {
        let ctx = ProcessContext::without_tracing();
        assert!(!ctx.has_warned("weights"));
        assert!(ctx.warn_once("weights", "weights do not sum to 1.0"));
        assert!(!ctx.warn_once("weights", "weights do not sum to 1.0"));
        assert!(ctx.has_warned("weights"));
        assert!(ctx.warn_once("other", "different warning"));
    }

    #[test]
    fn test_shared_across_threads() {
        let ctx = ProcessContext::without_tracing();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ctx = Arc::clone(&ctx);
                std::thread::spawn(move || ctx.warn_once("race", "only once"))
            })
            .collect();

        let emitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|emitted| *emitted)
            .count();
        assert_eq!(emitted, 1);
    }

    #[test]
    fn test_without_tracing_does_not_install() {
        let ctx = ProcessContext::without_tracing();
        assert!(!ctx.tracing_installed());
        assert_eq!(ctx.log_format(), LogFormat::Pretty);
    }
}
