// Metrics hooks for the `matcher` crate.
//
// Callers install a global `ReloadMetrics` implementation via [`set_reload_metrics`];
// every `CollationRuleFactory` then reports each configuration it applies.
use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::OnceCell;

/// Metrics observer for rule factory reloads.
pub trait ReloadMetrics: Send + Sync {
    /// Record one applied configuration.
    ///
    /// `owner` names the factory, `latency` covers rule generation and
    /// registration, `rules` is the size of the published generation and
    /// `diagnostics` the number of problems reported with it.
    fn record_reload(&self, owner: &str, latency: Duration, rules: usize, diagnostics: usize);
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn ReloadMetrics>>> {
    static METRICS: OnceCell<RwLock<Option<Arc<dyn ReloadMetrics>>>> = OnceCell::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn ReloadMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install or clear the global reload metrics recorder.
pub fn set_reload_metrics(recorder: Option<Arc<dyn ReloadMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}
