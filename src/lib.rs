//! Workspace umbrella crate for dirmatch.
//!
//! This crate stitches the collation codec, the index layer and the matching
//! rule factory together behind [`SchemaEngine`], so a directory server can
//! load its collation configuration, produce index keys for attribute values,
//! compile filter assertions into index queries and match values, all through
//! a single entry point.

pub mod config;

pub use crate::config::{ConfigLoadError, DirmatchConfig};
pub use collation::{
    Collator, CollationError, KeyMode, Locale, LocaleSpec, SubstringAssertion, supported_locales,
};
pub use index::{
    EntryId, InMemoryBackend, IndexBackend, IndexError, IndexKey, IndexKeyFactory,
    IndexQueryFactory, PlanFactory, QueryPlan,
};
pub use matcher::{
    CollationConfig, CollationRuleFactory, ConfigChangeResult, Diagnostic, DiagnosticCode,
    MatchError, MatchingRule, MatchingRuleDirectory, RuleKind, SchemaDirectory,
};

use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{Level, info, warn};

/// Errors surfaced by [`SchemaEngine`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error(transparent)]
    Config(#[from] ConfigLoadError),
    /// The admin check refused a new configuration; nothing was applied.
    #[error("configuration rejected with {} diagnostics", .0.len())]
    Rejected(Vec<Diagnostic>),
}

impl From<IndexError> for EngineError {
    fn from(value: IndexError) -> Self {
        EngineError::Match(MatchError::from(value))
    }
}

/// Metrics observer for engine operations.
pub trait EngineMetrics: Send + Sync {
    fn record_index_keys(&self, latency: Duration, result: Result<usize, MatchError>);
    fn record_query(&self, latency: Duration, result: Result<(), MatchError>);
    fn record_match(&self, latency: Duration, result: Result<bool, MatchError>);
}

/// Install or clear the global engine metrics recorder.
pub fn set_engine_metrics(recorder: Option<Arc<dyn EngineMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn EngineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn EngineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn EngineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

struct MetricsSpan {
    recorder: Arc<dyn EngineMetrics>,
    start: Instant,
}

impl MetricsSpan {
    fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    fn record_index_keys<T>(self, result: &Result<Vec<T>, MatchError>) {
        let result = result.as_ref().map(Vec::len).map_err(Clone::clone);
        self.recorder.record_index_keys(self.start.elapsed(), result);
    }

    fn record_query<T>(self, result: &Result<T, MatchError>) {
        let result = result.as_ref().map(|_| ()).map_err(Clone::clone);
        self.recorder.record_query(self.start.elapsed(), result);
    }

    fn record_match(self, result: &Result<bool, MatchError>) {
        self.recorder
            .record_match(self.start.elapsed(), result.clone());
    }
}

/// Collation matching rules for one directory server.
///
/// Rules are addressed by OID or alias (`"en-US.sub"`). Each call takes one
/// generation snapshot and reads both the rule and the substring window from
/// it, so a concurrent [`reload`] never exposes a half-built rule set and never
/// makes a call wait.
///
/// [`reload`]: SchemaEngine::reload
#[derive(Debug)]
pub struct SchemaEngine {
    directory: Arc<SchemaDirectory>,
    factory: CollationRuleFactory,
    startup: ConfigChangeResult,
}

impl SchemaEngine {
    /// Validate `config` and publish its rules into a fresh schema directory.
    pub fn new(config: &DirmatchConfig) -> Result<Self, EngineError> {
        Self::with_directory(config, Arc::new(SchemaDirectory::new()))
    }

    /// Like [`SchemaEngine::new`], sharing an existing schema directory.
    pub fn with_directory(
        config: &DirmatchConfig,
        directory: Arc<SchemaDirectory>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let factory = CollationRuleFactory::new(config.owner.clone(), directory.clone());
        let startup = factory.initialize(config.collation.clone());
        info!(
            owner = %config.owner,
            generation = startup.generation,
            rules = factory.rules().len(),
            diagnostics = startup.diagnostics.len(),
            "engine_initialized"
        );
        Ok(Self {
            directory,
            factory,
            startup,
        })
    }

    /// Outcome of the configuration applied at construction.
    pub fn startup_result(&self) -> &ConfigChangeResult {
        &self.startup
    }

    pub fn directory(&self) -> &Arc<SchemaDirectory> {
        &self.directory
    }

    pub fn factory(&self) -> &CollationRuleFactory {
        &self.factory
    }

    /// Check and apply a new configuration.
    ///
    /// An unacceptable configuration is rejected as a whole. Otherwise the
    /// factory applies it, reporting skipped entries and conflicts in the
    /// returned result.
    pub fn reload(&self, config: &DirmatchConfig) -> Result<ConfigChangeResult, EngineError> {
        let span = tracing::span!(Level::INFO, "dirmatch.reload", owner = %self.factory.owner());
        let _guard = span.enter();

        config.validate()?;
        if let Err(reasons) = self
            .factory
            .is_configuration_change_acceptable(&config.collation)
        {
            for reason in &reasons {
                warn!(%reason, "reload_rejected");
            }
            return Err(EngineError::Rejected(reasons));
        }
        Ok(self
            .factory
            .apply_configuration_change(config.collation.clone()))
    }

    /// Resolve an OID or alias.
    pub fn rule(&self, rule: &str) -> Result<Arc<MatchingRule>, EngineError> {
        Ok(self.factory.resolve(rule)?)
    }

    /// Keys to store for `values` in every index the rule uses.
    pub fn index_keys(&self, rule: &str, values: &[&str]) -> Result<Vec<IndexKey>, EngineError> {
        let metrics = MetricsSpan::start();
        let result = self.index_keys_inner(rule, values);
        if let Some(span) = metrics {
            span.record_index_keys(&result);
        }
        Ok(result?)
    }

    fn index_keys_inner(&self, rule: &str, values: &[&str]) -> Result<Vec<IndexKey>, MatchError> {
        let generation = self.factory.snapshot();
        let rule = generation.resolve(rule)?;
        let mut keys = Vec::new();
        for factory in rule.key_factories(generation.substring_length())? {
            keys.extend(
                factory
                    .keys(values)
                    .into_iter()
                    .map(|bytes| IndexKey::new(factory.index_id(), bytes)),
            );
        }
        Ok(keys)
    }

    /// Post `values` of `entry` into every index the rule uses.
    pub fn index_entry(
        &self,
        backend: &dyn IndexBackend,
        rule: &str,
        values: &[&str],
        entry: EntryId,
    ) -> Result<(), EngineError> {
        let generation = self.factory.snapshot();
        let rule = generation.resolve(rule)?;
        for factory in rule.key_factories(generation.substring_length())? {
            backend.index_values(&*factory, values, entry)?;
        }
        Ok(())
    }

    /// Compile an assertion into the backend's query type.
    pub fn build_query<T, F>(&self, rule: &str, assertion: &str, factory: &F) -> Result<T, EngineError>
    where
        F: IndexQueryFactory<T> + ?Sized,
    {
        let metrics = MetricsSpan::start();
        let generation = self.factory.snapshot();
        let result = generation.resolve(rule).and_then(|rule| {
            rule.create_index_query(assertion, generation.substring_length(), factory)
        });
        if let Some(span) = metrics {
            span.record_query(&result);
        }
        Ok(result?)
    }

    /// Compile an assertion into a backend-neutral [`QueryPlan`].
    pub fn build_plan(&self, rule: &str, assertion: &str) -> Result<QueryPlan, EngineError> {
        self.build_query(rule, assertion, &PlanFactory)
    }

    /// Whether a raw attribute value satisfies a raw assertion under the rule.
    pub fn values_match(
        &self,
        rule: &str,
        attribute_value: &str,
        assertion: &str,
    ) -> Result<bool, EngineError> {
        let metrics = MetricsSpan::start();
        let result = self
            .factory
            .resolve(rule)
            .and_then(|rule| rule.matches(attribute_value, assertion));
        if let Some(span) = metrics {
            span.record_match(&result);
        }
        Ok(result?)
    }

    /// Withdraw every rule from the schema directory.
    pub fn finalize(&self) {
        self.factory.finalize();
    }
}
