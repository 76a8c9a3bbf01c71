use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Instant;

use index::DEFAULT_SUBSTRING_LENGTH;
use serde::{Deserialize, Serialize};
use tracing::{info, warn, Level};

use crate::diagnostics::{ConfigChangeResult, Diagnostic};
use crate::directory::MatchingRuleDirectory;
use crate::error::MatchError;
use crate::generator::LocaleRuleGenerator;
use crate::metrics::metrics_recorder;
use crate::registry::{MatchingRuleRegistry, RuleGeneration};
use crate::types::{MatchingRule, RuleKind};

#[cfg(test)]
mod tests;

/// Configuration of one collation matching rule factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollationConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Rule kinds generated for every collation.
    #[serde(default = "default_matching_rule_types")]
    pub matching_rule_types: Vec<RuleKind>,
    /// `"<language-tag>:<base-oid>"` entries.
    #[serde(default)]
    pub collations: Vec<String>,
    /// Window length of the substring indexes.
    #[serde(default = "default_substring_length")]
    pub substring_length: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_matching_rule_types() -> Vec<RuleKind> {
    RuleKind::ALL.to_vec()
}

fn default_substring_length() -> usize {
    DEFAULT_SUBSTRING_LENGTH
}

impl Default for CollationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            matching_rule_types: default_matching_rule_types(),
            collations: Vec::new(),
            substring_length: default_substring_length(),
        }
    }
}

impl CollationConfig {
    pub fn with_collations<I, S>(collations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            collations: collations.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if self.substring_length == 0 {
            return Err(MatchError::InvalidConfig(
                "substring_length must be greater than zero".into(),
            ));
        }
        if self.enabled && self.matching_rule_types.is_empty() {
            return Err(MatchError::InvalidConfig(
                "matching_rule_types must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn generator(&self) -> LocaleRuleGenerator {
        LocaleRuleGenerator::new(self.matching_rule_types.iter().copied())
    }
}

/// Owns the collation matching rules derived from a [`CollationConfig`].
///
/// Rules are published into the factory's [`MatchingRuleRegistry`] and into a
/// shared [`MatchingRuleDirectory`] under this factory's owner name. Bad
/// collations and directory conflicts never abort a reload: they come back as
/// diagnostics and the new generation is published anyway.
///
/// Configuration events are serialized on `reload`. Search-time reads only
/// touch the registry, so they never wait for a rebuild.
pub struct CollationRuleFactory {
    owner: String,
    directory: Arc<dyn MatchingRuleDirectory>,
    registry: MatchingRuleRegistry,
    config: RwLock<CollationConfig>,
    reload: Mutex<()>,
}

impl fmt::Debug for CollationRuleFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollationRuleFactory")
            .field("owner", &self.owner)
            .field("generation", &self.registry.generation())
            .finish_non_exhaustive()
    }
}

impl CollationRuleFactory {
    pub fn new(owner: impl Into<String>, directory: Arc<dyn MatchingRuleDirectory>) -> Self {
        Self {
            owner: owner.into(),
            directory,
            registry: MatchingRuleRegistry::new(),
            config: RwLock::new(CollationConfig {
                enabled: false,
                ..CollationConfig::default()
            }),
            reload: Mutex::new(()),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn registry(&self) -> &MatchingRuleRegistry {
        &self.registry
    }

    /// Current configuration.
    pub fn config(&self) -> CollationConfig {
        self.config
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn substring_length(&self) -> usize {
        self.registry.snapshot().substring_length()
    }

    /// The current generation: rules and window length from the same publish.
    pub fn snapshot(&self) -> Arc<RuleGeneration> {
        self.registry.snapshot()
    }

    /// Build and publish the first generation.
    pub fn initialize(&self, config: CollationConfig) -> ConfigChangeResult {
        let _reload = self.reload_guard();
        let result = if config.enabled {
            self.rebuild(&config)
        } else {
            self.unchanged()
        };
        self.store_config(config);
        result
    }

    /// Check a proposed configuration without applying it.
    ///
    /// A disabled configuration is always acceptable. Otherwise every
    /// collation must parse and name a supported locale.
    pub fn is_configuration_change_acceptable(
        &self,
        config: &CollationConfig,
    ) -> Result<(), Vec<Diagnostic>> {
        if !config.enabled {
            return Ok(());
        }
        let reasons: Vec<Diagnostic> = config
            .collations
            .iter()
            .filter_map(|collation| {
                collation::LocaleSpec::parse(collation)
                    .and_then(|spec| spec.locale())
                    .err()
                    .map(|err| Diagnostic::for_collation(collation, &err))
            })
            .collect();
        if reasons.is_empty() {
            Ok(())
        } else {
            Err(reasons)
        }
    }

    /// Replace the published rules with those derived from `config`.
    ///
    /// Nothing happens when `config` is disabled or flips the enabled flag;
    /// enabling and disabling are handled by creating or finalizing the
    /// factory.
    pub fn apply_configuration_change(&self, config: CollationConfig) -> ConfigChangeResult {
        let _reload = self.reload_guard();
        if !config.enabled || !self.config().enabled {
            return self.unchanged();
        }
        self.deregister_all();
        let result = self.rebuild(&config);
        self.store_config(config);
        result
    }

    /// Withdraw every rule this factory registered.
    pub fn finalize(&self) {
        let _reload = self.reload_guard();
        self.deregister_all();
        let generation = self.registry.replace_all(Vec::new());
        info!(owner = %self.owner, generation, "collation_rules_finalized");
    }

    pub fn rule(&self, oid: &str) -> Option<Arc<MatchingRule>> {
        self.registry.lookup(oid)
    }

    pub fn rule_by_name(&self, name: &str) -> Option<Arc<MatchingRule>> {
        self.registry.lookup_name(name)
    }

    /// Resolve an OID or alias against the current generation.
    pub fn resolve(&self, oid_or_name: &str) -> Result<Arc<MatchingRule>, MatchError> {
        self.registry.snapshot().resolve(oid_or_name).cloned()
    }

    pub fn rules(&self) -> Vec<Arc<MatchingRule>> {
        self.registry.all()
    }

    fn reload_guard(&self) -> MutexGuard<'_, ()> {
        self.reload
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn store_config(&self, config: CollationConfig) {
        *self
            .config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = config;
    }

    fn unchanged(&self) -> ConfigChangeResult {
        ConfigChangeResult {
            generation: self.registry.generation(),
            ..ConfigChangeResult::default()
        }
    }

    fn deregister_all(&self) {
        for rule in self.registry.all() {
            self.directory.deregister(&self.owner, rule.oid());
        }
    }

    fn rebuild(&self, config: &CollationConfig) -> ConfigChangeResult {
        let start = Instant::now();
        let span = tracing::span!(
            Level::INFO,
            "matcher.reload",
            owner = %self.owner,
            collations = config.collations.len()
        );
        let _guard = span.enter();

        let previous = self.registry.snapshot();
        let generated = config.generator().generate_all(&config.collations, &previous);
        let mut diagnostics = generated.diagnostics;
        for diagnostic in &diagnostics {
            warn!(%diagnostic, "collation_skipped");
        }

        let rules: Vec<Arc<MatchingRule>> = generated.rules.into_iter().map(Arc::new).collect();
        let mut admin_action_required = false;
        for rule in &rules {
            if let Err(err) = self.directory.register(&self.owner, Arc::clone(rule)) {
                warn!(oid = %rule.oid(), error = %err, "rule_registration_conflict");
                diagnostics.push(Diagnostic::for_registration(&err));
                admin_action_required = true;
            }
        }

        let rule_count = rules.len();
        let generation = self.registry.publish(rules, config.substring_length);
        let latency = start.elapsed();
        info!(
            generation,
            rules = rule_count,
            diagnostics = diagnostics.len(),
            elapsed_micros = latency.as_micros() as u64,
            "generation_published"
        );
        if let Some(recorder) = metrics_recorder() {
            recorder.record_reload(&self.owner, latency, rule_count, diagnostics.len());
        }

        ConfigChangeResult {
            diagnostics,
            admin_action_required,
            generation,
        }
    }
}
