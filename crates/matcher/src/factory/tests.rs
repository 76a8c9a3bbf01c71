use super::*;
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::Duration;

use crate::diagnostics::DiagnosticCode;
use crate::directory::SchemaDirectory;
use crate::metrics::{set_reload_metrics, ReloadMetrics};
use index::IndexKeyFactory;

const EN: &str = "en-US:1.3.6.1.4.1.42.2.27.9.4.34.1";
const FR: &str = "fr:1.3.6.1.4.1.42.2.27.9.4.76.1";

fn factory(owner: &str) -> (Arc<SchemaDirectory>, CollationRuleFactory) {
    let directory = Arc::new(SchemaDirectory::new());
    let factory = CollationRuleFactory::new(owner, directory.clone());
    (directory, factory)
}

#[test]
fn initialize_publishes_and_registers() {
    let (directory, factory) = factory("collation");
    let result = factory.initialize(CollationConfig::with_collations([EN, FR]));

    assert!(result.is_clean(), "{result:?}");
    assert_eq!(result.generation, 1);
    assert_eq!(factory.rules().len(), 14);
    assert_eq!(directory.len(), 14);
    assert_eq!(
        directory.owner_of("1.3.6.1.4.1.42.2.27.9.4.34.1.6").as_deref(),
        Some("collation")
    );

    let sub = factory.rule_by_name("en-US.sub").unwrap();
    assert_eq!(sub.kind(), RuleKind::Substring);
    assert_eq!(factory.rule("1.3.6.1.4.1.42.2.27.9.4.76.1").unwrap().name(), "fr");
}

#[test]
fn disabled_initialize_publishes_nothing() {
    let (directory, factory) = factory("collation");
    let config = CollationConfig {
        enabled: false,
        ..CollationConfig::with_collations([EN])
    };
    let result = factory.initialize(config);
    assert_eq!(result.generation, 0);
    assert!(factory.rules().is_empty());
    assert!(directory.is_empty());
}

#[test]
fn bad_collations_become_diagnostics() {
    let (_, factory) = factory("collation");
    let result = factory.initialize(CollationConfig::with_collations([
        "klingon:1.2.3",
        "en-US",
        FR,
    ]));
    assert_eq!(result.count(DiagnosticCode::UnsupportedLocale), 1);
    assert_eq!(result.count(DiagnosticCode::MalformedCollationSpec), 1);
    assert!(!result.admin_action_required);
    assert_eq!(factory.rules().len(), 7);
}

#[test]
fn acceptability_check_reports_every_bad_entry() {
    let (_, factory) = factory("collation");
    assert!(factory
        .is_configuration_change_acceptable(&CollationConfig::with_collations([EN, FR]))
        .is_ok());

    let bad = CollationConfig::with_collations(["zz:1.1", EN, "fr:"]);
    let reasons = factory.is_configuration_change_acceptable(&bad).unwrap_err();
    let codes: Vec<_> = reasons.iter().map(|d| d.code).collect();
    assert_eq!(
        codes,
        vec![
            DiagnosticCode::UnsupportedLocale,
            DiagnosticCode::MalformedCollationSpec
        ]
    );

    let disabled = CollationConfig {
        enabled: false,
        ..bad
    };
    assert!(factory.is_configuration_change_acceptable(&disabled).is_ok());
}

#[test]
fn apply_is_a_no_op_when_disabled_or_flipping() {
    let (_, factory) = factory("collation");
    factory.initialize(CollationConfig::with_collations([EN]));

    let disabled = CollationConfig {
        enabled: false,
        ..CollationConfig::with_collations([FR])
    };
    let result = factory.apply_configuration_change(disabled);
    assert_eq!(result.generation, 1);
    assert!(factory.rule_by_name("en-US").is_some());
    assert!(factory.rule_by_name("fr").is_none());

    let (_, dormant) = self::factory("other");
    dormant.initialize(CollationConfig {
        enabled: false,
        ..CollationConfig::default()
    });
    let result = dormant.apply_configuration_change(CollationConfig::with_collations([FR]));
    assert_eq!(result.generation, 0);
    assert!(dormant.rules().is_empty());
}

#[test]
fn apply_replaces_rules_and_keeps_aliases() {
    let (directory, factory) = factory("collation");
    factory.initialize(CollationConfig::with_collations(["en:1.9"]));

    let result = factory.apply_configuration_change(CollationConfig::with_collations([
        "en-GB:1.9",
        FR,
    ]));
    assert!(result.is_clean(), "{result:?}");
    assert_eq!(result.generation, 2);

    let default_eq = factory.rule("1.9").unwrap();
    let names: Vec<_> = default_eq.names().iter().map(String::as_str).collect();
    assert_eq!(names, vec!["en", "en-GB"]);
    assert_eq!(default_eq.locale().to_string(), "en-GB");
    assert_eq!(factory.rule_by_name("en").unwrap().oid(), "1.9");
    assert_eq!(directory.len(), 14);
    assert_eq!(factory.config().collations.len(), 2);

    // Same config again: same aliases, new generation.
    let again = factory.apply_configuration_change(factory.config());
    assert_eq!(again.generation, 3);
    assert_eq!(factory.rule("1.9").unwrap().names(), default_eq.names());
}

#[test]
fn conflicts_are_reported_and_generation_still_advances() {
    let directory = Arc::new(SchemaDirectory::new());
    let core = CollationRuleFactory::new("core", directory.clone());
    core.initialize(CollationConfig::with_collations(["en:2.1"]));

    let collation = CollationRuleFactory::new("collation", directory.clone());
    collation.initialize(CollationConfig::with_collations([FR]));
    let result = collation.apply_configuration_change(CollationConfig::with_collations([
        "en:2.1",
        FR,
    ]));

    assert!(result.admin_action_required);
    assert_eq!(result.count(DiagnosticCode::RegistrationConflict), 7);
    assert_eq!(result.generation, 2);
    assert_eq!(collation.rules().len(), 14);
    assert_eq!(directory.owner_of("2.1").as_deref(), Some("core"));
    assert_eq!(
        directory.owner_of("1.3.6.1.4.1.42.2.27.9.4.76.1").as_deref(),
        Some("collation")
    );
}

#[test]
fn finalize_withdraws_everything() {
    let (directory, factory) = factory("collation");
    factory.initialize(CollationConfig::with_collations([EN, FR]));
    factory.finalize();
    assert!(directory.is_empty());
    assert!(factory.rules().is_empty());
    assert_eq!(
        factory.resolve("en-US").unwrap_err(),
        MatchError::UnknownRule("en-US".into())
    );
}

#[test]
fn resolve_accepts_oid_or_alias() {
    let (_, factory) = factory("collation");
    factory.initialize(CollationConfig::with_collations([EN]));
    let by_name = factory.resolve("en-US.gte").unwrap();
    let by_oid = factory.resolve("1.3.6.1.4.1.42.2.27.9.4.34.1.4").unwrap();
    assert!(Arc::ptr_eq(&by_name, &by_oid));
    assert!(factory.resolve("en-us.gte").is_err());
}

#[test]
fn config_validation() {
    assert!(CollationConfig::default().validate().is_ok());
    let zero = CollationConfig {
        substring_length: 0,
        ..CollationConfig::default()
    };
    assert!(matches!(zero.validate(), Err(MatchError::InvalidConfig(_))));
    let no_kinds = CollationConfig {
        matching_rule_types: Vec::new(),
        ..CollationConfig::default()
    };
    assert!(no_kinds.validate().is_err());
}

#[test]
fn config_defaults_fill_missing_fields() {
    let config: CollationConfig =
        serde_json::from_str(r#"{"collations": ["en:1.2"], "matching_rule_types": ["equality"]}"#)
            .unwrap();
    assert!(config.enabled);
    assert_eq!(config.substring_length, DEFAULT_SUBSTRING_LENGTH);
    assert_eq!(config.matching_rule_types, vec![RuleKind::Equality]);
}

#[derive(Default)]
struct RecordingMetrics {
    reloads: Mutex<Vec<(String, usize, usize)>>,
}

impl ReloadMetrics for RecordingMetrics {
    fn record_reload(&self, owner: &str, _latency: Duration, rules: usize, diagnostics: usize) {
        self.reloads
            .lock()
            .unwrap()
            .push((owner.to_owned(), rules, diagnostics));
    }
}

#[test]
fn reloads_are_reported_to_metrics() {
    let metrics = Arc::new(RecordingMetrics::default());
    set_reload_metrics(Some(metrics.clone()));

    let (_, factory) = factory("metrics-owner");
    factory.initialize(CollationConfig::with_collations([EN, "bogus"]));

    set_reload_metrics(None);
    let reloads = metrics.reloads.lock().unwrap();
    // Other tests may reload concurrently under their own owners.
    let ours: Vec<_> = reloads
        .iter()
        .filter(|(owner, _, _)| owner == "metrics-owner")
        .collect();
    assert_eq!(ours, vec![&("metrics-owner".to_string(), 7, 1)]);
}

/// Directory whose next `register` call parks until released.
struct GatedDirectory {
    inner: SchemaDirectory,
    armed: std::sync::atomic::AtomicBool,
    entered: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl MatchingRuleDirectory for GatedDirectory {
    fn register(&self, owner: &str, rule: Arc<MatchingRule>) -> Result<(), MatchError> {
        if self.armed.swap(false, std::sync::atomic::Ordering::SeqCst) {
            self.entered.lock().unwrap().send(()).unwrap();
            self.release.lock().unwrap().recv().unwrap();
        }
        self.inner.register(owner, rule)
    }

    fn deregister(&self, owner: &str, oid: &str) {
        self.inner.deregister(owner, oid);
    }
}

#[test]
fn readers_do_not_wait_for_a_reload_in_progress() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let directory = Arc::new(GatedDirectory {
        inner: SchemaDirectory::new(),
        armed: Default::default(),
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    });
    let factory = Arc::new(CollationRuleFactory::new("collation", directory.clone()));
    factory.initialize(CollationConfig::with_collations(["en:1.2.3"]));

    directory
        .armed
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let writer = {
        let factory = Arc::clone(&factory);
        thread::spawn(move || {
            factory.apply_configuration_change(CollationConfig {
                substring_length: 8,
                ..CollationConfig::with_collations(["en:1.2.3"])
            })
        })
    };
    entered_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("reload reached the directory");

    let (seen_tx, seen_rx) = mpsc::channel();
    {
        let factory = Arc::clone(&factory);
        thread::spawn(move || {
            let generation = factory.snapshot();
            let rule = Arc::clone(generation.resolve("en.sub").unwrap());
            let ids: Vec<String> = rule
                .key_factories(generation.substring_length())
                .unwrap()
                .iter()
                .map(|f| f.index_id().to_owned())
                .collect();
            let window = factory.substring_length();
            let configured = factory.config().substring_length;
            seen_tx
                .send((generation.number(), ids, window, configured))
                .unwrap();
        });
    }
    let (number, ids, window, configured) = seen_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("reader returned while the reload was parked");
    assert_eq!(number, 1);
    assert!(ids.contains(&"en.substring.6".to_string()), "{ids:?}");
    assert_eq!(window, 6);
    assert_eq!(configured, 6);

    release_tx.send(()).unwrap();
    let result = writer.join().unwrap();
    assert_eq!(result.generation, 2);
    let generation = factory.snapshot();
    assert_eq!(generation.substring_length(), 8);
    let rule = generation.resolve("en.sub").unwrap();
    let ids: Vec<String> = rule
        .key_factories(generation.substring_length())
        .unwrap()
        .iter()
        .map(|f| f.index_id().to_owned())
        .collect();
    assert!(ids.contains(&"en.substring.8".to_string()), "{ids:?}");
}
