//! Reload, core-reload events, caching, and temporary secrets.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use gestalt::builder::GestaltBuilder;
use gestalt::reload::CoreReloadListener;
use gestalt::secret::SecretChecker;
use gestalt::source::{ConfigSource, MapSource, MAP_NODE_FORMAT};
use gestalt::tag::Tags;
use gestalt::{Gestalt, GestaltError};
use uuid::Uuid;

/// A map source whose entries can be swapped out between reloads.
#[derive(Clone)]
struct SharedSource {
    id: Uuid,
    entries: Arc<Mutex<Vec<(String, String)>>>,
}

impl SharedSource {
    fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            id: Uuid::new_v4(),
            entries: Arc::new(Mutex::new(
                entries
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
            )),
        }
    }

    fn replace(&self, entries: &[(&str, &str)]) {
        *self.entries.lock().unwrap() = entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
    }
}

impl ConfigSource for SharedSource {
    fn name(&self) -> String {
        "shared".into()
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn format(&self) -> String {
        MAP_NODE_FORMAT.into()
    }

    fn has_list(&self) -> bool {
        true
    }

    fn load_list(&self) -> Result<Vec<(String, String)>, GestaltError> {
        Ok(self.entries.lock().unwrap().clone())
    }
}

struct CountingListener {
    count: AtomicUsize,
}

impl CoreReloadListener for CountingListener {
    fn on_core_reload(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn reload_source_republishes_and_invalidates_the_cache() {
    let source = SharedSource::new(&[("db.port", "1")]);
    let handle = source.clone();
    let gestalt = GestaltBuilder::new()
        .add_source(source)
        .build()
        .unwrap();
    gestalt.load_configs().unwrap();

    // Prime the cache.
    assert_eq!(gestalt.get_config::<i64>("db.port").unwrap(), 1);
    assert_eq!(gestalt.get_config::<i64>("db.port").unwrap(), 1);
    let generation_before = gestalt.generation();

    handle.replace(&[("db.port", "2")]);
    gestalt.reload_source(handle.id()).unwrap();

    assert!(gestalt.generation() > generation_before);
    assert_eq!(gestalt.get_config::<i64>("db.port").unwrap(), 2);
}

#[test]
fn reloading_an_early_source_keeps_later_overrides() {
    let early = SharedSource::new(&[("db.port", "1"), ("db.name", "app")]);
    let handle = early.clone();
    let gestalt = GestaltBuilder::new()
        .add_source(early)
        .add_source(MapSource::new("late", [("db.port", "2")]))
        .build()
        .unwrap();
    gestalt.load_configs().unwrap();
    assert_eq!(gestalt.get_config::<i64>("db.port").unwrap(), 2);

    handle.replace(&[("db.port", "9"), ("db.name", "renamed")]);
    gestalt.reload_source(handle.id()).unwrap();

    // The later source still wins the overlapping key.
    assert_eq!(gestalt.get_config::<i64>("db.port").unwrap(), 2);
    assert_eq!(gestalt.get_config::<String>("db.name").unwrap(), "renamed");
}

#[test]
fn listeners_hear_every_generation_build() {
    let listener = Arc::new(CountingListener {
        count: AtomicUsize::new(0),
    });
    let source = SharedSource::new(&[("a", "1")]);
    let handle = source.clone();
    let gestalt = GestaltBuilder::new()
        .add_source(source)
        .add_core_reload_listener(listener.clone())
        .build()
        .unwrap();

    gestalt.load_configs().unwrap();
    assert_eq!(listener.count.load(Ordering::SeqCst), 1);

    gestalt.reload_source(handle.id()).unwrap();
    assert_eq!(listener.count.load(Ordering::SeqCst), 2);
}

#[test]
fn cached_reads_match_fresh_reads() {
    let gestalt = GestaltBuilder::new()
        .add_source(MapSource::new("m", [("db.port", "5432")]))
        .build()
        .unwrap();
    gestalt.load_configs().unwrap();

    let first: u16 = gestalt.get_config("db.port").unwrap();
    let cached: u16 = gestalt.get_config("db.port").unwrap();
    let uncached: u16 = gestalt.core().get_config("db.port").unwrap();
    assert_eq!(first, cached);
    assert_eq!(first, uncached);
}

#[test]
fn tags_namespace_reads() {
    let gestalt = GestaltBuilder::new()
        .add_source(MapSource::new("m", [("db.port", "5432")]))
        .build()
        .unwrap();
    gestalt.load_configs().unwrap();

    let untagged: u16 = gestalt.get_config("db.port").unwrap();
    let tagged: u16 = gestalt
        .get_config_with_tags("db.port", &Tags::environment("dev"))
        .unwrap();
    assert_eq!(untagged, tagged);
}

#[test]
fn cache_can_be_disabled() {
    let gestalt = GestaltBuilder::new()
        .add_source(MapSource::new("m", [("db.port", "5432")]))
        .use_cache_decorator(false)
        .build()
        .unwrap();
    gestalt.load_configs().unwrap();
    assert_eq!(gestalt.get_config::<u16>("db.port").unwrap(), 5432);
    assert_eq!(gestalt.get_config::<u16>("db.port").unwrap(), 5432);
}

fn secret_gestalt(access_count: usize) -> Gestalt {
    let gestalt = GestaltBuilder::new()
        .add_source(MapSource::new(
            "m",
            [("db.password", "hunter2"), ("db.port", "5432")],
        ))
        .add_temporary_secret(SecretChecker::new(["password"]).unwrap(), access_count)
        .build()
        .unwrap();
    gestalt.load_configs().unwrap();
    gestalt
}

#[test]
fn temporary_secrets_expire_after_their_budget() {
    let gestalt = secret_gestalt(2);

    assert_eq!(
        gestalt.get_config_optional::<String>("db.password").unwrap(),
        Some("hunter2".into())
    );
    assert_eq!(
        gestalt.get_config_optional::<String>("db.password").unwrap(),
        Some("hunter2".into())
    );
    // Budget spent: the plain text is gone for good.
    assert_eq!(
        gestalt.get_config_optional::<String>("db.password").unwrap(),
        None
    );

    // Non-secret values are unaffected by the wrapping.
    assert_eq!(gestalt.get_config::<u16>("db.port").unwrap(), 5432);
}

#[test]
fn secret_reads_bypass_the_cache() {
    // With the cache in play a memoized secret would never expire; the
    // secret metadata must keep it out of the cache entirely.
    let gestalt = secret_gestalt(1);
    assert_eq!(
        gestalt.get_config_optional::<String>("db.password").unwrap(),
        Some("hunter2".into())
    );
    assert_eq!(
        gestalt.get_config_optional::<String>("db.password").unwrap(),
        None
    );
}

#[test]
fn required_reads_of_expired_secrets_fail() {
    let gestalt = secret_gestalt(1);
    assert_eq!(
        gestalt.get_config::<String>("db.password").unwrap(),
        "hunter2"
    );
    assert!(gestalt.get_config::<String>("db.password").is_err());
}
