//! Integration Tests for the Cache Registry
//!
//! Drives caches built by a registry over shared in-memory stores, plus a
//! store wrapper that injects failures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use doc_cache::keyspace::{namespace_view, CACHE_DESIGN_DOCUMENT, CACHE_VIEW};
use doc_cache::store::{DesignDocument, Document, StoreResult, ViewQuery, ViewRow};
use doc_cache::{
    spawn_expiry_sweeper, Cache, CacheError, CacheExt, CacheRegistry, DocumentStore, MemoryStore,
    RegistryConfig, StoreError,
};
use serde::{Deserialize, Serialize};

// == Helper Functions ==

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "doc_cache=debug".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

fn shared(names: &[&str], store: Arc<dyn DocumentStore>) -> HashMap<String, Arc<dyn DocumentStore>> {
    names
        .iter()
        .map(|name| (name.to_string(), Arc::clone(&store)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Session {
    user: String,
    roles: Vec<String>,
}

/// Store wrapper failing selected operations.
#[derive(Debug, Default)]
struct FaultyStore {
    inner: MemoryStore,
    fail_probe: AtomicBool,
    fail_design_upsert: AtomicBool,
    unavailable: AtomicBool,
}

impl FaultyStore {
    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("node down".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FaultyStore {
    async fn get(&self, id: &str) -> StoreResult<Option<Document>> {
        self.check_available()?;
        self.inner.get(id).await
    }

    async fn upsert(&self, document: Document) -> StoreResult<()> {
        self.check_available()?;
        self.inner.upsert(document).await
    }

    async fn remove(&self, id: &str) -> StoreResult<bool> {
        self.check_available()?;
        self.inner.remove(id).await
    }

    async fn flush(&self) -> StoreResult<()> {
        self.check_available()?;
        self.inner.flush().await
    }

    async fn query_view(&self, query: &ViewQuery) -> StoreResult<Vec<ViewRow>> {
        self.check_available()?;
        self.inner.query_view(query).await
    }

    async fn get_design_document(&self, name: &str) -> StoreResult<Option<DesignDocument>> {
        if self.fail_probe.load(Ordering::SeqCst) {
            return Err(StoreError::Timeout("design document read".to_string()));
        }
        self.inner.get_design_document(name).await
    }

    async fn upsert_design_document(&self, design: DesignDocument) -> StoreResult<()> {
        if self.fail_design_upsert.load(Ordering::SeqCst) {
            return Err(StoreError::Internal("design document rejected".to_string()));
        }
        self.inner.upsert_design_document(design).await
    }
}

// == Registry Tests ==

#[tokio::test]
async fn test_typed_values_round_trip_through_registry() {
    init_tracing();
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let registry = CacheRegistry::new(shared(&["sessions"], store));
    let sessions = registry.cache("sessions").await.unwrap().unwrap();

    let session = Session {
        user: "ada".to_string(),
        roles: vec!["admin".to_string()],
    };
    sessions.put("abc", &session).await.unwrap();

    assert_eq!(sessions.get_as::<Session>("abc").await.unwrap(), Some(session));
}

#[tokio::test]
async fn test_caches_usable_as_trait_objects() {
    init_tracing();
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let registry = CacheRegistry::new(shared(&["a", "b"], store));

    let caches: Vec<Arc<dyn Cache>> = registry
        .caches()
        .await
        .unwrap()
        .values()
        .map(|cache| Arc::clone(cache) as Arc<dyn Cache>)
        .collect();

    for cache in &caches {
        cache.put("k", cache.name()).await.unwrap();
    }
    for cache in &caches {
        assert_eq!(
            cache.get_as::<String>("k").await.unwrap().as_deref(),
            Some(cache.name())
        );
    }
}

#[tokio::test]
async fn test_scoped_clear_across_registry() {
    init_tracing();
    let memory = Arc::new(MemoryStore::new());
    let store: Arc<dyn DocumentStore> = memory.clone();
    let registry = CacheRegistry::new(shared(&["users", "orders"], store));

    let users = registry.cache("users").await.unwrap().unwrap();
    let orders = registry.cache("orders").await.unwrap().unwrap();
    for key in ["1", "2", "3"] {
        users.put(key, key).await.unwrap();
        orders.put(key, key).await.unwrap();
    }

    users.clear().await.unwrap();

    for key in ["1", "2", "3"] {
        assert!(users.get_raw(key).await.unwrap().is_none());
        assert!(orders.get_raw(key).await.unwrap().is_some());
    }
    assert_eq!(memory.len().await, 3);
}

#[tokio::test]
async fn test_always_flush_from_config_wipes_other_namespaces() {
    init_tracing();
    let memory = Arc::new(MemoryStore::new());
    let store: Arc<dyn DocumentStore> = memory.clone();
    let config: RegistryConfig =
        serde_json::from_str(r#"{"always_flush": ["scratch"]}"#).unwrap();
    let registry = CacheRegistry::with_config(shared(&["scratch", "users"], store), config);

    let scratch = registry.cache("scratch").await.unwrap().unwrap();
    let users = registry.cache("users").await.unwrap().unwrap();
    scratch.put("tmp", "x").await.unwrap();
    users.put("1", "ada").await.unwrap();

    scratch.clear().await.unwrap();

    assert!(users.get_raw("1").await.unwrap().is_none());
    assert!(memory.is_empty().await);
}

#[tokio::test]
async fn test_always_flush_from_config_can_switch_to_scoped_clear() {
    init_tracing();
    let memory = Arc::new(MemoryStore::new());
    let store: Arc<dyn DocumentStore> = memory.clone();
    let config: RegistryConfig =
        serde_json::from_str(r#"{"always_flush": ["scratch"]}"#).unwrap();
    let registry = CacheRegistry::with_config(shared(&["scratch", "users"], store), config);

    let scratch = registry.cache("scratch").await.unwrap().unwrap();
    let users = registry.cache("users").await.unwrap().unwrap();
    scratch.put("k", "v").await.unwrap();
    users.put("1", "ada").await.unwrap();

    scratch.set_always_flush(false);
    scratch.clear().await.unwrap();

    assert!(scratch.get_raw("k").await.unwrap().is_none());
    assert_eq!(
        users.get_as::<String>("1").await.unwrap().as_deref(),
        Some("ada")
    );
    assert_eq!(memory.stats().await.flushes, 0);
}

#[tokio::test]
async fn test_ttl_from_registry_expires_entries() {
    init_tracing();
    let memory = Arc::new(MemoryStore::new());
    let store: Arc<dyn DocumentStore> = memory.clone();
    let ttls = HashMap::from([("short".to_string(), 1)]);
    let registry = CacheRegistry::with_ttls(shared(&["short", "long"], store), ttls);

    let short = registry.cache("short").await.unwrap().unwrap();
    let long = registry.cache("long").await.unwrap().unwrap();
    short.put("k", "v").await.unwrap();
    long.put("k", "v").await.unwrap();

    let sweeper = spawn_expiry_sweeper(memory.clone(), Duration::from_millis(250));
    tokio::time::sleep(Duration::from_millis(1600)).await;
    sweeper.abort();

    assert!(short.get_raw("k").await.unwrap().is_none());
    assert!(long.get_raw("k").await.unwrap().is_some());
    assert_eq!(memory.len().await, 1);
}

#[tokio::test]
async fn test_registry_stores_are_exposed() {
    let first: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let second: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let stores = HashMap::from([
        ("a".to_string(), Arc::clone(&first)),
        ("b".to_string(), Arc::clone(&second)),
    ]);
    let registry = CacheRegistry::new(stores);

    assert!(Arc::ptr_eq(&registry.stores()["a"], &first));
    assert!(Arc::ptr_eq(&registry.stores()["b"], &second));

    let a = registry.cache("a").await.unwrap().unwrap();
    assert!(Arc::ptr_eq(a.native_store(), &first));
}

// == Failure Handling Tests ==

#[tokio::test]
async fn test_design_document_probe_failure_is_ignored() {
    init_tracing();
    let faulty = Arc::new(FaultyStore::default());
    faulty.fail_probe.store(true, Ordering::SeqCst);
    let store: Arc<dyn DocumentStore> = faulty.clone();
    let registry = CacheRegistry::new(shared(&["users"], store));

    let users = registry.cache("users").await.unwrap().unwrap();

    let design = faulty
        .inner
        .get_design_document(CACHE_DESIGN_DOCUMENT)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(design.views, vec![namespace_view()]);

    users.put("1", "ada").await.unwrap();
    users.clear().await.unwrap();
    assert!(faulty.inner.is_empty().await);
}

#[tokio::test]
async fn test_design_document_upsert_failure_propagates() {
    init_tracing();
    let faulty = Arc::new(FaultyStore::default());
    faulty.fail_design_upsert.store(true, Ordering::SeqCst);
    let store: Arc<dyn DocumentStore> = faulty.clone();
    let registry = CacheRegistry::new(shared(&["users"], store));

    let result = registry.caches().await;
    assert!(matches!(
        result,
        Err(CacheError::Store(StoreError::Internal(_)))
    ));

    faulty.fail_design_upsert.store(false, Ordering::SeqCst);
    assert_eq!(registry.cache_names().await.unwrap(), vec!["users"]);
}

#[tokio::test]
async fn test_store_errors_propagate_unchanged() {
    init_tracing();
    let faulty = Arc::new(FaultyStore::default());
    let store: Arc<dyn DocumentStore> = faulty.clone();
    let registry = CacheRegistry::new(shared(&["users"], store));
    let users = registry.cache("users").await.unwrap().unwrap();

    faulty.unavailable.store(true, Ordering::SeqCst);

    let unavailable = |result: doc_cache::Result<_>| {
        matches!(result, Err(CacheError::Store(StoreError::Unavailable(_))))
    };
    assert!(unavailable(users.get_raw("1").await.map(|_| ())));
    assert!(unavailable(users.put("1", "ada").await));
    assert!(unavailable(users.evict("1").await));
    assert!(unavailable(users.clear().await));
}

#[tokio::test]
async fn test_flush_failure_is_swallowed() {
    init_tracing();
    let faulty = Arc::new(FaultyStore::default());
    let store: Arc<dyn DocumentStore> = faulty.clone();
    let registry = CacheRegistry::new(shared(&["users"], store));
    let users = registry.cache("users").await.unwrap().unwrap();
    users.set_always_flush(true);

    faulty.unavailable.store(true, Ordering::SeqCst);

    users.clear().await.unwrap();
}

#[tokio::test]
async fn test_unserializable_value_is_rejected() {
    use serde::ser::Error as _;

    struct Handle;

    impl Serialize for Handle {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("handles are not serializable"))
        }
    }

    let memory = Arc::new(MemoryStore::new());
    let store: Arc<dyn DocumentStore> = memory.clone();
    let registry = CacheRegistry::new(shared(&["users"], store));
    let users = registry.cache("users").await.unwrap().unwrap();

    let result = users.put("1", &Handle).await;

    assert!(matches!(result, Err(CacheError::InvalidValue(_))));
    assert!(memory.is_empty().await);
    assert_eq!(memory.stats().await.upserts, 0);
}

#[tokio::test]
async fn test_view_name_check_ignores_existing_map_function() {
    init_tracing();
    let memory = Arc::new(MemoryStore::new());
    let custom = doc_cache::store::View::new(CACHE_VIEW, "function (doc, meta) { emit(meta.id); }");
    memory
        .upsert_design_document(DesignDocument::new(CACHE_DESIGN_DOCUMENT, vec![custom.clone()]))
        .await
        .unwrap();
    let store: Arc<dyn DocumentStore> = memory.clone();
    let registry = CacheRegistry::new(shared(&["users"], store));

    registry.caches().await.unwrap();

    let design = memory
        .get_design_document(CACHE_DESIGN_DOCUMENT)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(design.views, vec![custom]);
}
