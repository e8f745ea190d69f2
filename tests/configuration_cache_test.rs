// ============================================================================
// Configuration Cache Tests
// ============================================================================

use exposure_server::{ConfigurationCache, ConfigurationUnavailable};
use std::sync::Arc;
use std::time::Duration;

use test_utils::*;

#[tokio::test]
async fn test_returns_highest_version() {
    let store = Arc::new(MemoryConfigStore::new(vec![configuration(1), configuration(2)]));
    let cache = ConfigurationCache::new(store.clone());

    let config = cache.get_latest().await.unwrap();
    assert_eq!(config.version, 2);
}

#[tokio::test]
async fn test_filled_cache_does_not_refetch() {
    let store = Arc::new(MemoryConfigStore::new(vec![configuration(3)]));
    let cache = ConfigurationCache::new(store.clone());

    let first = cache.get_latest().await.unwrap();
    let second = cache.get_latest().await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(store.fetches(), 1);
}

#[tokio::test]
async fn test_concurrent_misses_share_one_fetch() {
    let store = Arc::new(MemoryConfigStore::gated(vec![configuration(5)]));
    let cache = Arc::new(ConfigurationCache::new(store.clone()));

    let callers: Vec<_> = (0..16)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_latest().await })
        })
        .collect();

    // Let every caller reach the pending fetch before it completes
    tokio::time::sleep(Duration::from_millis(50)).await;
    store.release();

    for caller in callers {
        assert_eq!(caller.await.unwrap().unwrap().version, 5);
    }
    assert_eq!(store.fetches(), 1);
}

#[tokio::test]
async fn test_concurrent_callers_share_the_failure() {
    let store = Arc::new(MemoryConfigStore::gated(vec![configuration(5)]));
    store.fail_next("connection reset");
    let cache = Arc::new(ConfigurationCache::new(store.clone()));

    let callers: Vec<_> = (0..4)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_latest().await })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(50)).await;
    store.release();

    for caller in callers {
        assert!(matches!(
            caller.await.unwrap(),
            Err(ConfigurationUnavailable::Store(_))
        ));
    }
    assert_eq!(store.fetches(), 1);
}

#[tokio::test]
async fn test_missing_configuration_is_unavailable() {
    let store = Arc::new(MemoryConfigStore::new(vec![]));
    let cache = ConfigurationCache::new(store.clone());

    assert_eq!(
        cache.get_latest().await.unwrap_err(),
        ConfigurationUnavailable::NoConfiguration
    );
}

#[tokio::test]
async fn test_failure_is_not_cached() {
    let store = Arc::new(MemoryConfigStore::new(vec![]));
    let cache = ConfigurationCache::new(store.clone());

    assert!(cache.get_latest().await.is_err());
    assert!(cache.get_latest().await.is_err());
    assert_eq!(store.fetches(), 2);

    store.publish(configuration(1));
    assert_eq!(cache.get_latest().await.unwrap().version, 1);
    assert_eq!(store.fetches(), 3);
}

#[tokio::test]
async fn test_invalidate_forces_refetch() {
    let store = Arc::new(MemoryConfigStore::new(vec![configuration(1)]));
    let cache = ConfigurationCache::new(store.clone());

    assert_eq!(cache.get_latest().await.unwrap().version, 1);

    store.publish(configuration(2));
    assert_eq!(cache.get_latest().await.unwrap().version, 1);

    cache.invalidate();
    assert_eq!(cache.get_latest().await.unwrap().version, 2);
    assert_eq!(store.fetches(), 2);
}

#[tokio::test]
async fn test_fetch_detached_by_invalidate_does_not_repopulate() {
    let store = Arc::new(MemoryConfigStore::gated(vec![configuration(1)]));
    let cache = Arc::new(ConfigurationCache::new(store.clone()));

    let stale = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.get_latest().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    cache.invalidate();
    store.release();
    assert_eq!(stale.await.unwrap().unwrap().version, 1);

    // The detached result was not kept: the next read fetches again
    store.publish(configuration(2));
    let fresh = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.get_latest().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    store.release();

    assert_eq!(fresh.await.unwrap().unwrap().version, 2);
    assert_eq!(store.fetches(), 2);
}
