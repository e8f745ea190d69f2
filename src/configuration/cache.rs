// ============================================================================
// Configuration Cache
// ============================================================================
//
// Read-through cache over the latest published exposure configuration.
//
// - Filled reads return the cached `Arc` without touching the store.
// - Concurrent misses join one shared in-flight fetch, so the store sees a
//   single query no matter how many callers are waiting.
// - Failures are handed to every joined caller and then forgotten; the next
//   call fetches again.
// - `invalidate()` drops the entry. A fetch that was already running when
//   the cache was invalidated still answers its callers but does not
//   repopulate the cache.
//
// ============================================================================

use exposure_metrics::CONFIG_STORE_FETCHES_TOTAL;
use exposure_types::ExposureConfiguration;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use super::store::ConfigStore;
use crate::error::ConfigurationUnavailable;

type FetchResult = Result<Arc<ExposureConfiguration>, ConfigurationUnavailable>;
type PendingFetch = Shared<BoxFuture<'static, FetchResult>>;

#[derive(Default)]
struct Inflight {
    /// Bumped by every invalidation
    epoch: u64,
    next_id: u64,
    pending: Option<(u64, PendingFetch)>,
}

enum Join {
    Ready(Arc<ExposureConfiguration>),
    Pending {
        id: u64,
        epoch: u64,
        fetch: PendingFetch,
    },
}

pub struct ConfigurationCache {
    store: Arc<dyn ConfigStore>,
    current: RwLock<Option<Arc<ExposureConfiguration>>>,
    inflight: Mutex<Inflight>,
}

impl ConfigurationCache {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self {
            store,
            current: RwLock::new(None),
            inflight: Mutex::new(Inflight::default()),
        }
    }

    /// The latest configuration, loading it from the store on a miss
    pub async fn get_latest(&self) -> Result<Arc<ExposureConfiguration>, ConfigurationUnavailable> {
        if let Some(config) = self.cached() {
            return Ok(config);
        }

        match self.join_or_start() {
            Join::Ready(config) => Ok(config),
            Join::Pending { id, epoch, fetch } => {
                let result = fetch.await;
                self.complete(id, epoch, &result);
                result
            }
        }
    }

    /// Drop the cached entry; the next read goes to the store
    pub fn invalidate(&self) {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        inflight.epoch += 1;
        inflight.pending = None;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;

        tracing::info!("Exposure configuration cache invalidated");
    }

    fn cached(&self) -> Option<Arc<ExposureConfiguration>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn join_or_start(&self) -> Join {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);

        // Filled while this caller waited for the lock
        if let Some(config) = self.cached() {
            return Join::Ready(config);
        }

        if let Some((id, fetch)) = &inflight.pending {
            return Join::Pending {
                id: *id,
                epoch: inflight.epoch,
                fetch: fetch.clone(),
            };
        }

        let id = inflight.next_id;
        inflight.next_id += 1;
        let fetch = Self::fetch(Arc::clone(&self.store));
        inflight.pending = Some((id, fetch.clone()));

        Join::Pending {
            id,
            epoch: inflight.epoch,
            fetch,
        }
    }

    fn complete(&self, id: u64, epoch: u64, result: &FetchResult) {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);

        if matches!(&inflight.pending, Some((pending_id, _)) if *pending_id == id) {
            inflight.pending = None;
        }

        if let Ok(config) = result {
            if inflight.epoch == epoch {
                *self.current.write().unwrap_or_else(PoisonError::into_inner) =
                    Some(Arc::clone(config));
            }
        }
    }

    fn fetch(store: Arc<dyn ConfigStore>) -> PendingFetch {
        async move {
            match store.fetch_latest().await {
                Ok(Some(config)) => {
                    CONFIG_STORE_FETCHES_TOTAL.with_label_values(&["ok"]).inc();
                    if let Err(e) = config.validate() {
                        tracing::warn!(
                            version = config.version,
                            error = %e,
                            "Published exposure configuration has an unexpected shape"
                        );
                    }
                    tracing::info!(version = config.version, "Loaded exposure configuration");
                    Ok(Arc::new(config))
                }
                Ok(None) => {
                    CONFIG_STORE_FETCHES_TOTAL
                        .with_label_values(&["no_rows"])
                        .inc();
                    tracing::error!("No exposure configuration has been published");
                    Err(ConfigurationUnavailable::NoConfiguration)
                }
                Err(e) => {
                    CONFIG_STORE_FETCHES_TOTAL
                        .with_label_values(&["error"])
                        .inc();
                    tracing::error!(error = %e, "Failed to load exposure configuration");
                    Err(ConfigurationUnavailable::Store(e.to_string()))
                }
            }
        }
        .boxed()
        .shared()
    }
}
