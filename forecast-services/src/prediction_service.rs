//! Prediction Service
//!
//! Cache-aside in front of the model: a cache hit is returned as-is, and
//! concurrent misses coalesce into a single inference call whose result is
//! written back to the cache. Inference itself runs on the blocking pool,
//! serialized process-wide.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use forecast_core::{ForecastError, ForecastResult, PredictionTriple, PredictionVector};
use forecast_model::{FeatureSource, Predictor};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::single_flight::SingleFlight;
use crate::ttl_cache::CacheStore;

/// Cache key for the model's output
pub const PREDICTIONS_KEY: &str = "predictions";

/// How long a prediction stays fresh
pub const DEFAULT_PREDICTION_TTL: Duration = Duration::from_secs(60);

struct Inner {
    cache: Arc<dyn CacheStore>,
    predictor: Arc<dyn Predictor>,
    features: Arc<dyn FeatureSource>,
    /// The predictor is not assumed to be safe for concurrent use
    inference_lock: Arc<Mutex<()>>,
    flights: SingleFlight<PredictionVector>,
    ttl: Duration,
    inference_count: AtomicU64,
}

/// Serves model predictions through the cache
#[derive(Clone)]
pub struct PredictionService {
    inner: Arc<Inner>,
}

impl PredictionService {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        predictor: Arc<dyn Predictor>,
        features: Arc<dyn FeatureSource>,
        ttl: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache,
                predictor,
                features,
                inference_lock: Arc::new(Mutex::new(())),
                flights: SingleFlight::new(),
                ttl,
                inference_count: AtomicU64::new(0),
            }),
        }
    }

    /// Current prediction vector, from cache when fresh
    pub async fn get_predictions(&self) -> ForecastResult<PredictionVector> {
        if let Some(vector) = self.inner.cached().await {
            debug!("Fetched predictions from cache");
            return Ok(vector);
        }

        let inner = Arc::clone(&self.inner);
        self.inner
            .flights
            .run(PREDICTIONS_KEY, move || async move { inner.refresh().await })
            .await
    }

    /// Next hour/day/week forecast derived from the current vector
    pub async fn get_triple(&self) -> ForecastResult<PredictionTriple> {
        Ok(self.get_predictions().await?.triple())
    }

    /// Width of the model's input row
    pub fn model_input_dim(&self) -> usize {
        self.inner.predictor.input_dim()
    }

    /// Total inference calls made by this service
    pub fn inference_count(&self) -> u64 {
        self.inner.inference_count.load(Ordering::Relaxed)
    }
}

impl Inner {
    /// Read the cache, treating any backend failure as a miss
    async fn cached(&self) -> Option<PredictionVector> {
        match self.cache.get(PREDICTIONS_KEY).await {
            Ok(Some(bytes)) => match PredictionVector::from_bytes(&bytes) {
                Ok(vector) => Some(vector),
                Err(e) => {
                    warn!("Discarding unreadable cached predictions: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Cache unavailable, falling through to inference: {}", e);
                None
            }
        }
    }

    /// Leader path of a miss: infer and repopulate the cache
    async fn refresh(&self) -> ForecastResult<PredictionVector> {
        // A previous flight may have filled the cache after our caller's miss
        if let Some(vector) = self.cached().await {
            return Ok(vector);
        }

        let vector = self.infer().await?;

        if let Err(e) = self.cache.set(PREDICTIONS_KEY, vector.to_bytes(), self.ttl).await {
            warn!("Failed to cache predictions: {}", e);
        } else {
            info!("Generated new predictions and cached them");
        }

        Ok(vector)
    }

    async fn infer(&self) -> ForecastResult<PredictionVector> {
        let predictor = Arc::clone(&self.predictor);
        let features = Arc::clone(&self.features);
        let lock = Arc::clone(&self.inference_lock);
        self.inference_count.fetch_add(1, Ordering::Relaxed);

        tokio::task::spawn_blocking(move || {
            let _guard = lock.lock();
            let input = features.features()?;
            predictor.predict(&input)
        })
        .await
        .map_err(|e| ForecastError::internal(format!("inference task failed: {}", e)))?
        .map_err(ForecastError::from)
    }
}
