//! Cache-aside and single-flight behaviour of the prediction service.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use forecast_core::{ForecastError, PredictionVector};
use forecast_model::{
    Activation, Architecture, DenseModel, InferenceError, LayerSpec, Predictor, StaticFeatures,
};
use forecast_services::{
    CacheError, CacheStore, MemoryCache, PredictionService, DEFAULT_PREDICTION_TTL, PREDICTIONS_KEY,
};

/// Predictor that counts calls and can be made slow or broken
struct CountingPredictor {
    calls: AtomicUsize,
    output: Vec<f32>,
    delay: Duration,
    fail: bool,
}

impl CountingPredictor {
    fn new(output: Vec<f32>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            output,
            delay: Duration::ZERO,
            fail: false,
        }
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Predictor for CountingPredictor {
    fn input_dim(&self) -> usize {
        4
    }

    fn predict(&self, input: &[f32]) -> Result<PredictionVector, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(input.len(), 4);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.fail {
            return Err(InferenceError::Backend("weights corrupted".to_string()));
        }
        Ok(PredictionVector::new(self.output.clone()).unwrap())
    }
}

/// Cache backend that is always down
struct UnreachableCache {
    attempts: AtomicUsize,
}

#[async_trait]
impl CacheStore for UnreachableCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _payload: Vec<u8>, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn invalidate(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }
}

fn service(cache: Arc<dyn CacheStore>, predictor: Arc<CountingPredictor>) -> PredictionService {
    PredictionService::new(
        cache,
        predictor,
        Arc::new(StaticFeatures::zeros(4)),
        DEFAULT_PREDICTION_TTL,
    )
}

#[tokio::test]
async fn test_hits_within_ttl_skip_inference() {
    let cache = Arc::new(MemoryCache::new());
    let predictor = Arc::new(CountingPredictor::new(vec![0.125, 0.5, 0.75]));
    let service = service(cache.clone(), predictor.clone());

    let first = service.get_predictions().await.unwrap();
    let stored = cache.get(PREDICTIONS_KEY).await.unwrap().expect("miss should populate cache");
    assert_eq!(stored, first.to_bytes());

    for _ in 0..5 {
        let again = service.get_predictions().await.unwrap();
        assert_eq!(again.to_bytes(), stored);
    }

    assert_eq!(predictor.calls(), 1);
    assert_eq!(service.inference_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_expiry_triggers_exactly_one_reinference() {
    let cache = Arc::new(MemoryCache::new());
    let predictor = Arc::new(CountingPredictor::new(vec![2.0]));
    let service = service(cache.clone(), predictor.clone());

    service.get_predictions().await.unwrap();
    tokio::time::advance(Duration::from_secs(59)).await;
    service.get_predictions().await.unwrap();
    assert_eq!(predictor.calls(), 1);

    tokio::time::advance(Duration::from_secs(2)).await;
    service.get_predictions().await.unwrap();
    service.get_predictions().await.unwrap();
    assert_eq!(predictor.calls(), 2);
    assert!(cache.get(PREDICTIONS_KEY).await.unwrap().is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_misses_coalesce() {
    let cache = Arc::new(MemoryCache::new());
    let predictor = Arc::new(CountingPredictor::new(vec![3.5, 1.0]).slow(Duration::from_millis(100)));
    let service = service(cache, predictor.clone());

    let mut handles = Vec::new();
    for _ in 0..32 {
        let service = service.clone();
        handles.push(tokio::spawn(async move { service.get_predictions().await }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().expect("every caller should succeed"));
    }

    assert_eq!(predictor.calls(), 1);
    assert!(results.iter().all(|r| r == &results[0]));
    assert_eq!(results[0].values(), &[3.5, 1.0]);
}

#[tokio::test]
async fn test_triple_is_scaled_from_first_element() {
    let predictor = Arc::new(CountingPredictor::new(vec![0.3, 99.0]));
    let service = service(Arc::new(MemoryCache::new()), predictor);

    let triple = service.get_triple().await.unwrap();
    assert_eq!(triple.next_hour, 0.3f32 as f64);
    assert_eq!(triple.next_day, triple.next_hour * 24.0);
    assert_eq!(triple.next_week, triple.next_hour * 168.0);
}

#[tokio::test]
async fn test_cache_outage_falls_through_to_inference() {
    let cache = Arc::new(UnreachableCache {
        attempts: AtomicUsize::new(0),
    });
    let predictor = Arc::new(CountingPredictor::new(vec![1.0]));
    let service = service(cache.clone(), predictor.clone());

    for _ in 0..3 {
        let vector = service.get_predictions().await.expect("outage must not reach the caller");
        assert_eq!(vector.values(), &[1.0]);
    }

    assert_eq!(predictor.calls(), 3);
    assert!(cache.attempts.load(Ordering::SeqCst) >= 3);
}

#[tokio::test]
async fn test_inference_failure_is_not_cached() {
    let cache = Arc::new(MemoryCache::new());
    let predictor = Arc::new(CountingPredictor::new(vec![1.0]).failing());
    let service = service(cache.clone(), predictor.clone());

    let err = service.get_predictions().await.unwrap_err();
    assert!(matches!(err, ForecastError::Inference(_)));
    assert!(cache.get(PREDICTIONS_KEY).await.unwrap().is_none());

    service.get_predictions().await.unwrap_err();
    assert_eq!(predictor.calls(), 2);
}

#[tokio::test]
async fn test_feature_width_mismatch_surfaces_as_inference_error() {
    let service = PredictionService::new(
        Arc::new(MemoryCache::new()),
        Arc::new(
            DenseModel::from_parts(
                Architecture {
                    input_dim: 2,
                    layers: vec![LayerSpec {
                        units: 1,
                        activation: Activation::Linear,
                    }],
                },
                vec![1.0, 1.0, 0.0],
            )
            .unwrap(),
        ),
        Arc::new(StaticFeatures::zeros(3)),
        DEFAULT_PREDICTION_TTL,
    );

    let err = service.get_predictions().await.unwrap_err();
    assert!(matches!(err, ForecastError::Inference(_)));
    assert!(err.to_string().contains("expected 2 features, got 3"));
}
