//! Chat enrichment: trigger detection, summary layout and failure policy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use forecast_core::{ForecastError, ForecastMap, ForecastResult, NewsQuery, PredictionTriple, PredictionVector};
use forecast_model::{InferenceError, Predictor, StaticFeatures};
use forecast_services::{
    ChatAggregator, EnrichmentPolicy, ForecastSource, LocalForecasts, MemoryCache, PredictionService,
    DEFAULT_PREDICTION_TTL,
};
use forecast_upstream::{Completion, NewsFeed, PriceFeed, UpstreamError};
use serde_json::{json, Value};

#[derive(Default)]
struct Calls(AtomicUsize);

impl Calls {
    fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

struct FakeCompletion {
    calls: Calls,
    fail: bool,
}

#[async_trait]
impl Completion for FakeCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, UpstreamError> {
        self.calls.hit();
        if self.fail {
            return Err(UpstreamError::RequestFailed("OpenAI API error: model overloaded".to_string()));
        }
        Ok(format!("echo: {}", prompt))
    }
}

struct FakeForecasts {
    calls: Calls,
    forecasts: ForecastMap,
}

#[async_trait]
impl ForecastSource for FakeForecasts {
    async fn forecasts(&self) -> ForecastResult<Option<ForecastMap>> {
        self.calls.hit();
        Ok(Some(self.forecasts.clone()))
    }
}

struct FakePrices {
    calls: Calls,
    payload: Option<Value>,
}

#[async_trait]
impl PriceFeed for FakePrices {
    async fn fetch_prices(&self) -> Result<Option<Value>, UpstreamError> {
        self.calls.hit();
        Ok(self.payload.clone())
    }
}

struct FakeNews {
    calls: Calls,
    fail: bool,
}

#[async_trait]
impl NewsFeed for FakeNews {
    async fn fetch_news(&self, query: &NewsQuery) -> Result<Option<Value>, UpstreamError> {
        self.calls.hit();
        assert_eq!(query, &NewsQuery::default());
        if self.fail {
            return Err(UpstreamError::RequestFailed("connection reset".to_string()));
        }
        Ok(Some(json!({
            "data": [
                {"title": "ETF inflows hit record", "url": "https://news.example/etf"},
                {"title": "Exchange outage resolved", "url": "https://news.example/outage"},
                {"title": "Miners sell reserves", "url": "https://news.example/miners"}
            ]
        })))
    }
}

struct Harness {
    completion: Arc<FakeCompletion>,
    forecasts: Arc<FakeForecasts>,
    prices: Arc<FakePrices>,
    news: Arc<FakeNews>,
}

impl Harness {
    fn new() -> Self {
        let mut forecasts = ForecastMap::new();
        forecasts.insert("ETH".to_string(), PredictionTriple::from_next_hour(2.0));
        forecasts.insert("BTC".to_string(), PredictionTriple::from_next_hour(1.25));

        Self {
            completion: Arc::new(FakeCompletion {
                calls: Calls::default(),
                fail: false,
            }),
            forecasts: Arc::new(FakeForecasts {
                calls: Calls::default(),
                forecasts,
            }),
            prices: Arc::new(FakePrices {
                calls: Calls::default(),
                payload: Some(json!({
                    "BTC": {"usd": 64000.5, "usd_24h_change": 1.5},
                    "ETH": {"usd": 3100, "usd_24h_change": -0.25}
                })),
            }),
            news: Arc::new(FakeNews {
                calls: Calls::default(),
                fail: false,
            }),
        }
    }

    fn aggregator(&self, policy: EnrichmentPolicy) -> ChatAggregator {
        ChatAggregator::new(
            self.completion.clone(),
            self.forecasts.clone(),
            self.prices.clone(),
            self.news.clone(),
        )
        .with_policy(policy)
    }

    fn enrichment_calls(&self) -> usize {
        self.forecasts.calls.count() + self.prices.calls.count() + self.news.calls.count()
    }
}

#[tokio::test]
async fn test_plain_message_has_no_summary() {
    let harness = Harness::new();
    let reply = harness.aggregator(EnrichmentPolicy::Degrade).reply("hello").await.unwrap();

    assert_eq!(reply, "echo: hello");
    assert_eq!(harness.enrichment_calls(), 0);
}

#[tokio::test]
async fn test_recommendation_appends_summary_in_received_order() {
    let harness = Harness::new();
    let reply = harness
        .aggregator(EnrichmentPolicy::Degrade)
        .reply("give me an investment recommendation")
        .await
        .unwrap();

    let expected = "echo: give me an investment recommendation\
        \n\nBased on the latest data:\n\
        ETH: Predicted price next hour: $2.00, next day: $48.00, next week: $336.00\n\
        Current price: $3100, 24h change: -0.25%\n\
        BTC: Predicted price next hour: $1.25, next day: $30.00, next week: $210.00\n\
        Current price: $64000.5, 24h change: 1.50%\n\
        \nLatest news:\n\
        - ETF inflows hit record: https://news.example/etf\n\
        - Exchange outage resolved: https://news.example/outage\n\
        - Miners sell reserves: https://news.example/miners\n";
    assert_eq!(reply, expected);

    assert_eq!(harness.forecasts.calls.count(), 1);
    assert_eq!(harness.prices.calls.count(), 1);
    assert_eq!(harness.news.calls.count(), 1);
}

#[tokio::test]
async fn test_empty_message_makes_no_upstream_calls() {
    let harness = Harness::new();

    for message in ["", "   "] {
        let err = harness.aggregator(EnrichmentPolicy::Degrade).reply(message).await.unwrap_err();
        assert_eq!(err, ForecastError::validation("Please provide a message."));
    }

    assert_eq!(harness.completion.calls.count(), 0);
    assert_eq!(harness.enrichment_calls(), 0);
}

#[tokio::test]
async fn test_degrade_omits_failed_fragment() {
    let mut harness = Harness::new();
    harness.news = Arc::new(FakeNews {
        calls: Calls::default(),
        fail: true,
    });

    let reply = harness
        .aggregator(EnrichmentPolicy::Degrade)
        .reply("Investment ideas?")
        .await
        .unwrap();

    assert!(reply.contains("BTC: Predicted price next hour: $1.25"));
    assert!(!reply.contains("Latest news"));
}

#[tokio::test]
async fn test_degrade_omits_absent_prices() {
    let mut harness = Harness::new();
    harness.prices = Arc::new(FakePrices {
        calls: Calls::default(),
        payload: None,
    });

    let reply = harness
        .aggregator(EnrichmentPolicy::Degrade)
        .reply("recommendation please")
        .await
        .unwrap();

    assert!(reply.contains("ETH: Predicted price"));
    assert!(!reply.contains("Current price"));
    assert!(reply.contains("- Miners sell reserves: https://news.example/miners"));
}

#[tokio::test]
async fn test_fail_fast_propagates_fragment_failure() {
    let mut harness = Harness::new();
    harness.news = Arc::new(FakeNews {
        calls: Calls::default(),
        fail: true,
    });

    let err = harness
        .aggregator(EnrichmentPolicy::FailFast)
        .reply("investment")
        .await
        .unwrap_err();

    assert!(matches!(err, ForecastError::Upstream { ref service, .. } if service == "news"));
}

#[tokio::test]
async fn test_completion_failure_fails_chat() {
    let mut harness = Harness::new();
    harness.completion = Arc::new(FakeCompletion {
        calls: Calls::default(),
        fail: true,
    });

    let err = harness.aggregator(EnrichmentPolicy::Degrade).reply("hello").await.unwrap_err();
    assert!(matches!(err, ForecastError::Upstream { .. }));
}

struct FixedPredictor;

impl Predictor for FixedPredictor {
    fn input_dim(&self) -> usize {
        1
    }

    fn predict(&self, _input: &[f32]) -> Result<PredictionVector, InferenceError> {
        Ok(PredictionVector::new(vec![0.5]).unwrap())
    }
}

#[tokio::test]
async fn test_local_forecasts_label_single_asset() {
    let service = PredictionService::new(
        Arc::new(MemoryCache::new()),
        Arc::new(FixedPredictor),
        Arc::new(StaticFeatures::zeros(1)),
        DEFAULT_PREDICTION_TTL,
    );
    let source = LocalForecasts::new(service, "BTC");

    let forecasts = source.forecasts().await.unwrap().unwrap();
    assert_eq!(forecasts.len(), 1);
    assert_eq!(forecasts["BTC"], PredictionTriple::from_next_hour(0.5));
}

#[tokio::test(start_paused = true)]
async fn test_enrichment_fetches_run_concurrently() {
    struct SlowPrices;

    #[async_trait]
    impl PriceFeed for SlowPrices {
        async fn fetch_prices(&self) -> Result<Option<Value>, UpstreamError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(None)
        }
    }

    struct SlowNews;

    #[async_trait]
    impl NewsFeed for SlowNews {
        async fn fetch_news(&self, _query: &NewsQuery) -> Result<Option<Value>, UpstreamError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(None)
        }
    }

    let harness = Harness::new();
    let aggregator = ChatAggregator::new(
        harness.completion.clone(),
        harness.forecasts.clone(),
        Arc::new(SlowPrices),
        Arc::new(SlowNews),
    );

    let started = tokio::time::Instant::now();
    aggregator.reply("investment").await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(10));
}
