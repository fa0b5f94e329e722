//! Single-flight call coalescing
//!
//! Concurrent callers asking for the same key share one underlying
//! computation. The first caller (the leader) spawns the work as its own
//! task, so a caller that goes away never cancels a computation other
//! callers are waiting on.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use forecast_core::{ForecastError, ForecastResult};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::debug;

type Flight<T> = Shared<BoxFuture<'static, ForecastResult<T>>>;
type FlightMap<T> = Arc<Mutex<HashMap<String, Flight<T>>>>;

/// In-flight computations keyed by name
pub struct SingleFlight<T> {
    flights: FlightMap<T>,
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            flights: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

/// Removes a finished flight from the map, including when the work panics
struct FlightGuard<T> {
    flights: FlightMap<T>,
    key: String,
}

impl<T> Drop for FlightGuard<T> {
    fn drop(&mut self) {
        self.flights.lock().remove(&self.key);
    }
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` for `key` unless a run is already in flight, in which case
    /// wait for that run instead. Every caller sees the same result.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> ForecastResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ForecastResult<T>> + Send + 'static,
    {
        let flight = {
            let mut flights = self.flights.lock();

            match flights.get(key) {
                Some(flight) => {
                    debug!(key, "Joining in-flight computation");
                    flight.clone()
                }
                None => {
                    debug!(key, "Starting new flight");
                    let guard = FlightGuard {
                        flights: Arc::clone(&self.flights),
                        key: key.to_string(),
                    };
                    let fut = work();
                    let handle = tokio::spawn(async move {
                        let _guard = guard;
                        fut.await
                    });

                    let flight: Flight<T> = async move {
                        handle.await.unwrap_or_else(|e| {
                            Err(ForecastError::internal(format!("in-flight task failed: {}", e)))
                        })
                    }
                    .boxed()
                    .shared();

                    flights.insert(key.to_string(), flight.clone());
                    flight
                }
            }
        };

        flight.await
    }

    /// Number of keys with a computation currently running
    pub fn in_flight(&self) -> usize {
        self.flights.lock().len()
    }
}
