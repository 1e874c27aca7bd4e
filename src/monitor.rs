use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::hid::backend::HidBackend;
use crate::hid::client::{BatteryClient, CancelToken};
use crate::hid::status::BatteryStatus;
use crate::sink::StatusSink;

/// Held for the lifetime of one poll, including its blocking worker.
struct InFlight(Arc<AtomicBool>);

impl InFlight {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Polls the headset on a fixed interval and feeds the sink.
pub struct Monitor<B: HidBackend, S> {
    client: Arc<Mutex<BatteryClient<B>>>,
    cancel: CancelToken,
    sink: S,
    poll_interval: Duration,
    in_flight: Arc<AtomicBool>,
}

impl<B, S> Monitor<B, S>
where
    B: HidBackend + Send + 'static,
    S: StatusSink,
{
    pub fn new(client: BatteryClient<B>, sink: S, poll_interval: Duration) -> Self {
        Self {
            cancel: client.cancel_token(),
            client: Arc::new(Mutex::new(client)),
            sink,
            poll_interval,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_polling(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Runs one poll cycle on a blocking worker and publishes the result.
    ///
    /// Returns `None` without polling if the previous cycle is still running.
    pub async fn poll(&mut self) -> Option<BatteryStatus> {
        let Some(guard) = InFlight::acquire(&self.in_flight) else {
            debug!("Previous poll still running, skipping tick");
            return None;
        };

        let client = Arc::clone(&self.client);
        let worker = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            let mut client = client.lock().unwrap_or_else(PoisonError::into_inner);
            client.poll()
        });

        let status = match worker.await {
            Ok(status) => status,
            Err(e) => {
                warn!("Poll worker failed: {}", e);
                BatteryStatus::inactive()
            }
        };

        self.sink.update(&status);
        Some(status)
    }

    /// Polls immediately, then every `poll_interval`, until `shutdown`
    /// resolves. An in-flight read is abandoned on shutdown.
    pub async fn run<F>(mut self, shutdown: F) -> S
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Polling every {:?}", self.poll_interval);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = &mut shutdown => break,
                        _ = self.poll() => {}
                    }
                }
            }
        }

        info!("Shutting down");
        self.cancel.cancel();
        self.sink
    }
}
