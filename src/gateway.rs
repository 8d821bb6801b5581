//! Entry point for host events
//!
//! [`EventGateway::handle_event`] is called on the host's own thread. It never performs
//! I/O and never waits: it snapshots the configuration, takes an in-flight permit and
//! spawns the delivery onto the tokio runtime. Events are delivered independently, so
//! they may reach the endpoint in any order.

use crate::core::{ConfigStore, DeliverySettings, ForwarderConfig, ForwarderResult};
use crate::events::{build_record, EventData, EventSink};
use crate::tracing_context::{delivery_span, DeliveryId};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{watch, Semaphore, TryAcquireError};
use tracing::{info, warn, Instrument};

/// Result of [`EventGateway::shutdown`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Deliveries in flight when shutdown started
    pub in_flight_at_start: usize,
    /// Deliveries still running when the grace period ran out
    pub abandoned: usize,
}

impl ShutdownReport {
    pub fn drained(&self) -> bool {
        self.abandoned == 0
    }
}

pub struct EventGateway {
    sink: Arc<dyn EventSink>,
    store: ConfigStore,
    config_tx: watch::Sender<Arc<ForwarderConfig>>,
    permits: Arc<Semaphore>,
    max_in_flight: usize,
    accepting: AtomicBool,
    runtime: Handle,
}

impl EventGateway {
    /// Create a gateway, loading the configuration from `store`
    ///
    /// Deliveries are spawned on `runtime`, which may belong to a runtime the host
    /// thread is not part of.
    pub fn new(
        sink: Arc<dyn EventSink>,
        store: ConfigStore,
        settings: &DeliverySettings,
        runtime: Handle,
    ) -> Self {
        let config = store.load();
        let max_in_flight = settings.max_in_flight.clamp(1, u32::MAX as usize);
        let (config_tx, _) = watch::channel(Arc::new(config));

        info!(
            sink = sink.sink_type(),
            max_in_flight,
            "Event gateway initialized"
        );

        Self {
            sink,
            store,
            config_tx,
            permits: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
            accepting: AtomicBool::new(true),
            runtime,
        }
    }

    /// Current configuration snapshot
    pub fn config(&self) -> Arc<ForwarderConfig> {
        self.config_tx.borrow().clone()
    }

    /// Number of deliveries currently running
    pub fn in_flight(&self) -> usize {
        self.max_in_flight
            .saturating_sub(self.permits.available_permits())
    }

    /// Capture one host event and hand it to an independent delivery task
    ///
    /// Returns as soon as the task is scheduled. When the in-flight bound is reached or
    /// the gateway is shutting down, the event is dropped with a warning.
    pub fn handle_event(&self, event_name: &str, event_data: impl Into<EventData>) {
        let timestamp = Utc::now();
        let data = event_data.into();
        let delivery_id = DeliveryId::new();

        info!(
            event_type = event_name,
            delivery_id = %delivery_id,
            "Event received at {}: {}, Data: {}",
            timestamp,
            event_name,
            data.render()
        );

        if !self.accepting.load(Ordering::SeqCst) {
            warn!(event_type = event_name, "Gateway is shutting down, dropping event");
            return;
        }

        let permit = match self.permits.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(TryAcquireError::NoPermits) => {
                warn!(
                    event_type = event_name,
                    max_in_flight = self.max_in_flight,
                    "Too many deliveries in flight, dropping event"
                );
                return;
            }
            Err(TryAcquireError::Closed) => {
                warn!(event_type = event_name, "Gateway is shut down, dropping event");
                return;
            }
        };

        let config = self.config();
        let sink = self.sink.clone();
        let event_name = event_name.to_string();
        let span = delivery_span(&delivery_id, &event_name);

        self.runtime.spawn(
            async move {
                let _permit = permit;
                let record = build_record(&event_name, &data, timestamp);
                let outcome = sink.send_event(&record, &config).await;
                outcome.log(&event_name);
            }
            .instrument(span),
        );
    }

    /// Validate, persist and publish a new configuration
    ///
    /// Deliveries that were already scheduled keep the snapshot they took. A failure to
    /// persist is logged by the store; the new configuration still takes effect.
    pub fn reconfigure(&self, config: ForwarderConfig) -> ForwarderResult<()> {
        config.validate()?;
        self.store.save(&config);
        info!(endpoint_url = %config.endpoint_url, "Configuration updated");
        self.config_tx.send_replace(Arc::new(config));
        Ok(())
    }

    /// Stop admitting events; later events are dropped with a warning
    pub fn close(&self) {
        self.accepting.store(false, Ordering::SeqCst);
    }

    /// Stop admitting events and wait up to `grace` for in-flight deliveries
    pub async fn shutdown(&self, grace: Duration) -> ShutdownReport {
        self.close();
        let in_flight_at_start = self.in_flight();
        info!(
            in_flight = in_flight_at_start,
            "Shutting down event gateway, waiting up to {:?}",
            grace
        );

        let all = self.max_in_flight as u32;
        match tokio::time::timeout(grace, self.permits.acquire_many(all)).await {
            Ok(Ok(permit)) => drop(permit),
            Ok(Err(_)) => {}
            Err(_) => warn!(
                abandoned = self.in_flight(),
                "Grace period elapsed with deliveries still in flight"
            ),
        }

        let abandoned = self.in_flight();
        self.permits.close();

        ShutdownReport {
            in_flight_at_start,
            abandoned,
        }
    }
}
