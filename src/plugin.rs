//! Host plugin surface
//!
//! The host constructs the plugin, subscribes it to a list of event names, calls
//! `handle_event` from its own thread and finally disposes it. The plugin owns a small
//! dedicated tokio runtime so that deliveries never run on the host thread.

use crate::core::{ConfigStore, DeliverySettings, ForwarderConfig, ForwarderResult};
use crate::events::{create_sink, EventData, EventSink, ReportType, SinkKind};
use crate::gateway::{EventGateway, ShutdownReport};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::{info, warn};
use uuid::{uuid, Uuid};

pub const PLUGIN_ID: Uuid = uuid!("B5AEE497-1C29-4A34-8D1E-4F107A0B5C5D");
pub const FRIENDLY_NAME: &str = "Supabase Time Logger Plugin";
pub const DESCRIPTION: &str = "Logs TimeSnapper events to Supabase edge function endpoint";

/// Event names the plugin subscribes to
pub const SUBSCRIBED_EVENTS: [&str; 7] = [
    "SnapshotSaved",
    "ProgramStatistics",
    "TimeSpentComputing",
    "DiskSpaceUsage",
    "FlagSaved",
    "ProductivityGrades",
    "ActivityCloud",
];

/// Time given to the runtime to stop after the gateway has drained
const RUNTIME_STOP_TIMEOUT: Duration = Duration::from_millis(500);

/// Capability object the host application loads
pub trait HostPlugin {
    fn plugin_id(&self) -> Uuid;
    fn friendly_name(&self) -> &str;
    fn description(&self) -> &str;
    fn subscribes_to(&self) -> &[&'static str];
    /// Must return promptly and must never panic back into the host
    fn handle_event(&self, event_name: &str, event_data: EventData);
    fn configurable(&self) -> bool;
    fn configure(&self, config: ForwarderConfig) -> ForwarderResult<()>;
}

pub struct TimeLoggerPlugin {
    gateway: EventGateway,
    runtime: Option<Runtime>,
    shutdown_grace: Duration,
}

impl TimeLoggerPlugin {
    /// Create the plugin with the HTTP sink
    pub fn new(store: ConfigStore, settings: &DeliverySettings) -> ForwarderResult<Self> {
        Self::with_sink_kind(SinkKind::Http, store, settings)
    }

    pub fn with_sink_kind(
        kind: SinkKind,
        store: ConfigStore,
        settings: &DeliverySettings,
    ) -> ForwarderResult<Self> {
        let sink = create_sink(kind, settings)?;
        Self::with_sink(sink, store, settings)
    }

    pub fn with_sink(
        sink: Arc<dyn EventSink>,
        store: ConfigStore,
        settings: &DeliverySettings,
    ) -> ForwarderResult<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("snap2http-delivery")
            .enable_all()
            .build()?;

        let gateway = EventGateway::new(sink, store, settings, runtime.handle().clone());
        info!("{} initialized", FRIENDLY_NAME);

        Ok(Self {
            gateway,
            runtime: Some(runtime),
            shutdown_grace: settings.shutdown_grace,
        })
    }

    pub fn config(&self) -> Arc<ForwarderConfig> {
        self.gateway.config()
    }

    pub fn in_flight(&self) -> usize {
        self.gateway.in_flight()
    }

    /// Drain in-flight deliveries for up to the grace period, then stop the runtime
    ///
    /// Waiting needs a thread that is not driving a tokio runtime. From inside one, the
    /// gateway is closed, in-flight deliveries are abandoned and `None` is returned.
    /// Calling it again is a no-op.
    pub fn dispose(&mut self) -> Option<ShutdownReport> {
        let runtime = self.runtime.take()?;

        if Handle::try_current().is_ok() {
            // Blocking here would panic inside an async context
            warn!(
                in_flight = self.gateway.in_flight(),
                "{} disposed inside a tokio runtime, abandoning deliveries",
                FRIENDLY_NAME
            );
            self.gateway.close();
            runtime.shutdown_background();
            return None;
        }

        let report = runtime.block_on(self.gateway.shutdown(self.shutdown_grace));
        runtime.shutdown_timeout(RUNTIME_STOP_TIMEOUT);

        info!(
            in_flight_at_start = report.in_flight_at_start,
            abandoned = report.abandoned,
            "{} disposed",
            FRIENDLY_NAME
        );
        Some(report)
    }
}

impl HostPlugin for TimeLoggerPlugin {
    fn plugin_id(&self) -> Uuid {
        PLUGIN_ID
    }

    fn friendly_name(&self) -> &str {
        FRIENDLY_NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn subscribes_to(&self) -> &[&'static str] {
        &SUBSCRIBED_EVENTS
    }

    fn handle_event(&self, event_name: &str, event_data: EventData) {
        self.gateway.handle_event(event_name, event_data);
    }

    fn configurable(&self) -> bool {
        true
    }

    fn configure(&self, config: ForwarderConfig) -> ForwarderResult<()> {
        self.gateway.reconfigure(config)
    }
}

impl Drop for TimeLoggerPlugin {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Subscribed event names paired with the report type each one maps to
pub fn subscriptions() -> impl Iterator<Item = (&'static str, ReportType)> {
    SUBSCRIBED_EVENTS
        .iter()
        .map(|name| (*name, ReportType::from_event_name(name)))
}
