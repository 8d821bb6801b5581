//! snap2http command line
//!
//! Drives the plugin outside of its host: fire events, probe the endpoint and manage
//! the stored configuration.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use snap2http::core::{ConfigStore, DeliverySettings, ForwarderConfig, LoggingConfig};
use snap2http::events::sink::HttpEventSink;
use snap2http::events::{build_record, EventData, EventSink, SinkKind};
use snap2http::plugin::{self, HostPlugin, TimeLoggerPlugin};
use snap2http::logging;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    name = "snap2http",
    about = "Forward activity tracker events to an HTTPS ingestion endpoint",
    version
)]
struct Args {
    /// Configuration file (defaults to <config dir>/TimeLogger/config.txt)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fire one event through the plugin and wait for it to drain
    Send {
        event: String,
        data: Option<String>,
        /// Where to deliver the event: http or stdout
        #[arg(long, default_value_t = SinkKind::Http)]
        sink: SinkKind,
        /// Print the JSON body instead of posting it (same as --sink stdout)
        #[arg(long, conflicts_with = "sink")]
        dry_run: bool,
    },
    /// Post one event synchronously and report the endpoint's answer
    Probe {
        #[arg(default_value = "SnapshotSaved")]
        event: String,
        data: Option<String>,
    },
    /// Validate and save the endpoint configuration
    Configure {
        #[arg(long)]
        url: String,
        #[arg(long, default_value = "")]
        api_key: String,
    },
    /// Print the effective configuration with the API key redacted
    ShowConfig,
    /// List subscribed events and their report types
    Events,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let store = args
        .config
        .clone()
        .map(ConfigStore::new)
        .unwrap_or_else(ConfigStore::default_location);

    let logging_config = LoggingConfig::from_env().with_default_log_file(store.log_file_path());
    let _guard = logging::init(&logging_config);

    match args.command {
        Command::Send {
            event,
            data,
            sink,
            dry_run,
        } => {
            let kind = if dry_run { SinkKind::Stdout } else { sink };
            send(store, &event, data, kind)
        }
        Command::Probe { event, data } => probe(store, &event, data),
        Command::Configure { url, api_key } => configure(store, url, api_key),
        Command::ShowConfig => {
            let config = store.load();
            println!("file:         {}", store.path().display());
            println!("endpoint_url: {}", config.endpoint_url);
            println!("api_key:      {}", config.redacted_api_key());
            Ok(())
        }
        Command::Events => {
            for (name, report_type) in plugin::subscriptions() {
                println!("{:<20} {}", name, report_type);
            }
            Ok(())
        }
    }
}

fn send(store: ConfigStore, event: &str, data: Option<String>, kind: SinkKind) -> Result<()> {
    let settings = DeliverySettings::from_env()?;

    let mut plugin = TimeLoggerPlugin::with_sink_kind(kind, store, &settings)
        .context("failed to start plugin")?;
    plugin.handle_event(event, EventData::from(data));

    match plugin.dispose() {
        Some(report) if !report.drained() => {
            error!(
                abandoned = report.abandoned,
                "Delivery still in flight after {:?}", settings.shutdown_grace
            );
            anyhow::bail!("delivery did not finish within the grace period");
        }
        _ => Ok(()),
    }
}

fn probe(store: ConfigStore, event: &str, data: Option<String>) -> Result<()> {
    let settings = DeliverySettings::from_env()?;
    let config = store.load();
    let sink = HttpEventSink::new(&settings)?;
    let record = build_record(event, &EventData::from(data), chrono::Utc::now());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let outcome = runtime.block_on(sink.send_event(&record, &config));
    outcome.log(event);

    let body = outcome.into_result()?;
    info!("Endpoint accepted probe");
    println!("{}", body);
    Ok(())
}

fn configure(store: ConfigStore, url: String, api_key: String) -> Result<()> {
    let config = ForwarderConfig::new(url, api_key);
    config.validate()?;
    store
        .try_save(&config)
        .with_context(|| format!("failed to write {}", store.path().display()))?;
    println!("Saved configuration to {}", store.path().display());
    Ok(())
}
