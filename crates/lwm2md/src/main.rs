//! lwm2md - LwM2M Gateway Daemon
//!
//! Serves a REST API over a fleet of LwM2M devices: devices register over
//! CoAP/UDP, the gateway keeps a live directory and translates path-based
//! HTTP calls into device read/write/execute requests with a bounded wait.
//!
//! Usage:
//!   lwm2md [config.toml]
//!
//! Without a config file the daemon uses the defaults (HTTP on 8080, CoAP on
//! 0.0.0.0:5683, 5000 ms request timeout).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use lwm2m_api::{create_router, AppState};
use lwm2m_coap::{CoapConfig, CoapTransport};
use lwm2m_core::{DeviceRegistry, RequestDispatcher, DEFAULT_REQUEST_TIMEOUT_MS};
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Config {
    http: HttpConfig,
    coap: CoapSection,
    gateway: GatewaySection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct HttpConfig {
    port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct CoapSection {
    bind: SocketAddr,
}

impl Default for CoapSection {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5683".parse().expect("static address"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct GatewaySection {
    timeout_ms: u64,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

fn print_help() {
    eprintln!(
        r#"lwm2md - LwM2M Gateway Daemon

Usage: lwm2md [OPTIONS] [config.toml]

Options:
  -h, --help    Print this help message

Config file (TOML, all sections optional):
  [http]    port = 8080
  [coap]    bind = "0.0.0.0:5683"
  [gateway] timeout_ms = 5000
"#
    );
}

fn parse_args() -> Option<String> {
    let mut config_path = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => config_path = Some(arg.to_string()),
            other => tracing::warn!("Unknown argument: {}", other),
        }
    }
    config_path
}

fn load_config(path: Option<&str>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            tracing::info!("Loading config from: {}", path);
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        }
        None => {
            tracing::info!("No config file provided, using defaults");
            Ok(Config::default())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lwm2md=info,lwm2m_api=info,lwm2m_coap=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting lwm2md (LwM2M Gateway Daemon)");

    let config = load_config(parse_args().as_deref())?;

    // Device directory, fed only by transport lifecycle events
    let registry = Arc::new(DeviceRegistry::new());

    // CoAP transport: registration interface + request sending
    let transport = CoapTransport::bind(&CoapConfig {
        bind: config.coap.bind,
    })
    .await
    .map_err(|e| anyhow::anyhow!("CoAP bind failed: {}", e))?;

    // Apply registration events to the directory
    let mut events = transport.events();
    let event_registry = registry.clone();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => event_registry.apply(event),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Registration event stream lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let dispatcher = Arc::new(RequestDispatcher::with_timeout(
        registry.clone(),
        transport,
        Duration::from_millis(config.gateway.timeout_ms),
    ));

    let state = AppState::new(registry, dispatcher);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
