//! Web Virtual Keyboard server: entry point.
//!
//! Serves a small authenticated web page and API that types text into the
//! attached host through a USB HID keyboard gadget, and stores named
//! username/password presets in a JSON preferences file.
//!
//! # Usage
//!
//! ```text
//! webkbd-server [OPTIONS]
//!
//! Options:
//!   --config      <PATH>      TOML config file [default: webkbd.toml]
//!   --bind        <IP>        Listener address (overrides server.bind_address)
//!   --port        <PORT>      Listener port (overrides server.port)
//!   --storage-dir <DIR>       Preferences directory (overrides storage.dir)
//!   --keyboard    <log|hidg>  Keystroke backend (overrides keyboard.backend)
//!   --device      <PATH>      HID gadget device (overrides keyboard.device)
//! ```
//!
//! Every option can also be set through the `WEBKBD_*` environment variable
//! named in `--help`.  Flags take precedence over the config file; a missing
//! config file means built-in defaults.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use webkbd_server::application::{
    KeyValueBackend, KeystrokeEmitter, PresetStore, RequestGateway, StatusReporter,
    TypeTextUseCase,
};
use webkbd_server::infrastructure::clock::SystemClock;
use webkbd_server::infrastructure::config::{load_config, AppConfig, KeyboardBackend};
use webkbd_server::infrastructure::http::{ListenerSettings, INDEX_HTML};
use webkbd_server::infrastructure::keyboard::{HidGadgetEmitter, LogEmitter};
use webkbd_server::infrastructure::run_server;
use webkbd_server::infrastructure::status::TracingStatusReporter;
use webkbd_server::infrastructure::storage::FileBackend;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// HTTP-controlled USB keyboard with stored credential presets.
#[derive(Debug, Parser)]
#[command(
    name = "webkbd-server",
    about = "Type text into a host over a USB HID gadget from a web page",
    version
)]
struct Cli {
    /// Path of the TOML configuration file.
    #[arg(long, default_value = "webkbd.toml", env = "WEBKBD_CONFIG")]
    config: PathBuf,

    /// IP address to listen on.
    #[arg(long, env = "WEBKBD_BIND")]
    bind: Option<String>,

    /// TCP port to listen on.
    #[arg(long, env = "WEBKBD_PORT")]
    port: Option<u16>,

    /// Directory holding the preferences file.
    #[arg(long, env = "WEBKBD_STORAGE_DIR")]
    storage_dir: Option<PathBuf>,

    /// Keystroke backend: `log` (dry run) or `hidg` (USB gadget).
    #[arg(long, env = "WEBKBD_KEYBOARD")]
    keyboard: Option<KeyboardBackend>,

    /// HID gadget device path.
    #[arg(long, env = "WEBKBD_DEVICE")]
    device: Option<PathBuf>,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration.
    fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(bind) = &self.bind {
            config.server.bind_address = bind.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(dir) = &self.storage_dir {
            config.storage.dir = dir.clone();
        }
        if let Some(backend) = self.keyboard {
            config.keyboard.backend = backend;
        }
        if let Some(device) = &self.device {
            config.keyboard.device = device.clone();
        }
        config
    }
}

// ── Wiring ────────────────────────────────────────────────────────────────────

fn build_emitter(config: &AppConfig) -> Arc<dyn KeystrokeEmitter> {
    match config.keyboard.backend {
        KeyboardBackend::Log => {
            info!("keyboard backend: log only, nothing will be typed");
            Arc::new(LogEmitter)
        }
        KeyboardBackend::Hidg => {
            info!("keyboard backend: HID gadget {}", config.keyboard.device.display());
            Arc::new(HidGadgetEmitter::new(config.keyboard.device.clone()))
        }
    }
}

fn build_gateway(config: &AppConfig, reporter: Arc<dyn StatusReporter>) -> RequestGateway {
    let backend = FileBackend::new(config.storage.dir.clone(), config.storage.namespace.clone());
    info!("preset storage: {}", backend.path().display());
    let backend: Arc<dyn KeyValueBackend> = Arc::new(backend);
    let store = PresetStore::with_document_limit(backend, config.storage.max_document_bytes);

    let typing = TypeTextUseCase::new(
        build_emitter(config),
        Arc::new(SystemClock),
        config.typing.delays(),
    );

    RequestGateway::new(
        store,
        typing,
        config.auth.credentials(),
        reporter,
        INDEX_HTML,
    )
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
    let config = cli.apply(config);

    // RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("=== Web Virtual Keyboard ===");

    let settings = ListenerSettings {
        addr: config
            .server
            .socket_addr()
            .context("invalid listener address")?,
        retry_interval: config.server.bind_retry_interval(),
        retry_ceiling: config.server.bind_retry_ceiling(),
    };

    let reporter: Arc<dyn StatusReporter> = Arc::new(TracingStatusReporter);
    let gateway = build_gateway(&config, Arc::clone(&reporter));
    gateway.report_count();
    let gateway = Arc::new(Mutex::new(gateway));

    // ── Graceful shutdown flag ─────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    run_server(settings, gateway, reporter, running)
        .await
        .context("HTTP server failed")?;

    info!("Web Virtual Keyboard stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
