#![forbid(unsafe_code)]

//! `order-intercom` webhook server binary.
//!
//! Bootstraps configuration, opens the order database, wires the
//! conversation pipeline to the chat provider, and serves the webhook.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use order_intercom::config::GlobalConfig;
use order_intercom::conversation::ConversationService;
use order_intercom::persistence::db;
use order_intercom::transport::automation::AutomationForwarder;
use order_intercom::transport::client::HttpTransport;
use order_intercom::transport::Dispatcher;
use order_intercom::webhook::{self, AppState};
use order_intercom::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "order-intercom", about = "WhatsApp ordering webhook server", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the configured HTTP port.
    #[arg(long)]
    port: Option<u16>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("order-intercom server bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    if let Some(port) = args.port {
        config.http_port = port;
    }
    config.load_credentials().await?;

    let config = Arc::new(config);
    info!("configuration loaded");

    // ── Initialize database ─────────────────────────────
    let db = Arc::new(db::connect(&config.db_path).await?);
    info!(path = %config.db_path.display(), "database connected");

    // ── Outbound collaborators ──────────────────────────
    let dispatcher = if config.transport.is_configured() {
        Dispatcher::new(Arc::new(HttpTransport::new(&config.transport)?))
    } else {
        Dispatcher::disabled()
    };
    if dispatcher.is_enabled() {
        info!(instance = %config.transport.instance, "chat transport configured");
    } else {
        warn!("chat transport not configured; replies will only be logged");
    }

    let automation = AutomationForwarder::new(config.automation.webhook_url.as_deref())?;
    if automation.is_enabled() {
        info!("automation forwarding enabled");
    }

    // ── Build shared application state ──────────────────
    let state = Arc::new(AppState {
        conversation: ConversationService::from_db(&db, &config),
        config: Arc::clone(&config),
        db,
        dispatcher,
        automation,
    });

    // ── Serve ───────────────────────────────────────────
    let ct = CancellationToken::new();
    let server_ct = ct.clone();
    let server_state = Arc::clone(&state);
    let server_handle = tokio::spawn(async move {
        if let Err(err) = webhook::serve(server_state, server_ct).await {
            error!(%err, "webhook server failed");
        }
    });

    info!("order-intercom ready");

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    if let Err(err) = server_handle.await {
        error!(%err, "webhook task join failed");
    }
    state.db.close().await;
    info!("order-intercom shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
