//! clipsync node binary.
//!
//! Keeps a websocket session to a relay open, publishes every stdin line as a
//! text clipboard snapshot and prints text received from other nodes.

use anyhow::Context;
use clap::Parser;
use clip_session::{Client, WsClient};
use clip_wire::Snapshot;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod clip;
mod config;
mod logging;

use clip::{text_snapshot, texts, Dedup};
use config::ClipConfig;
use logging::ClipLogFormatter;

/// Clipboard sync node over a reconnecting websocket
#[derive(Parser, Debug)]
#[command(name = "clipsync", version, about = "Clipboard sync node over a reconnecting websocket")]
struct Args {
    /// Relay URL, e.g. ws://127.0.0.1:5002/clip
    #[arg(long)]
    url: Option<String>,

    /// Shared key (16 hex characters)
    #[arg(long)]
    key: Option<String>,

    /// Node ID stamped on outbound snapshots (random if unset)
    #[arg(long)]
    node_id: Option<String>,

    /// Configuration file path (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keepalive interval, e.g. 25s
    #[arg(long)]
    ping_interval: Option<humantime::Duration>,

    /// Dial timeout, e.g. 10s
    #[arg(long)]
    dial_timeout: Option<humantime::Duration>,

    /// Write timeout, e.g. 10s
    #[arg(long)]
    write_timeout: Option<humantime::Duration>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn apply_to(&self, config: &mut ClipConfig) {
        if let Some(url) = &self.url {
            config.url = url.clone();
        }
        if let Some(key) = &self.key {
            config.key = key.clone();
        }
        if let Some(node_id) = &self.node_id {
            config.node_id = node_id.clone();
        }
        if let Some(d) = self.ping_interval {
            config.ping_interval = d.into();
        }
        if let Some(d) = self.dial_timeout {
            config.dial_timeout = d.into();
        }
        if let Some(d) = self.write_timeout {
            config.write_timeout = d.into();
        }
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let env_filter = EnvFilter::new("warn")
        .add_directive(format!("clipsync={}", args.log_level).parse()?)
        .add_directive(format!("clip_session={}", args.log_level).parse()?)
        .add_directive(format!("clip_wire={}", args.log_level).parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .event_format(ClipLogFormatter::new("clipsync"))
        .init();

    info!("Starting clipsync v{}", env!("CARGO_PKG_VERSION"));

    let mut config = ClipConfig::load(args.config.as_ref())?;
    args.apply_to(&mut config);

    let client = Arc::new(
        WsClient::with_config(&config.url, &config.node_id, &config.key, config.client_config())
            .context("invalid client configuration")?,
    );
    info!("Node {} syncing through {}", client.node_id(), config.url);

    let cancel = CancellationToken::new();
    let (tx, rx) = mpsc::channel(64);

    let poller = client.clone();
    let token = cancel.clone();
    let poll_task = tokio::spawn(async move { poller.poll(token, tx).await });
    let print_task = tokio::spawn(print_received(rx));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Interrupted, shutting down"),
        result = publish_stdin(client.clone()) => {
            if let Err(e) = result {
                warn!("Reading stdin failed: {}", e);
            }
            info!("Input closed, shutting down");
        }
    }

    cancel.cancel();
    poll_task.await.context("poll task panicked")?;
    print_task.await.context("print task panicked")?;

    // The blocking stdin reader would otherwise hold the runtime open
    std::process::exit(0)
}

/// Send every non-empty stdin line as a text snapshot until EOF
async fn publish_stdin(client: Arc<WsClient>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut sent = Dedup::default();

    while let Some(line) = lines.next_line().await? {
        if line.is_empty() {
            continue;
        }

        let snapshot = text_snapshot(client.node_id(), &line, chrono::Utc::now().timestamp());
        if sent.is_repeat_snapshot(&snapshot) {
            debug!(dir = "local", "Skipping unchanged clipboard {}", snapshot.quick);
            continue;
        }

        if let Err(e) = client.send(snapshot).await {
            warn!("Failed to send clipboard: {}", e);
            sent.forget();
        }
    }
    Ok(())
}

/// Print text items of received snapshots, skipping consecutive repeats
async fn print_received(mut rx: mpsc::Receiver<Snapshot>) {
    let mut received = Dedup::default();

    while let Some(snapshot) = rx.recv().await {
        if received.is_repeat_snapshot(&snapshot) {
            debug!(dir = "recv", "Skipping repeated clipboard from {}", snapshot.origin);
            continue;
        }
        for text in texts(&snapshot) {
            println!("{}", text);
        }
    }
}
