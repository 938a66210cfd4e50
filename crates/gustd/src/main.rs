//! gustd — Gust peer-to-peer chat daemon.
//!
//! One UDP socket, two concurrent activities: the inbound listener and
//! the interactive command loop. Both share the peer registry and the
//! seen-message set through the [`Node`]; a broadcast channel carries
//! the cooperative shutdown signal to every task.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use gust_core::config::GustConfig;
use gust_core::Identity;
use gust_gossip::{event_channel, transport, Listener, Node, NodeEvent};

mod repl;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = GustConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = GustConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        GustConfig::default()
    });

    // CLI positionals override config: gustd [<port> [<nick>]]
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 3 {
        eprintln!("Usage: gustd <port> <nick>");
        std::process::exit(2);
    }
    let port: u16 = match args.get(1) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid port '{raw}'"))?,
        None => config.network.port,
    };
    let nickname = args
        .get(2)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| config.identity.nickname.clone());

    tracing::info!(port, nickname, "gustd starting");

    // Bind the node socket — a port conflict here is fatal.
    let socket = transport::bind(port).await?;
    let identity = Arc::new(Identity::new(nickname));
    let (event_tx, mut event_rx) = event_channel();
    let node = Node::new(socket, identity, event_tx);

    println!("Creating p2p connection at port {port}.");
    println!("Program started. Usage:");
    println!("    /add <domain or ip address>:<port> - to add a user");
    println!("    /exit - to exit");
    println!("    any other line is sent as chat, or wait for another user...");

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // ── Spawn tasks ──────────────────────────────────────────────────────────

    let listener_task = tokio::spawn(
        Listener::new(node.clone(), shutdown_tx.subscribe())
            .with_recv_timeout(Duration::from_millis(config.network.recv_timeout_ms))
            .run(),
    );

    // Renders node events for the terminal. Chat output is user-facing,
    // not logging.
    let _printer_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                NodeEvent::PeerConnected { addr, name } => {
                    println!("# {addr}/{name} connected");
                }
                NodeEvent::ChatReceived { name, text, path } => {
                    println!("\n[via: {}]", path.join(" -> "));
                    println!("<{name}> {text}");
                }
            }
        }
    });

    let repl_task = tokio::spawn(repl::run(node, shutdown_tx.clone()));

    // ── Wait for exit ────────────────────────────────────────────────────────

    let mut shutdown_rx = shutdown_tx.subscribe();

    tokio::select! {
        _ = shutdown_rx.recv() => tracing::info!("shutting down"),
        r = listener_task      => tracing::error!("listener exited: {:?}", r),
        r = repl_task          => tracing::debug!("command loop exited: {:?}", r),
    }

    println!("Bye!");
    Ok(())
}
