//! Interactive command loop.
//!
//! Reads lines from stdin: `/add` and `/exit` commands, any other
//! `/`-prefixed line is an unknown-command diagnostic, anything else is
//! chat text. The read races the shutdown signal so a Ctrl-C elsewhere
//! ends this loop too; EOF on stdin is treated like `/exit`.

use std::io::Write;
use std::net::SocketAddr;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use gust_gossip::Node;

/// What a single input line asks for.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Nothing,
    Exit,
    Add(Vec<&'a str>),
    Unknown,
    Chat(&'a str),
}

fn parse_line(line: &str) -> Command<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Command::Nothing;
    }
    if !line.starts_with('/') {
        return Command::Chat(line);
    }
    let mut parts = line.split_whitespace();
    match parts.next() {
        Some("/exit") => Command::Exit,
        Some("/add") => Command::Add(parts.collect()),
        _ => Command::Unknown,
    }
}

pub async fn run(node: Node, shutdown: broadcast::Sender<()>) -> Result<()> {
    let mut shutdown_rx = shutdown.subscribe();
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        prompt();

        let line = tokio::select! {
            _ = shutdown_rx.recv() => return Ok(()),
            result = lines.next_line() => match result {
                Ok(Some(line)) => line,
                Ok(None) => {
                    // stdin closed — same as /exit
                    let _ = shutdown.send(());
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read input");
                    let _ = shutdown.send(());
                    return Ok(());
                }
            },
        };

        match parse_line(&line) {
            Command::Nothing => {}
            Command::Exit => {
                let _ = shutdown.send(());
                return Ok(());
            }
            Command::Add(entries) => {
                if entries.is_empty() {
                    println!("# usage: /add <host>:<port> [<host>:<port> ...]");
                }
                // One bad address skips that address only; the rest of
                // the command still goes through.
                for entry in entries {
                    add_address(&node, entry).await;
                }
            }
            Command::Unknown => println!("Unknown command."),
            Command::Chat(text) => node.send_chat(text).await,
        }
    }
}

async fn add_address(node: &Node, entry: &str) {
    match resolve(entry).await {
        Ok(addr) => node.add_peer(addr).await,
        Err(e) => println!("# {entry}: {e}"),
    }
}

/// Resolve a user-supplied `host:port` to a single socket address.
///
/// Resolution happens once, here; addresses learned from inbound traffic
/// are used verbatim and never pass through this.
async fn resolve(entry: &str) -> Result<SocketAddr> {
    if !entry.contains(':') {
        anyhow::bail!("invalid address, expected host:port");
    }
    let mut addrs = tokio::net::lookup_host(entry)
        .await
        .map_err(|_| anyhow::anyhow!("host not found"))?;
    addrs
        .find(|a| a.is_ipv4())
        .ok_or_else(|| anyhow::anyhow!("no usable address for host"))
}

fn prompt() {
    print!("-> ");
    let _ = std::io::stdout().flush();
}
