//! # Example: listen
//!
//! Connects to a validator, subscribes to block commits and logs each one
//! until Ctrl-C.
//!
//! Shows how to:
//! - Build a [`Subscriber`] over TCP with hooks and the [`LogWriter`] observer.
//! - Register a [`HandlerFn`] that reads event attributes.
//! - Run until a termination signal, then unsubscribe.
//!
//! ## Flow
//! ```text
//! Subscriber::builder(cfg).connect()
//!     ├─► subscribe("sawtooth/block-commit", log_block)
//!     └─► run(markers)
//!           ├─► SubscribeRequest ──► validator
//!           ├─► EventBatch ──► Router ──► log_block
//!           ├─► SIGINT/SIGTERM ──► UnsubscribeRequest
//!           └─► ack or wait elapsed ──► close
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example listen --features logging -- tcp://127.0.0.1:4004 [block-id...]
//! ```

use std::sync::Arc;

use sawtk_subscriber::message::{BLOCK_COMMIT, Event};
use sawtk_subscriber::{Config, HandlerFn, LogWriter, Observe, Subscriber};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn log_block(peer: &str, ev: &Event) -> bool {
    let num = ev.attr("block_num").map(|(_, v)| v).unwrap_or("?");
    let id = ev.attr("block_id").map(|(_, v)| v).unwrap_or("?");
    info!(peer, block_num = num, block_id = id, "block committed");
    true
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let cfg = match args.next() {
        Some(endpoint) => Config::new(endpoint),
        None => Config::default(),
    };
    let markers: Vec<String> = args.collect();

    let observers: Vec<Arc<dyn Observe>> = vec![Arc::new(LogWriter::new())];
    let sub = Subscriber::builder(cfg)
        .with_observers(observers)
        .on_subscribed(|peer, resp| info!(peer, status = ?resp.status, "subscribed"))
        .on_unsubscribed(|peer, resp| info!(peer, status = ?resp.status, "unsubscribed"))
        .on_close(|| info!("connection closed"))
        .connect()
        .await?;

    sub.subscribe(BLOCK_COMMIT, HandlerFn::arc("log_block", log_block), Vec::new())?;
    sub.run(markers).await?;
    Ok(())
}
