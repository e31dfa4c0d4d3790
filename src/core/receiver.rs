//! # Receive loop.
//!
//! The single background task that pulls frames from the connection and hands
//! them to the [`Router`] **synchronously**: the next `receive` is not issued
//! until every handler for the current frame has returned, so frames from one
//! source are processed strictly in arrival order.
//!
//! ## Exit
//! The loop ends only when `receive` fails (peer gone, I/O error, or the
//! connection was closed during teardown). It publishes
//! [`RuntimeEventKind::ReceiveLoopStopped`] with the error as reason.

use std::sync::Arc;

use tracing::{error, info};

use super::router::Router;
use crate::events::{Bus, RuntimeEvent, RuntimeEventKind};
use crate::transport::ConnectionRef;

/// Runs until the connection fails or is closed.
pub(crate) async fn receive_loop(conn: ConnectionRef, router: Arc<Router>, bus: Bus) {
    info!("receive loop started");

    let reason = loop {
        match conn.receive().await {
            Ok(frame) => router.route(&frame),
            Err(e) => {
                if e.is_closed() {
                    info!(reason = %e, "connection closed");
                } else {
                    error!(error = %e, "receive failed");
                }
                break e;
            }
        }
    };

    bus.publish(
        RuntimeEvent::new(RuntimeEventKind::ReceiveLoopStopped).with_reason(reason.to_string()),
    );
    info!("receive loop ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hooks::Hooks;
    use crate::core::registry::Registry;
    use crate::core::signal::AckSignal;
    use crate::handlers::HandlerFn;
    use crate::message::{Event, EventList, MessageType};
    use crate::transport::memory;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_frames_processed_in_arrival_order_until_disconnect() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut reg = Registry::new();
        reg.subscribe(
            "t",
            HandlerFn::arc("collect", move |_: &str, ev: &Event| {
                sink.lock().unwrap().push(ev.data.clone());
                true
            }),
            Vec::new(),
        );
        let (_, handlers) = reg.freeze();
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let router = Arc::new(Router::new(
            handlers,
            Hooks::default(),
            Arc::new(AckSignal::new()),
            bus.clone(),
        ));

        let (conn, peer) = memory::pair("v");
        for i in 0u8..3 {
            let list = EventList::new(vec![Event::new("t").with_data(vec![i])]);
            peer.push(MessageType::EventBatch, serde_json::to_vec(&list).unwrap());
        }
        peer.disconnect();

        receive_loop(conn, router, bus).await;

        assert_eq!(*seen.lock().unwrap(), vec![vec![0], vec![1], vec![2]]);
        let last = std::iter::from_fn(|| rx.try_recv().ok()).last().unwrap();
        assert_eq!(last.kind, RuntimeEventKind::ReceiveLoopStopped);
        assert_eq!(last.reason.as_deref(), Some("connection closed"));
    }
}
