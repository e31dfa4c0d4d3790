//! # Subscriber: registration, receive loop and the lifecycle controller.
//!
//! The [`Subscriber`] owns the connection, the pending registry, the runtime
//! event [`Bus`] and the unsubscribe acknowledgment signal. It drives the
//! linear state machine `Created → Running → Unsubscribing → Closed`.
//!
//! ## High-level architecture
//! ```text
//! Created:
//!   subscribe()/handle_func() ──► Registry (pending)
//!
//! start(markers):
//!   Registry::freeze() ──► (subscriptions, HandlerMap)
//!   spawn observer listener: Bus.subscribe() ─► ObserverSet::emit(&ev)
//!   spawn receive_loop(conn, Router(HandlerMap, hooks, ack))
//!   conn.send(SubscribeRequest{markers, subscriptions}) ──► correlation id
//!   state: Created → Running
//!
//! run_until(markers, interrupt):
//!   start ─► interrupt.cancelled() ─► shutdown()
//!
//! shutdown():
//!   state: Running → Unsubscribing
//!   conn.send(UnsubscribeRequest)
//!   select! (unbiased) {
//!       ack receiver    ─► UnsubscribeAcked
//!       sleep(cfg.wait) ─► UnsubscribeTimedOut
//!   }
//!   close()
//!
//! close()  (exactly once, every step guarded):
//!   on_close hook ─► stop interrupt source ─► close ack ─► conn.close()
//!   state ─► Closed, publish Closed
//! ```
//!
//! `run_until` installs a drop guard, so teardown also runs if `start` fails
//! or the future is dropped mid-way.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{
    builder::SubscriberBuilder,
    config::Config,
    hooks::{Hooks, guarded},
    receiver::receive_loop,
    registry::Registry,
    router::Router,
    shutdown,
    signal::{AckSignal, lock},
    state::{State, StateCell},
};
use crate::error::SubscriberError;
use crate::events::{Bus, RuntimeEvent, RuntimeEventKind};
use crate::handlers::HandlerRef;
use crate::message::{
    EventFilter, MessageType, SubscribeRequest, UnsubscribeRequest, codec,
};
use crate::observers::{Observe, ObserverSet};
use crate::transport::ConnectionRef;

/// Event subscriber bound to one connection.
///
/// Built with [`Subscriber::builder`]. Handlers are registered while the
/// subscriber is `Created`; once [`start`](Subscriber::start) runs, the
/// registry is frozen and further registration fails with
/// [`SubscriberError::AlreadyStarted`].
pub struct Subscriber {
    cfg: Config,
    conn: ConnectionRef,
    state: StateCell,
    pending: Mutex<Option<Registry>>,
    hooks: Hooks,
    ack: Arc<AckSignal>,
    bus: Bus,
    observers: Mutex<Vec<Arc<dyn Observe>>>,

    closed: AtomicBool,
    done: CancellationToken,
    signal_listener: Mutex<Option<JoinHandle<()>>>,
}

impl Subscriber {
    /// Returns a builder for the given configuration.
    pub fn builder(cfg: Config) -> SubscriberBuilder {
        SubscriberBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        conn: ConnectionRef,
        hooks: Hooks,
        observers: Vec<Arc<dyn Observe>>,
    ) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Self {
            cfg,
            conn,
            state: StateCell::new(),
            pending: Mutex::new(Some(Registry::new())),
            hooks,
            ack: Arc::new(AckSignal::new()),
            bus,
            observers: Mutex::new(observers),
            closed: AtomicBool::new(false),
            done: CancellationToken::new(),
            signal_listener: Mutex::new(None),
        }
    }

    /// Declares a subscription to `event_type` and appends `handler` to its chain.
    ///
    /// Filters are forwarded verbatim in the subscribe request.
    pub fn subscribe(
        &self,
        event_type: &str,
        handler: HandlerRef,
        filters: Vec<EventFilter>,
    ) -> Result<(), SubscriberError> {
        let mut pending = lock(&self.pending);
        let registry = pending.as_mut().ok_or(SubscriberError::AlreadyStarted)?;
        registry.subscribe(event_type, handler, filters);
        Ok(())
    }

    /// Appends `handler` to the chain of `event_type` without a new subscription.
    pub fn handle_func(&self, event_type: &str, handler: HandlerRef) -> Result<(), SubscriberError> {
        let mut pending = lock(&self.pending);
        let registry = pending.as_mut().ok_or(SubscriberError::AlreadyStarted)?;
        registry.handle_func(event_type, handler);
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.state.get()
    }

    /// Configuration the subscriber was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Receiver of runtime events published from now on.
    pub fn events(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.bus.subscribe()
    }

    /// Resolves once teardown has run.
    pub async fn closed(&self) {
        self.done.cancelled().await
    }

    /// `Created → Running`: launches the receive loop and sends the subscribe request.
    ///
    /// Returns the correlation id of the request. If the request cannot be
    /// encoded or sent, the subscriber is closed and the error returned.
    pub async fn start(&self, markers: Vec<String>) -> Result<String, SubscriberError> {
        let registry = self.claim()?;
        self.launch(registry, markers).await
    }

    /// Takes the pending registry; only one caller ever succeeds.
    fn claim(&self) -> Result<Registry, SubscriberError> {
        if self.state.get() != State::Created {
            return Err(SubscriberError::AlreadyStarted);
        }
        lock(&self.pending)
            .take()
            .ok_or(SubscriberError::AlreadyStarted)
    }

    async fn launch(&self, registry: Registry, markers: Vec<String>) -> Result<String, SubscriberError> {
        let (subscriptions, handlers) = registry.freeze();

        self.observer_listener();

        let router = Arc::new(Router::new(
            handlers,
            self.hooks.clone(),
            Arc::clone(&self.ack),
            self.bus.clone(),
        ));
        tokio::spawn(receive_loop(
            Arc::clone(&self.conn),
            router,
            self.bus.clone(),
        ));

        let request = SubscribeRequest {
            last_known_block_ids: markers,
            subscriptions,
        };
        let correlation_id = match self.send_request(MessageType::SubscribeRequest, &request).await {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, "failed to send subscribe request");
                self.close();
                return Err(e);
            }
        };
        debug!(correlation_id = %correlation_id, "subscribe request sent");
        self.bus.publish(
            RuntimeEvent::new(RuntimeEventKind::SubscribeSent)
                .with_correlation_id(correlation_id.as_str()),
        );

        if !self.state.advance(State::Created, State::Running) {
            debug!(state = %self.state.get(), "closed while starting");
        }
        Ok(correlation_id)
    }

    /// `Running → Unsubscribing → Closed`: unsubscribe handshake followed by teardown.
    ///
    /// Waits for the acknowledgment at most [`Config::wait`]; whichever of the
    /// acknowledgment and the timer fires first wins; a zero wait expires at
    /// once. A failed unsubscribe send skips the wait. Teardown always runs.
    pub async fn shutdown(&self) -> Result<(), SubscriberError> {
        if !self.state.advance(State::Running, State::Unsubscribing) {
            return Err(SubscriberError::NotRunning);
        }
        self.bus
            .publish(RuntimeEvent::new(RuntimeEventKind::ShutdownRequested));

        let ack = self.ack.take_receiver();
        match self
            .send_request(MessageType::UnsubscribeRequest, &UnsubscribeRequest::default())
            .await
        {
            Ok(correlation_id) => {
                debug!(correlation_id = %correlation_id, "unsubscribe request sent");
                self.await_ack(ack).await;
            }
            Err(e) => error!(error = %e, "failed to send unsubscribe request"),
        }

        self.close();
        Ok(())
    }

    /// Idempotent teardown.
    ///
    /// The first call runs the `on_close` hook, stops the interrupt source,
    /// closes the acknowledgment signal and the connection, then moves to
    /// `Closed`. A panic in any step is logged and the remaining steps still
    /// run. Later and concurrent calls return immediately.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Some(hook) = &self.hooks.on_close {
            guarded("on_close", || hook());
        }
        guarded("interrupt", || {
            if let Some(listener) = lock(&self.signal_listener).take() {
                listener.abort();
            }
        });
        guarded("ack", || {
            self.ack.close();
        });
        guarded("connection", || self.conn.close());

        lock(&self.pending).take();
        let previous = self.state.close();
        self.bus.publish(
            RuntimeEvent::new(RuntimeEventKind::Closed).with_reason(previous.as_label()),
        );
        self.done.cancel();
        info!(from = %previous, "subscriber closed");
    }

    /// Starts, waits for `interrupt`, then shuts down.
    ///
    /// Teardown is guaranteed even when `start` fails or this future is dropped.
    /// Returns early without the handshake if the subscriber is closed by
    /// other means first. A call rejected with
    /// [`AlreadyStarted`](SubscriberError::AlreadyStarted) leaves the
    /// subscriber untouched.
    pub async fn run_until(
        &self,
        markers: Vec<String>,
        interrupt: CancellationToken,
    ) -> Result<(), SubscriberError> {
        let registry = self.claim()?;
        self.run_claimed(registry, markers, interrupt).await
    }

    /// [`run_until`](Self::run_until) with process termination signals as the interrupt.
    pub async fn run(&self, markers: Vec<String>) -> Result<(), SubscriberError> {
        let registry = self.claim()?;
        let interrupt = CancellationToken::new();
        *lock(&self.signal_listener) = Some(shutdown::interrupt_on_signal(interrupt.clone()));
        self.run_claimed(registry, markers, interrupt).await
    }

    async fn run_claimed(
        &self,
        registry: Registry,
        markers: Vec<String>,
        interrupt: CancellationToken,
    ) -> Result<(), SubscriberError> {
        let _teardown = Teardown(self);
        self.launch(registry, markers).await?;

        tokio::select! {
            _ = interrupt.cancelled() => info!("got interrupted"),
            _ = self.done.cancelled() => return Ok(()),
        }

        if let Err(e) = self.shutdown().await {
            debug!(error = %e, "shutdown skipped");
        }
        Ok(())
    }

    async fn send_request<T: serde::Serialize>(
        &self,
        message_type: MessageType,
        body: &T,
    ) -> Result<String, SubscriberError> {
        let payload = codec::encode(message_type.as_label(), body)?;
        Ok(self.conn.send(message_type, payload).await?)
    }

    /// Races the acknowledgment against the configured wait.
    async fn await_ack(&self, ack: Option<oneshot::Receiver<()>>) {
        let wait = self.cfg.wait;
        let Some(ack) = ack else {
            debug!("acknowledgment signal already released");
            return;
        };

        tokio::select! {
            res = ack => match res {
                Ok(()) => {
                    info!("unsubscribe acknowledged");
                    self.bus.publish(RuntimeEvent::new(RuntimeEventKind::UnsubscribeAcked));
                }
                Err(_) => debug!("acknowledgment signal closed"),
            },
            _ = tokio::time::sleep(wait) => {
                warn!(wait = ?wait, "timed out waiting for unsubscribe acknowledgment");
                self.bus.publish(
                    RuntimeEvent::new(RuntimeEventKind::UnsubscribeTimedOut)
                        .with_reason(format!("{wait:?}")),
                );
            }
        }
    }

    /// Forwards bus events to the observer set until `Closed` is seen.
    fn observer_listener(&self) {
        let observers = std::mem::take(&mut *lock(&self.observers));
        if observers.is_empty() {
            return;
        }
        let mut rx = self.bus.subscribe();
        let set = ObserverSet::new(observers, self.bus.clone());

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) if ev.is_observer_event() => {}
                    Ok(ev) => {
                        set.emit(&ev);
                        if ev.kind == RuntimeEventKind::Closed {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "observer listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            set.shutdown().await;
        });
    }
}

/// Runs [`Subscriber::close`] when dropped.
struct Teardown<'a>(&'a Subscriber);

impl Drop for Teardown<'_> {
    fn drop(&mut self) {
        self.0.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::HandlerFn;
    use crate::message::{
        BLOCK_COMMIT, Event, EventList, SubscribeResponse, UnsubscribeResponse, codec,
    };
    use crate::transport::memory::{self, RemotePeer};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::time::Instant;

    fn setup(wait: Duration) -> (Arc<Subscriber>, RemotePeer, Arc<AtomicUsize>) {
        let closes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&closes);
        let mut cfg = Config::new("memory");
        cfg.wait = wait;

        let (conn, peer) = memory::pair("validator");
        let sub = Subscriber::builder(cfg)
            .on_close(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .build(conn);
        (sub, peer, closes)
    }

    fn unsubscribe_ack() -> Vec<u8> {
        codec::encode("ack", &UnsubscribeResponse::ok()).unwrap()
    }

    #[tokio::test]
    async fn test_subscribe_request_carries_markers_and_subscriptions() {
        let (sub, mut peer, _) = setup(Duration::from_secs(1));
        sub.subscribe(
            BLOCK_COMMIT,
            HandlerFn::arc("h", |_: &str, _: &Event| true),
            vec![EventFilter::simple_any("block_num", "1")],
        )
        .unwrap();
        sub.handle_func(BLOCK_COMMIT, HandlerFn::arc("h2", |_: &str, _: &Event| true))
            .unwrap();

        let id = sub.start(vec!["b0".into()]).await.unwrap();
        assert_eq!(sub.state(), State::Running);

        let sent = peer.next_sent().await.unwrap();
        assert_eq!(sent.message_type, MessageType::SubscribeRequest);
        assert_eq!(sent.correlation_id, id);
        let req: SubscribeRequest = codec::decode("req", &sent.payload).unwrap();
        assert_eq!(req.last_known_block_ids, vec!["b0".to_string()]);
        assert_eq!(req.subscriptions.len(), 1);
        assert_eq!(req.subscriptions[0].event_type, BLOCK_COMMIT);

        sub.close();
    }

    #[tokio::test]
    async fn test_registration_after_start_is_rejected() {
        let (sub, _peer, _) = setup(Duration::from_secs(1));
        sub.start(Vec::new()).await.unwrap();

        let h = HandlerFn::arc("late", |_: &str, _: &Event| true);
        assert!(matches!(
            sub.subscribe("x", h.clone(), Vec::new()),
            Err(SubscriberError::AlreadyStarted)
        ));
        assert!(matches!(
            sub.handle_func("x", h),
            Err(SubscriberError::AlreadyStarted)
        ));
        assert!(matches!(
            sub.start(Vec::new()).await,
            Err(SubscriberError::AlreadyStarted)
        ));
        sub.close();
    }

    #[tokio::test]
    async fn test_failed_subscribe_send_closes() {
        let (sub, peer, closes) = setup(Duration::from_secs(1));
        peer.reject_sends(true);

        let err = sub.start(Vec::new()).await.unwrap_err();
        assert!(matches!(err, SubscriberError::Transport(_)));
        assert_eq!(sub.state(), State::Closed);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(peer.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ack_wins_race() {
        let (sub, mut peer, closes) = setup(Duration::from_secs(5));
        sub.start(Vec::new()).await.unwrap();
        peer.next_sent().await.unwrap();

        let validator = tokio::spawn(async move {
            let sent = peer.next_sent().await.unwrap();
            assert_eq!(sent.message_type, MessageType::UnsubscribeRequest);
            tokio::time::sleep(Duration::from_secs(1)).await;
            peer.push(MessageType::UnsubscribeResponse, unsubscribe_ack());
            peer
        });

        let started = Instant::now();
        sub.shutdown().await.unwrap();
        let elapsed = started.elapsed();

        assert!(elapsed >= Duration::from_secs(1), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(5), "{elapsed:?}");
        assert_eq!(sub.state(), State::Closed);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(validator.await.unwrap().is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_wins_race() {
        let (sub, _peer, closes) = setup(Duration::from_millis(200));
        let mut events = sub.events();
        sub.start(Vec::new()).await.unwrap();

        let started = Instant::now();
        sub.shutdown().await.unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(200), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(1), "{elapsed:?}");
        assert_eq!(sub.state(), State::Closed);
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        let kinds: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
            .map(|ev| ev.kind)
            .collect();
        assert!(kinds.contains(&RuntimeEventKind::UnsubscribeTimedOut));
        assert!(!kinds.contains(&RuntimeEventKind::UnsubscribeAcked));
        assert!(kinds.contains(&RuntimeEventKind::Closed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_unsubscribe_send_skips_wait() {
        let (sub, peer, closes) = setup(Duration::from_secs(30));
        sub.start(Vec::new()).await.unwrap();
        peer.reject_sends(true);

        let started = Instant::now();
        sub.shutdown().await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_requires_running() {
        let (sub, _peer, _) = setup(Duration::from_secs(1));
        assert!(matches!(
            sub.shutdown().await,
            Err(SubscriberError::NotRunning)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_close_tears_down_once() {
        let (sub, peer, closes) = setup(Duration::from_secs(1));
        sub.start(Vec::new()).await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let sub = Arc::clone(&sub);
            tasks.push(tokio::spawn(async move { sub.close() }));
        }
        for t in tasks {
            t.await.unwrap();
        }
        sub.close();

        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert_eq!(sub.state(), State::Closed);
        assert!(peer.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_delivers_events_then_unsubscribes() {
        let (sub, mut peer, closes) = setup(Duration::from_secs(5));
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        sub.subscribe(
            BLOCK_COMMIT,
            HandlerFn::arc("count", move |_: &str, _: &Event| {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            }),
            Vec::new(),
        )
        .unwrap();

        let interrupt = CancellationToken::new();
        let trigger = interrupt.clone();
        let validator = tokio::spawn(async move {
            let sent = peer.next_sent().await.unwrap();
            assert_eq!(sent.message_type, MessageType::SubscribeRequest);
            peer.push(
                MessageType::SubscribeResponse,
                codec::encode("resp", &SubscribeResponse::ok()).unwrap(),
            );
            let batch = EventList::new(vec![Event::new(BLOCK_COMMIT), Event::new(BLOCK_COMMIT)]);
            peer.push(MessageType::EventBatch, codec::encode("batch", &batch).unwrap());

            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();

            let sent = peer.next_sent().await.unwrap();
            assert_eq!(sent.message_type, MessageType::UnsubscribeRequest);
            peer.push(MessageType::UnsubscribeResponse, unsubscribe_ack());
            peer
        });

        sub.run_until(Vec::new(), interrupt).await.unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert_eq!(sub.state(), State::Closed);
        assert!(validator.await.unwrap().is_closed());
    }

    #[tokio::test]
    async fn test_run_until_returns_when_closed_elsewhere() {
        let (sub, _peer, closes) = setup(Duration::from_secs(5));
        let interrupt = CancellationToken::new();

        let run = tokio::spawn({
            let sub = Arc::clone(&sub);
            async move { sub.run_until(Vec::new(), interrupt).await }
        });
        while sub.state() != State::Running {
            tokio::task::yield_now().await;
        }
        sub.close();

        run.await.unwrap().unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_peer_disconnect_stops_receive_loop() {
        let (sub, peer, _) = setup(Duration::from_secs(1));
        let mut events = sub.events();
        sub.start(Vec::new()).await.unwrap();

        peer.disconnect();
        loop {
            let ev = events.recv().await.unwrap();
            if ev.kind == RuntimeEventKind::ReceiveLoopStopped {
                assert_eq!(ev.reason.as_deref(), Some("connection closed"));
                break;
            }
        }
        assert_eq!(sub.state(), State::Running);
        sub.close();
    }

    fn drain(events: &mut broadcast::Receiver<RuntimeEvent>) -> Vec<RuntimeEventKind> {
        std::iter::from_fn(|| events.try_recv().ok())
            .map(|ev| ev.kind)
            .collect()
    }

    fn count(kinds: &[RuntimeEventKind], kind: RuntimeEventKind) -> usize {
        kinds.iter().filter(|k| **k == kind).count()
    }

    #[tokio::test]
    async fn test_rejected_run_leaves_running_subscriber_alone() {
        let (sub, peer, closes) = setup(Duration::from_secs(1));
        sub.start(Vec::new()).await.unwrap();

        let res = sub.run_until(Vec::new(), CancellationToken::new()).await;
        assert!(matches!(res, Err(SubscriberError::AlreadyStarted)));
        let res = sub.run(Vec::new()).await;
        assert!(matches!(res, Err(SubscriberError::AlreadyStarted)));

        assert_eq!(sub.state(), State::Running);
        assert_eq!(closes.load(Ordering::SeqCst), 0);
        assert!(!peer.is_closed());
        assert!(lock(&sub.signal_listener).is_none());
        sub.close();
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_wait_times_out_at_once() {
        let (sub, _peer, closes) = setup(Duration::ZERO);
        let mut events = sub.events();
        sub.start(Vec::new()).await.unwrap();

        let started = Instant::now();
        sub.shutdown().await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(1));

        let kinds = drain(&mut events);
        assert_eq!(count(&kinds, RuntimeEventKind::UnsubscribeTimedOut), 1);
        assert_eq!(count(&kinds, RuntimeEventKind::Closed), 1);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_during_unsubscribe_wait_tears_down_once() {
        let (sub, mut peer, closes) = setup(Duration::from_secs(5));
        let mut events = sub.events();
        sub.start(Vec::new()).await.unwrap();
        peer.next_sent().await.unwrap();

        let handshake = tokio::spawn({
            let sub = Arc::clone(&sub);
            async move { sub.shutdown().await }
        });
        let sent = peer.next_sent().await.unwrap();
        assert_eq!(sent.message_type, MessageType::UnsubscribeRequest);

        let started = Instant::now();
        tokio::time::sleep(Duration::from_secs(1)).await;
        sub.close();
        handshake.await.unwrap().unwrap();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(sub.state(), State::Closed);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(peer.is_closed());

        let kinds = drain(&mut events);
        assert_eq!(count(&kinds, RuntimeEventKind::Closed), 1);
        assert_eq!(count(&kinds, RuntimeEventKind::UnsubscribeTimedOut), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_ack_and_close_race_tears_down_once() {
        for _ in 0..20 {
            let (sub, mut peer, closes) = setup(Duration::from_secs(5));
            let mut events = sub.events();
            sub.start(Vec::new()).await.unwrap();
            peer.next_sent().await.unwrap();

            let handshake = tokio::spawn({
                let sub = Arc::clone(&sub);
                async move { sub.shutdown().await }
            });
            peer.next_sent().await.unwrap();

            let closer = tokio::spawn({
                let sub = Arc::clone(&sub);
                async move { sub.close() }
            });
            peer.push(MessageType::UnsubscribeResponse, unsubscribe_ack());

            handshake.await.unwrap().unwrap();
            closer.await.unwrap();

            assert_eq!(sub.state(), State::Closed);
            assert_eq!(closes.load(Ordering::SeqCst), 1);
            assert!(peer.is_closed());
            assert_eq!(count(&drain(&mut events), RuntimeEventKind::Closed), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_run_until_mid_handshake_tears_down_once() {
        let (sub, mut peer, closes) = setup(Duration::from_secs(5));
        let interrupt = CancellationToken::new();
        let run = tokio::spawn({
            let sub = Arc::clone(&sub);
            let interrupt = interrupt.clone();
            async move { sub.run_until(Vec::new(), interrupt).await }
        });

        peer.next_sent().await.unwrap();
        interrupt.cancel();
        let sent = peer.next_sent().await.unwrap();
        assert_eq!(sent.message_type, MessageType::UnsubscribeRequest);
        assert_eq!(sub.state(), State::Unsubscribing);

        run.abort();
        assert!(run.await.unwrap_err().is_cancelled());
        sub.close();

        assert_eq!(sub.state(), State::Closed);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(peer.is_closed());
    }

    struct SetOnDrop(Arc<AtomicBool>);

    impl Drop for SetOnDrop {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_run_aborts_signal_listener_on_close() {
        let (sub, mut peer, closes) = setup(Duration::from_secs(1));
        let run = tokio::spawn({
            let sub = Arc::clone(&sub);
            async move { sub.run(Vec::new()).await }
        });
        peer.next_sent().await.unwrap();

        // Swap the OS listener for one whose abort is observable.
        let aborted = Arc::new(AtomicBool::new(false));
        let flag = SetOnDrop(Arc::clone(&aborted));
        let stand_in = tokio::spawn(async move {
            let _flag = flag;
            std::future::pending::<()>().await
        });
        let installed = lock(&sub.signal_listener).replace(stand_in);
        installed.expect("run installs a signal listener").abort();

        sub.close();
        run.await.unwrap().unwrap();
        assert!(lock(&sub.signal_listener).is_none());

        for _ in 0..100 {
            if aborted.load(Ordering::SeqCst) {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(aborted.load(Ordering::SeqCst));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
