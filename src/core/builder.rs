//! # Builder for [`Subscriber`].
//!
//! Collects the lifecycle hooks and observers, then binds them to a
//! connection: either one supplied by the caller ([`SubscriberBuilder::build`])
//! or a TCP connection to [`Config::endpoint`] ([`SubscriberBuilder::connect`]).

use std::sync::Arc;

use super::{
    config::Config,
    hooks::Hooks,
    subscriber::Subscriber,
};
use crate::error::SubscriberError;
use crate::message::{SubscribeResponse, UnsubscribeResponse};
use crate::observers::Observe;
use crate::transport::{ConnectionRef, tcp::TcpConnection};

/// Builder for constructing a [`Subscriber`] with optional hooks and observers.
pub struct SubscriberBuilder {
    cfg: Config,
    hooks: Hooks,
    observers: Vec<Arc<dyn Observe>>,
}

impl SubscriberBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            hooks: Hooks::default(),
            observers: Vec::new(),
        }
    }

    /// Called once when the subscriber closes, whatever triggered the teardown.
    pub fn on_close<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.hooks.on_close = Some(Arc::new(f));
        self
    }

    /// Called on the receive loop with every decoded subscribe response.
    pub fn on_subscribed<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &SubscribeResponse) + Send + Sync + 'static,
    {
        self.hooks.on_subscribed = Some(Arc::new(f));
        self
    }

    /// Called on the receive loop with every decoded unsubscribe response.
    pub fn on_unsubscribed<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &UnsubscribeResponse) + Send + Sync + 'static,
    {
        self.hooks.on_unsubscribed = Some(Arc::new(f));
        self
    }

    /// Sets runtime event observers.
    ///
    /// Each observer gets a dedicated worker and a bounded queue, started
    /// together with the subscriber.
    pub fn with_observers(mut self, observers: Vec<Arc<dyn Observe>>) -> Self {
        self.observers = observers;
        self
    }

    /// Binds the subscriber to an existing connection.
    pub fn build(self, conn: ConnectionRef) -> Arc<Subscriber> {
        Arc::new(Subscriber::new_internal(
            self.cfg,
            conn,
            self.hooks,
            self.observers,
        ))
    }

    /// Connects to [`Config::endpoint`] over TCP and binds the subscriber to it.
    pub async fn connect(self) -> Result<Arc<Subscriber>, SubscriberError> {
        let conn = TcpConnection::connect_with_limit(&self.cfg.endpoint, self.cfg.max_frame_len).await?;
        Ok(self.build(Arc::new(conn)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::State;
    use crate::error::TransportError;

    #[tokio::test]
    async fn test_connect_rejects_bad_endpoint() {
        let res = Subscriber::builder(Config::new("tcp://no-port-here"))
            .connect()
            .await;
        assert!(matches!(
            res,
            Err(SubscriberError::Transport(TransportError::InvalidEndpoint(_)))
        ));
    }

    #[tokio::test]
    async fn test_connect_over_tcp() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept = tokio::spawn(async move { listener.accept().await.unwrap() });

        let sub = Subscriber::builder(Config::new(format!("tcp://{addr}")))
            .connect()
            .await
            .unwrap();
        accept.await.unwrap();
        assert_eq!(sub.state(), State::Created);
        assert_eq!(sub.config().endpoint, format!("tcp://{addr}"));
    }

    #[tokio::test]
    async fn test_close_releases_tcp_socket() {
        use tokio::io::AsyncReadExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let sub = Subscriber::builder(Config::new(format!("tcp://{addr}")))
            .connect()
            .await
            .unwrap();
        let (mut sock, _) = listener.accept().await.unwrap();

        sub.start(Vec::new()).await.unwrap();
        sub.close();
        assert_eq!(sub.state(), State::Closed);

        let mut buf = Vec::new();
        let read = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            sock.read_to_end(&mut buf),
        )
        .await
        .expect("socket still open after close")
        .unwrap();
        assert!(read > 0, "subscribe request was written before close");
    }
}
