//! # RPC Connection
//!
//! The network connection a storage client is bound to. Like the wallet it is
//! supplied from upstream; the provider only needs to know its identity
//! (endpoint + commitment) and to be told when it changes.

use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;

use crate::common::config::NetworkConfig;

/// Identity of an RPC connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcConnection {
    /// JSON-RPC endpoint URL
    pub endpoint: String,
    /// Commitment level requested for reads (e.g. "confirmed")
    pub commitment: String,
}

impl RpcConnection {
    pub fn new(endpoint: impl Into<String>, commitment: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            commitment: commitment.into(),
        }
    }
}

impl From<&NetworkConfig> for RpcConnection {
    fn from(config: &NetworkConfig) -> Self {
        Self::new(config.rpc_endpoint.clone(), config.commitment.clone())
    }
}

impl fmt::Display for RpcConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.endpoint, self.commitment)
    }
}

/// Publishes the current connection to whoever depends on it.
pub struct ConnectionSource {
    current: watch::Sender<RpcConnection>,
}

impl ConnectionSource {
    pub fn new(connection: RpcConnection) -> Self {
        let (current, _) = watch::channel(connection);
        Self { current }
    }

    pub fn current(&self) -> RpcConnection {
        self.current.borrow().clone()
    }

    /// Switch to another connection. Subscribers are only woken on a real change.
    pub fn replace(&self, connection: RpcConnection) {
        let changed = self.current.send_if_modified(|current| {
            if *current == connection {
                false
            } else {
                *current = connection.clone();
                true
            }
        });
        if changed {
            info!("🌐 RPC connection switched to {}", connection);
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<RpcConnection> {
        self.current.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_with_same_connection_is_silent() {
        let source = ConnectionSource::new(RpcConnection::new("http://127.0.0.1:8899", "confirmed"));
        let rx = source.subscribe();

        source.replace(RpcConnection::new("http://127.0.0.1:8899", "confirmed"));
        assert!(!rx.has_changed().unwrap());

        source.replace(RpcConnection::new("http://127.0.0.1:8899", "finalized"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(source.current().commitment, "finalized");
    }
}
