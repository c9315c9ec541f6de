//! # Client Provider
//!
//! Owns the single shared storage client. The client exists only while the
//! wallet is connected and is rebuilt whenever the connection or the wallet
//! identity changes.
//!
//! ## States
//!
//! ```text
//! Absent --(wallet connects)--> Ready(handle)
//! Ready  --(connection / identity changes)--> Ready(new handle)
//! Ready  --(wallet disconnects | build fails)--> Absent
//! ```
//!
//! The current state lives in a `watch` cell. Consumers get a read-only
//! [`DriveConsumer`] from [`DriveProvider::consumer`]; once the provider is
//! dropped every consumer reports [`DriveError::ProviderMissing`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! let wallet = KeypairWallet::from_config(&config.wallet)?;
//! let connection = ConnectionSource::new(RpcConnection::from(&config.network));
//! let factory = Arc::new(LocalDriveFactory::new(config.storage.clone()));
//!
//! let provider = DriveProvider::start(factory, &wallet, &connection);
//! let consumer = provider.consumer();
//! ```

use log::{error, info, warn};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::client::{DriveFactory, DriveHandle};
use super::connection::{ConnectionSource, RpcConnection};
use super::wallet::{WalletAdapter, WalletState};
use crate::common::error::DriveError;

/// What the provider currently publishes.
#[derive(Debug, Clone, Default)]
pub enum ClientState {
    #[default]
    Absent,
    Ready(DriveHandle),
}

impl ClientState {
    pub fn handle(&self) -> Option<&DriveHandle> {
        match self {
            ClientState::Ready(handle) => Some(handle),
            ClientState::Absent => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ClientState::Ready(_))
    }
}

/// Build a client for the current connection and wallet state.
///
/// # Returns
/// - `Ok(None)`: the wallet is not connected
/// - `Ok(Some(handle))`: a client bound to `connection` and the wallet's identity
/// - `Err`: the factory failed
pub fn acquire(
    connection: &RpcConnection,
    wallet: &WalletState,
    factory: &dyn DriveFactory,
) -> Result<Option<DriveHandle>, DriveError> {
    let Some(identity) = wallet.identity() else {
        return Ok(None);
    };

    let client = factory.build(connection, identity)?;
    Ok(Some(DriveHandle::new(
        client,
        connection.clone(),
        identity.public_key.clone(),
    )))
}

struct Inner {
    cell: watch::Sender<ClientState>,
    // one refresh at a time, so a slower one never publishes a stale binding
    refreshing: Mutex<()>,
    factory: Arc<dyn DriveFactory>,
    wallet: watch::Receiver<WalletState>,
    connection: watch::Receiver<RpcConnection>,
}

impl Inner {
    fn refresh(&self) -> Result<ClientState, DriveError> {
        let _refreshing = self.refreshing.lock().unwrap_or_else(|e| e.into_inner());
        let wallet = self.wallet.borrow().clone();
        let connection = self.connection.borrow().clone();

        // Same binding as the published handle: nothing to rebuild
        if let (ClientState::Ready(handle), Some(identity)) =
            (&*self.cell.borrow(), wallet.identity())
        {
            if handle.is_bound_to(&connection, identity) {
                return Ok(ClientState::Ready(handle.clone()));
            }
        }

        match acquire(&connection, &wallet, self.factory.as_ref()) {
            Ok(Some(handle)) => {
                info!(
                    "✅ Storage client {} ready for {} on {}",
                    handle.id(),
                    handle.owner(),
                    connection
                );
                let state = ClientState::Ready(handle);
                self.cell.send_replace(state.clone());
                Ok(state)
            }
            Ok(None) => {
                if self.cell.borrow().is_ready() {
                    info!("Wallet disconnected, releasing storage client");
                }
                self.cell.send_replace(ClientState::Absent);
                Ok(ClientState::Absent)
            }
            Err(e) => {
                error!("❌ Failed to build storage client: {}", e);
                self.cell.send_replace(ClientState::Absent);
                Err(e)
            }
        }
    }
}

/// Owner of the shared storage client.
///
/// Dropping the provider stops its follow task and invalidates all consumers.
pub struct DriveProvider {
    inner: Arc<Inner>,
    follower: Option<JoinHandle<()>>,
}

impl DriveProvider {
    /// Create a provider and build the first client if the wallet is already connected.
    ///
    /// The provider does not react to later changes until [`follow`](Self::follow)
    /// is called; [`start`](Self::start) does both.
    pub fn new(
        factory: Arc<dyn DriveFactory>,
        wallet: &dyn WalletAdapter,
        connection: &ConnectionSource,
    ) -> Self {
        let (cell, _) = watch::channel(ClientState::Absent);
        let inner = Arc::new(Inner {
            cell,
            refreshing: Mutex::new(()),
            factory,
            wallet: wallet.subscribe(),
            connection: connection.subscribe(),
        });

        // Failure is already logged and leaves the cell Absent
        let _ = inner.refresh();

        Self {
            inner,
            follower: None,
        }
    }

    /// Create a provider that follows wallet and connection changes.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(
        factory: Arc<dyn DriveFactory>,
        wallet: &dyn WalletAdapter,
        connection: &ConnectionSource,
    ) -> Self {
        let mut provider = Self::new(factory, wallet, connection);
        provider.follow();
        provider
    }

    /// Spawn the task that rebuilds the client on every wallet or connection change.
    pub fn follow(&mut self) {
        if self.follower.is_some() {
            return;
        }

        let weak = Arc::downgrade(&self.inner);
        let wallet = self.inner.wallet.clone();
        let connection = self.inner.connection.clone();
        self.follower = Some(tokio::spawn(follow_changes(weak, wallet, connection)));
    }

    /// Re-evaluate the wallet and connection now.
    ///
    /// # Errors
    /// Returns the factory error if building the client failed; the published
    /// state is `Absent` in that case.
    pub fn refresh(&self) -> Result<ClientState, DriveError> {
        self.inner.refresh()
    }

    pub fn state(&self) -> ClientState {
        self.inner.cell.borrow().clone()
    }

    pub fn connection(&self) -> RpcConnection {
        self.inner.connection.borrow().clone()
    }

    /// Hand out a read-only view of the shared client.
    pub fn consumer(&self) -> DriveConsumer {
        DriveConsumer {
            inner: Arc::downgrade(&self.inner),
            state: self.inner.cell.subscribe(),
        }
    }
}

impl Drop for DriveProvider {
    fn drop(&mut self) {
        if let Some(follower) = self.follower.take() {
            follower.abort();
        }
        self.inner.cell.send_replace(ClientState::Absent);
    }
}

async fn follow_changes(
    inner: Weak<Inner>,
    mut wallet: watch::Receiver<WalletState>,
    mut connection: watch::Receiver<RpcConnection>,
) {
    loop {
        let alive = tokio::select! {
            changed = wallet.changed() => changed.is_ok(),
            changed = connection.changed() => changed.is_ok(),
        };
        if !alive {
            warn!("Wallet or connection source closed, provider stops following");
            break;
        }

        let Some(inner) = inner.upgrade() else {
            break;
        };
        // refresh logs its own failures
        let _ = inner.refresh();
    }
}

/// Read-only access to the provider's shared client.
#[derive(Clone)]
pub struct DriveConsumer {
    inner: Weak<Inner>,
    state: watch::Receiver<ClientState>,
}

impl DriveConsumer {
    /// The state currently published by the provider.
    ///
    /// # Errors
    /// [`DriveError::ProviderMissing`] if the provider has been dropped.
    pub fn current(&self) -> Result<ClientState, DriveError> {
        if self.inner.strong_count() == 0 {
            return Err(DriveError::ProviderMissing);
        }
        Ok(self.state.borrow().clone())
    }

    /// The connection the provider is following.
    pub fn connection(&self) -> Result<RpcConnection, DriveError> {
        let inner = self.inner.upgrade().ok_or(DriveError::ProviderMissing)?;
        let connection = inner.connection.borrow().clone();
        Ok(connection)
    }

    /// Wait until a client is ready, up to `timeout`.
    ///
    /// # Returns
    /// - `Ok(Some(handle))`: a client became (or already was) ready
    /// - `Ok(None)`: the timeout elapsed first
    /// - `Err`: the provider went away
    pub async fn wait_ready(&mut self, timeout: Duration) -> Result<Option<DriveHandle>, DriveError> {
        if self.inner.strong_count() == 0 {
            return Err(DriveError::ProviderMissing);
        }

        match tokio::time::timeout(timeout, self.state.wait_for(ClientState::is_ready)).await {
            Ok(Ok(state)) => Ok(state.handle().cloned()),
            Ok(Err(_)) => Err(DriveError::ProviderMissing),
            Err(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::account::AccountId;
    use crate::drive::client::{StorageClient, UploadReceipt};
    use crate::drive::wallet::{KeypairWallet, WalletIdentity};
    use crate::common::file::SelectedFile;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    const KEY: &str = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";
    const WAIT: Duration = Duration::from_secs(2);

    struct NullClient;

    #[async_trait]
    impl StorageClient for NullClient {
        async fn upload_file(
            &self,
            _account: &AccountId,
            _file: &SelectedFile,
        ) -> Result<UploadReceipt, DriveError> {
            Ok(UploadReceipt {
                location: String::new(),
                errors: Vec::new(),
            })
        }
    }

    #[derive(Default)]
    struct CountingFactory {
        builds: AtomicUsize,
        fail: AtomicBool,
    }

    impl DriveFactory for CountingFactory {
        fn build(
            &self,
            _connection: &RpcConnection,
            _identity: &WalletIdentity,
        ) -> Result<Arc<dyn StorageClient>, DriveError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(DriveError::Construction("rpc unreachable".to_string()));
            }
            self.builds.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(NullClient))
        }
    }

    fn fixtures() -> (Arc<CountingFactory>, KeypairWallet, ConnectionSource) {
        (
            Arc::new(CountingFactory::default()),
            KeypairWallet::new(AccountId::parse(KEY).unwrap()),
            ConnectionSource::new(RpcConnection::new("http://127.0.0.1:8899", "confirmed")),
        )
    }

    #[test]
    fn acquire_is_none_while_disconnected() {
        let (factory, _, connection) = fixtures();
        let handle = acquire(&connection.current(), &WalletState::Disconnected, factory.as_ref()).unwrap();
        assert!(handle.is_none());
        assert_eq!(factory.builds.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn builds_once_on_connect_and_tears_down_on_disconnect() {
        let (factory, wallet, connection) = fixtures();
        let provider = DriveProvider::start(factory.clone(), &wallet, &connection);
        let mut consumer = provider.consumer();

        assert!(!consumer.current().unwrap().is_ready());

        wallet.connect();
        let handle = consumer.wait_ready(WAIT).await.unwrap().expect("client never became ready");
        assert_eq!(handle.owner().as_str(), KEY);
        assert_eq!(factory.builds.load(Ordering::SeqCst), 1);

        // No change in binding: no rebuild
        provider.refresh().unwrap();
        assert_eq!(factory.builds.load(Ordering::SeqCst), 1);

        wallet.disconnect();
        let mut rx = consumer.state.clone();
        tokio::time::timeout(WAIT, rx.wait_for(|s| !s.is_ready()))
            .await
            .unwrap()
            .unwrap();
        assert!(!consumer.current().unwrap().is_ready());
    }

    #[tokio::test]
    async fn rebuilds_when_connection_changes() {
        let (factory, wallet, connection) = fixtures();
        wallet.connect();
        let provider = DriveProvider::start(factory.clone(), &wallet, &connection);
        let first = provider.state().handle().cloned().unwrap();

        connection.replace(RpcConnection::new("http://127.0.0.1:9999", "confirmed"));

        let mut rx = provider.consumer().state.clone();
        let state = tokio::time::timeout(
            WAIT,
            rx.wait_for(|s| s.handle().map(|h| h.id() != first.id()).unwrap_or(false)),
        )
        .await
        .unwrap()
        .unwrap()
        .clone();

        assert_eq!(state.handle().unwrap().connection().endpoint, "http://127.0.0.1:9999");
        assert_eq!(factory.builds.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn construction_failure_leaves_absent_and_reports() {
        let (factory, wallet, connection) = fixtures();
        factory.fail.store(true, Ordering::SeqCst);
        wallet.connect();

        let provider = DriveProvider::new(factory.clone(), &wallet, &connection);
        assert!(!provider.state().is_ready());
        assert!(matches!(provider.refresh(), Err(DriveError::Construction(_))));

        factory.fail.store(false, Ordering::SeqCst);
        assert!(provider.refresh().unwrap().is_ready());
    }

    #[tokio::test]
    async fn consumer_outlived_provider_is_misuse() {
        let (factory, wallet, connection) = fixtures();
        wallet.connect();
        let provider = DriveProvider::start(factory, &wallet, &connection);
        let mut consumer = provider.consumer();
        assert!(consumer.current().unwrap().is_ready());

        drop(provider);

        assert!(matches!(consumer.current(), Err(DriveError::ProviderMissing)));
        assert!(matches!(consumer.connection(), Err(DriveError::ProviderMissing)));
        assert!(matches!(
            consumer.wait_ready(WAIT).await,
            Err(DriveError::ProviderMissing)
        ));
    }
}
