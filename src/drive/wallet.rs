//! # Wallet Capability
//!
//! The wallet is an upstream collaborator: something else decides when it
//! connects and which key it holds. This module only models what the client
//! provider needs from it, a connection state that can be observed.
//!
//! [`KeypairWallet`] is the adapter used by the binaries: it knows one public
//! key (from config) and flips between connected and disconnected on command.

use log::info;
use tokio::sync::watch;

use crate::common::account::AccountId;
use crate::common::config::WalletConfig;
use crate::common::error::ValidationError;

/// The identity a connected wallet signs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletIdentity {
    pub public_key: AccountId,
}

/// Connection state reported by a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WalletState {
    #[default]
    Disconnected,
    Connected(WalletIdentity),
}

impl WalletState {
    pub fn is_connected(&self) -> bool {
        matches!(self, WalletState::Connected(_))
    }

    pub fn identity(&self) -> Option<&WalletIdentity> {
        match self {
            WalletState::Connected(identity) => Some(identity),
            WalletState::Disconnected => None,
        }
    }
}

/// Anything that can report wallet connectivity.
pub trait WalletAdapter: Send + Sync {
    fn state(&self) -> WalletState;

    /// Observe every state transition.
    fn subscribe(&self) -> watch::Receiver<WalletState>;
}

/// Wallet backed by a single configured public key.
pub struct KeypairWallet {
    identity: WalletIdentity,
    state: watch::Sender<WalletState>,
}

impl KeypairWallet {
    pub fn new(public_key: AccountId) -> Self {
        let (state, _) = watch::channel(WalletState::Disconnected);
        Self {
            identity: WalletIdentity { public_key },
            state,
        }
    }

    /// Build from the `[wallet]` config section, connecting if `auto_connect` is set.
    pub fn from_config(config: &WalletConfig) -> Result<Self, ValidationError> {
        let wallet = Self::new(AccountId::parse(&config.public_key)?);
        if config.auto_connect {
            wallet.connect();
        }
        Ok(wallet)
    }

    pub fn connect(&self) {
        let next = WalletState::Connected(self.identity.clone());
        let changed = self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next.clone();
                true
            }
        });
        if changed {
            info!("🔌 Wallet {} connected", self.identity.public_key);
        }
    }

    pub fn disconnect(&self) {
        let changed = self.state.send_if_modified(|current| {
            if current.is_connected() {
                *current = WalletState::Disconnected;
                true
            } else {
                false
            }
        });
        if changed {
            info!("🔌 Wallet {} disconnected", self.identity.public_key);
        }
    }

    pub fn identity(&self) -> &WalletIdentity {
        &self.identity
    }
}

impl WalletAdapter for KeypairWallet {
    fn state(&self) -> WalletState {
        self.state.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<WalletState> {
        self.state.subscribe()
    }
}
