//! # Drive Components
//!
//! Everything between the upload flow and the external storage SDK.
//!
//! ## Wallet & Connection ([`wallet`], [`connection`])
//! Upstream capabilities the storage client is bound to. Both are observable
//! so the provider can react when they change.
//!
//! ## Storage Client ([`client`], [`local`])
//! The SDK seam (`StorageClient`, `DriveFactory`) and a filesystem-backed
//! development backend.
//!
//! ## Client Provider ([`provider`])
//! Lazily builds the single shared client once the wallet connects and
//! publishes it to read-only consumers.

pub mod client;
pub mod connection;
pub mod local;
pub mod provider;
pub mod wallet;

// Re-export for convenience
pub use client::{DriveFactory, DriveHandle, StorageClient, UploadReceipt};
pub use connection::{ConnectionSource, RpcConnection};
pub use local::{LocalDrive, LocalDriveFactory};
pub use provider::{acquire, ClientState, DriveConsumer, DriveProvider};
pub use wallet::{KeypairWallet, WalletAdapter, WalletIdentity, WalletState};
