//! # shdw-upload
//!
//! Upload files to a wallet-bound decentralized storage drive.
//!
//! - [`drive`]: wallet and RPC capabilities, the storage-client seam, and the
//!   provider that lazily builds the shared client once the wallet connects
//! - [`upload`]: file picker rules and the upload session state machine
//! - [`server`]: HTTP API exposing a session to a browser front-end
//! - [`common`]: configuration, logging, errors, accounts, notifications

pub mod common;
pub mod drive;
pub mod server;
pub mod upload;

pub use common::account::AccountId;
pub use common::file::SelectedFile;
pub use common::notification::{Notification, NotificationKind};
pub use drive::{DriveProvider, StorageClient};
pub use upload::{SubmitOutcome, UploadSession};
