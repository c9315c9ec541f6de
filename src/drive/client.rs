//! # Storage Client Seam
//!
//! The storage SDK is external. Everything this crate needs from it is the
//! [`StorageClient`] trait (upload one file into an account) and a
//! [`DriveFactory`] that binds a client to a connection and a wallet identity.
//!
//! A [`DriveHandle`] is what the provider publishes: a cheap, cloneable,
//! read-only reference to one constructed client plus what it was bound to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use super::connection::RpcConnection;
use super::wallet::WalletIdentity;
use crate::common::account::AccountId;
use crate::common::error::DriveError;
use crate::common::file::SelectedFile;

/// What the storage network reports back for a finished upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Public URL of the stored file
    pub location: String,
    /// Any non-fatal messages returned alongside the upload
    #[serde(default)]
    pub errors: Vec<String>,
}

/// The operations the upload flow needs from a storage SDK client.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Upload `file` into the storage account `account`.
    async fn upload_file(
        &self,
        account: &AccountId,
        file: &SelectedFile,
    ) -> Result<UploadReceipt, DriveError>;
}

/// Builds storage clients bound to a connection and a signer.
pub trait DriveFactory: Send + Sync {
    fn build(
        &self,
        connection: &RpcConnection,
        identity: &WalletIdentity,
    ) -> Result<Arc<dyn StorageClient>, DriveError>;
}

/// A constructed client and the binding it was built for.
#[derive(Clone)]
pub struct DriveHandle {
    id: Uuid,
    client: Arc<dyn StorageClient>,
    connection: RpcConnection,
    owner: AccountId,
}

impl DriveHandle {
    pub fn new(client: Arc<dyn StorageClient>, connection: RpcConnection, owner: AccountId) -> Self {
        Self {
            id: Uuid::new_v4(),
            client,
            connection,
            owner,
        }
    }

    /// Unique per construction; a rebuilt client gets a new id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn connection(&self) -> &RpcConnection {
        &self.connection
    }

    /// Public key of the wallet this client signs with.
    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    /// True if this handle was built for exactly this connection and identity.
    pub fn is_bound_to(&self, connection: &RpcConnection, identity: &WalletIdentity) -> bool {
        self.connection == *connection && self.owner == identity.public_key
    }

    pub async fn upload_file(
        &self,
        account: &AccountId,
        file: &SelectedFile,
    ) -> Result<UploadReceipt, DriveError> {
        self.client.upload_file(account, file).await
    }
}

impl fmt::Debug for DriveHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriveHandle")
            .field("id", &self.id)
            .field("connection", &self.connection)
            .field("owner", &self.owner)
            .finish()
    }
}
