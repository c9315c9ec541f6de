//! # Local Development Backend
//!
//! A [`StorageClient`] that stores uploads on the local filesystem, laid out
//! the way the storage network addresses them:
//!
//! ```text
//! {root}/{account}/{file name}   ->   {cdn_base}/{account}/{file name}
//! ```
//!
//! It lets the CLI and the web server run end to end without a live network.
//! It performs no signing and charges nothing.

use async_trait::async_trait;
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::client::{DriveFactory, StorageClient, UploadReceipt};
use super::connection::RpcConnection;
use super::wallet::WalletIdentity;
use crate::common::account::AccountId;
use crate::common::config::StorageConfig;
use crate::common::error::DriveError;
use crate::common::file::SelectedFile;

/// Filesystem-backed storage client.
pub struct LocalDrive {
    root: PathBuf,
    cdn_base: String,
    signer: AccountId,
}

impl LocalDrive {
    pub fn new(root: impl Into<PathBuf>, cdn_base: impl Into<String>, signer: AccountId) -> Self {
        Self {
            root: root.into(),
            cdn_base: cdn_base.into().trim_end_matches('/').to_string(),
            signer,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Strip any directory components a client may have sent along with the name.
fn stored_name(name: &str) -> Option<&str> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    match base {
        "" | "." | ".." => None,
        other => Some(other),
    }
}

#[async_trait]
impl StorageClient for LocalDrive {
    async fn upload_file(
        &self,
        account: &AccountId,
        file: &SelectedFile,
    ) -> Result<UploadReceipt, DriveError> {
        let name = stored_name(file.name())
            .ok_or_else(|| DriveError::Upload(format!("invalid file name '{}'", file.name())))?;

        let dir = self.root.join(account.as_str());
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(name);
        tokio::fs::write(&path, file.contents()).await?;

        info!(
            "💾 {} stored {} ({} bytes) at {}",
            self.signer,
            name,
            file.size(),
            path.display()
        );

        Ok(UploadReceipt {
            location: format!("{}/{}/{}", self.cdn_base, account, name),
            errors: Vec::new(),
        })
    }
}

/// Builds [`LocalDrive`] clients from the `[storage]` config section.
pub struct LocalDriveFactory {
    config: StorageConfig,
}

impl LocalDriveFactory {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }
}

impl DriveFactory for LocalDriveFactory {
    fn build(
        &self,
        connection: &RpcConnection,
        identity: &WalletIdentity,
    ) -> Result<Arc<dyn StorageClient>, DriveError> {
        info!(
            "Building local drive client for {} on {}",
            identity.public_key, connection
        );
        Ok(Arc::new(LocalDrive::new(
            self.config.root.clone(),
            self.config.cdn_base.clone(),
            identity.public_key.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> AccountId {
        AccountId::parse("9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin").unwrap()
    }

    #[test]
    fn stored_name_drops_directories() {
        assert_eq!(stored_name("report.pdf"), Some("report.pdf"));
        assert_eq!(stored_name("../../etc/passwd"), Some("passwd"));
        assert_eq!(stored_name("C:\\Users\\me\\a.png"), Some("a.png"));
        assert_eq!(stored_name("dir/"), None);
        assert_eq!(stored_name(".."), None);
    }

    #[tokio::test]
    async fn writes_under_account_directory() {
        let dir = tempfile::tempdir().unwrap();
        let drive = LocalDrive::new(dir.path(), "https://shdw-drive.genesysgo.net/", signer());
        let account = AccountId::parse("Abc123").unwrap();
        let file = SelectedFile::new("report.pdf", "application/pdf", b"%PDF-1.7".to_vec());

        let receipt = drive.upload_file(&account, &file).await.unwrap();

        assert_eq!(
            receipt.location,
            "https://shdw-drive.genesysgo.net/Abc123/report.pdf"
        );
        let stored = std::fs::read(dir.path().join("Abc123").join("report.pdf")).unwrap();
        assert_eq!(stored, b"%PDF-1.7");
    }

    #[tokio::test]
    async fn rejects_unusable_names() {
        let dir = tempfile::tempdir().unwrap();
        let drive = LocalDrive::new(dir.path(), "https://cdn", signer());
        let account = AccountId::parse("Abc123").unwrap();
        let file = SelectedFile::new("..", "image/png", vec![1, 2, 3]);

        assert!(matches!(
            drive.upload_file(&account, &file).await,
            Err(DriveError::Upload(_))
        ));
    }
}
