#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use shdw_upload::common::config::SessionConfig;
use shdw_upload::common::error::DriveError;
use shdw_upload::drive::{
    ConnectionSource, DriveFactory, DriveProvider, KeypairWallet, RpcConnection, StorageClient,
    UploadReceipt, WalletIdentity,
};
use shdw_upload::{AccountId, SelectedFile, UploadSession};

pub const WALLET_KEY: &str = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";
pub const ACCOUNT: &str = "Abc123";

/// One recorded `upload_file` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCall {
    pub account: String,
    pub file_name: String,
    pub size: u64,
}

/// Storage client that records calls and can be told to fail or to hold.
#[derive(Default)]
pub struct RecordingClient {
    calls: Mutex<Vec<UploadCall>>,
    failure: Mutex<Option<String>>,
    hold: AtomicBool,
    pub started: Notify,
    pub release: Notify,
}

impl RecordingClient {
    pub fn calls(&self) -> Vec<UploadCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    /// Make every upload wait for `release` before completing.
    pub fn hold_uploads(&self) {
        self.hold.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl StorageClient for RecordingClient {
    async fn upload_file(
        &self,
        account: &AccountId,
        file: &SelectedFile,
    ) -> Result<UploadReceipt, DriveError> {
        self.calls.lock().unwrap().push(UploadCall {
            account: account.to_string(),
            file_name: file.name().to_string(),
            size: file.size(),
        });
        self.started.notify_one();

        if self.hold.load(Ordering::SeqCst) {
            self.release.notified().await;
        }

        let failure = self.failure.lock().unwrap().clone();
        match failure {
            Some(message) => Err(DriveError::Upload(message)),
            None => Ok(UploadReceipt {
                location: format!("https://shdw-drive.genesysgo.net/{}/{}", account, file.name()),
                errors: Vec::new(),
            }),
        }
    }
}

/// Hands out the same recording client for every build.
pub struct RecordingFactory {
    pub client: Arc<RecordingClient>,
}

impl DriveFactory for RecordingFactory {
    fn build(
        &self,
        _connection: &RpcConnection,
        _identity: &WalletIdentity,
    ) -> Result<Arc<dyn StorageClient>, DriveError> {
        Ok(self.client.clone())
    }
}

pub struct Harness {
    pub client: Arc<RecordingClient>,
    pub wallet: KeypairWallet,
    pub connection: ConnectionSource,
    pub provider: DriveProvider,
    pub session: UploadSession,
}

/// A session whose wallet is already connected and whose client is ready.
pub fn harness(config: SessionConfig) -> Harness {
    let client = Arc::new(RecordingClient::default());
    let wallet = KeypairWallet::new(AccountId::parse(WALLET_KEY).unwrap());
    wallet.connect();
    let connection = ConnectionSource::new(RpcConnection::new("http://127.0.0.1:8899", "confirmed"));

    let provider = DriveProvider::new(
        Arc::new(RecordingFactory {
            client: client.clone(),
        }),
        &wallet,
        &connection,
    );
    let session = UploadSession::new(provider.consumer(), &config);

    Harness {
        client,
        wallet,
        connection,
        provider,
        session,
    }
}

/// `report.pdf`, 2 MiB.
pub fn report_pdf() -> SelectedFile {
    SelectedFile::new("report.pdf", "application/pdf", vec![0u8; 2 * 1024 * 1024])
}
