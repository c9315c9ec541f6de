//! # Upload CLI
//!
//! One-shot upload of a single file through the same session the web front-end uses.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin upload -- --config config/uploader.toml --file ./report.pdf
//! ```
//!
//! With an explicit account and metrics:
//! ```bash
//! cargo run --bin upload -- --config config/uploader.toml --file ./report.pdf \
//!   --account Abc123 --metrics-output ./metrics/upload.json
//! ```
//!
//! The CLI will:
//! 1. Load configuration from the specified TOML file
//! 2. Connect the configured wallet (unless `wallet.auto_connect = false`,
//!    in which case the upload is refused) and start the client provider
//! 3. Run the file through the picker rules (size and type)
//! 4. Submit it and print every notification the session shows
//! 5. Exit non-zero unless the upload succeeded

use anyhow::{bail, Context};
use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use shdw_upload::common::config::UploaderConfig;
use shdw_upload::common::logging::init_logger;
use shdw_upload::common::notification::Notification;
use shdw_upload::drive::{
    ConnectionSource, DriveProvider, KeypairWallet, LocalDriveFactory, RpcConnection,
    WalletAdapter,
};
use shdw_upload::upload::{PickerRules, SubmitOutcome, UploadMetrics, UploadSession};

/// How long to wait for the storage client after connecting the wallet.
const CLIENT_READY_TIMEOUT: Duration = Duration::from_secs(10);

/// Command-line arguments for the upload binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the uploader configuration file (TOML format)
    #[arg(short, long)]
    config: String,

    /// File to upload
    #[arg(short, long)]
    file: PathBuf,

    /// Storage account to upload into (defaults to `storage.default_account`)
    #[arg(short, long)]
    account: Option<String>,

    /// Path to write metrics JSON output (optional)
    #[arg(long)]
    metrics_output: Option<PathBuf>,
}

fn print_notification(notification: &Notification) {
    if let Notification::Visible { message, kind, .. } = notification {
        println!("[{:?}] {}", kind, message);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let args = Args::parse();
    let config = UploaderConfig::from_file(&args.config)
        .with_context(|| format!("loading config from {}", args.config))?;

    // Wallet and connection are the provider's upstream capabilities
    let wallet = KeypairWallet::from_config(&config.wallet)?;
    let connection = ConnectionSource::new(RpcConnection::from(&config.network));

    let factory = Arc::new(LocalDriveFactory::new(config.storage.clone()));
    let provider = DriveProvider::start(factory, &wallet, &connection);

    if wallet.state().is_connected() {
        let mut consumer = provider.consumer();
        if consumer.wait_ready(CLIENT_READY_TIMEOUT).await?.is_none() {
            bail!("storage client not ready after {:?}", CLIENT_READY_TIMEOUT);
        }
    } else {
        warn!("wallet.auto_connect is off, the wallet stays disconnected");
    }

    let metrics = args
        .metrics_output
        .as_ref()
        .map(|_| Arc::new(Mutex::new(UploadMetrics::new("upload-cli".to_string()))));

    let mut session = UploadSession::new(provider.consumer(), &config.session);
    if let Some(metrics) = &metrics {
        session = session.with_metrics(metrics.clone());
    }

    let mut feed = session.notifications().subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(notification) = feed.recv().await {
            print_notification(&notification);
        }
    });

    let picker = PickerRules::from_config(&config.picker);
    let file = picker
        .pick_path(&args.file)
        .await
        .with_context(|| format!("picking {}", args.file.display()))?;

    session.open_modal();
    session.pick_file(file);
    session.set_account(args.account.or(config.storage.default_account.clone()));

    let outcome = session.submit().await?;

    // Closing the feed lets the printer drain and stop
    drop(session);
    let _ = printer.await;

    if let (Some(metrics), Some(path)) = (metrics, args.metrics_output) {
        let metrics = metrics.lock().unwrap_or_else(|e| e.into_inner());
        metrics.export_to_json(&path)?;
        println!("Metrics exported to: {}", path.display());
    }

    match outcome {
        SubmitOutcome::Uploaded(receipt) => {
            info!("File available at {}", receipt.location);
            println!("{}", receipt.location);
            Ok(())
        }
        SubmitOutcome::Rejected(reason) => bail!("upload refused: {}", reason),
        SubmitOutcome::Failed => {
            error!("Upload failed, see log for details");
            bail!("upload failed")
        }
        SubmitOutcome::Busy => bail!("another upload was already in progress"),
    }
}
