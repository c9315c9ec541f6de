//! Web server for the upload front-end

use clap::Parser;
use log::info;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use shdw_upload::common::config::UploaderConfig;
use shdw_upload::common::logging::init_logger;
use shdw_upload::drive::{
    ConnectionSource, DriveProvider, KeypairWallet, LocalDriveFactory, RpcConnection,
};
use shdw_upload::server::{router, AppState};
use shdw_upload::upload::{PickerRules, UploadSession};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the uploader configuration file (TOML format)
    #[arg(short, long, default_value = "config/uploader.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    info!("🚀 Initializing web server...");

    let args = Args::parse();
    let config = UploaderConfig::from_file(&args.config)?;

    let wallet = Arc::new(KeypairWallet::from_config(&config.wallet)?);
    let connection = ConnectionSource::new(RpcConnection::from(&config.network));
    let factory = Arc::new(LocalDriveFactory::new(config.storage.clone()));
    let provider = Arc::new(DriveProvider::start(factory, wallet.as_ref(), &connection));

    let session = UploadSession::new(provider.consumer(), &config.session);
    session.set_account(config.storage.default_account.clone());

    let state = Arc::new(AppState {
        session,
        picker: PickerRules::from_config(&config.picker),
        wallet,
        provider,
    });

    let app = router(state)
        .fallback_service(ServeDir::new(&config.server.frontend_dir))
        .layer(CorsLayer::permissive());

    let addr = config.server.address.clone();
    info!("🌐 Web server running on http://{}", addr);
    info!("📡 API endpoint: http://{}/api/submit", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
