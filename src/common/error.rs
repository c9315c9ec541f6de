//! # Error Taxonomy
//!
//! Library-level error types. Binaries and configuration loading use
//! `anyhow::Result` instead.
//!
//! - [`ValidationError`]: the user submitted without something the upload needs.
//!   Recovered locally and shown as an error notification.
//! - [`DriveError`]: failures coming from (or around) the storage client.
//! - [`PickError`]: the file picker refused a candidate file.

use thiserror::Error;

/// Reasons a submit is refused before any storage call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select a file to upload.")]
    NoFile,

    #[error("Please select a storage account.")]
    NoAccount,

    #[error("Invalid storage account.")]
    InvalidAccount,

    #[error("Please connect your wallet.")]
    WalletNotConnected,
}

/// Errors raised by storage clients and the client provider.
#[derive(Error, Debug)]
pub enum DriveError {
    /// The storage client rejected or failed an upload.
    #[error("Upload failed: {0}")]
    Upload(String),

    /// The factory could not build a client for the current wallet/connection.
    #[error("Failed to construct storage client: {0}")]
    Construction(String),

    /// A consumer was used after its provider went away.
    #[error("Storage client consumed outside of its provider")]
    ProviderMissing,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons the file picker rejects a candidate.
#[derive(Error, Debug)]
pub enum PickError {
    #[error("File is too large: {size} bytes (max: {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("No file was provided")]
    NoFiles,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_are_user_facing() {
        assert_eq!(
            ValidationError::NoFile.to_string(),
            "Please select a file to upload."
        );
        assert_eq!(
            ValidationError::NoAccount.to_string(),
            "Please select a storage account."
        );
    }
}
