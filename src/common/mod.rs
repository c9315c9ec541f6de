//! # Common Components
//!
//! Shared utilities and data structures used by the drive, upload and server layers.
//!
//! ## Modules
//!
//! - [`account`]: Validated storage account identifiers
//! - [`config`]: Configuration parsing utilities
//! - [`error`]: Error taxonomy
//! - [`file`]: The picked file and its display metadata
//! - [`logging`]: Logger setup for the binaries
//! - [`notification`]: The single-slot user notification

pub mod account;
pub mod config;
pub mod error;
pub mod file;
pub mod logging;
pub mod notification;
