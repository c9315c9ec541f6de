//! # Upload Session
//!
//! The state machine behind the upload modal.
//!
//! ## Phases
//!
//! ```text
//! Idle --pick--> FileSelected --submit--> Submitting --> Succeeded
//!                     ^                               \-> Failed
//!                     '------------- pick ------------'
//! ```
//!
//! ## Submit
//!
//! 1. Only one submission may be in flight; a second one gets
//!    [`SubmitOutcome::Busy`] and changes nothing.
//! 2. Guards, in order: a file is selected, an account is selected, the
//!    account is a valid address, the provider has a client ready. A failed
//!    guard shows an error notification and leaves the phase alone.
//! 3. Shows "Uploading file...", calls the shared client exactly once with
//!    the current account and file, then shows success or a generic error.
//!    The storage error itself is only logged.
//!
//! The selection and the modal are left as they are after an attempt.
//!
//! ## Concurrency
//!
//! The session is cheap to clone and shares its state. The state mutex is
//! never held across the upload call.

use log::{error, info, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use uuid::Uuid;

use super::metrics::UploadMetrics;
use super::modal::Modal;
use crate::common::account::AccountId;
use crate::common::config::SessionConfig;
use crate::common::error::{DriveError, ValidationError};
use crate::common::file::SelectedFile;
use crate::common::notification::{Notification, NotificationCenter};
use crate::drive::client::{DriveHandle, UploadReceipt};
use crate::drive::provider::{ClientState, DriveConsumer};

pub const UPLOADING_MESSAGE: &str = "Uploading file...";
pub const SUCCESS_MESSAGE: &str = "File uploaded successfully!";
pub const FAILURE_MESSAGE: &str = "Error uploading file.";
/// Footer shown under the upload form.
pub const FEE_NOTE: &str = "There are no fees for uploading files to ShdwDrive.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    Idle,
    FileSelected,
    Submitting,
    Succeeded,
    Failed,
}

/// Result of one call to [`UploadSession::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The storage client accepted the file
    Uploaded(UploadReceipt),
    /// A guard failed; no upload was attempted
    Rejected(ValidationError),
    /// The storage client failed; details are in the log only
    Failed,
    /// Another submission is still in flight
    Busy,
}

/// Name and size of the current selection, as shown under the drop zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionSummary {
    pub name: String,
    pub size: u64,
    pub size_label: String,
    pub mime: String,
}

impl From<&SelectedFile> for SelectionSummary {
    fn from(file: &SelectedFile) -> Self {
        Self {
            name: file.name().to_string(),
            size: file.size(),
            size_label: format!("{} b", file.size()),
            mime: file.mime().to_string(),
        }
    }
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: UploadPhase,
    pub modal_open: bool,
    pub uploading: bool,
    pub account: Option<String>,
    pub selection: Option<SelectionSummary>,
    pub notification: Notification,
    pub last_location: Option<String>,
    pub fee_note: &'static str,
}

struct SessionState {
    phase: UploadPhase,
    selection: Option<SelectedFile>,
    account: Option<String>,
    modal: Modal,
    last_receipt: Option<UploadReceipt>,
}

struct SessionInner {
    state: Mutex<SessionState>,
    in_flight: AtomicBool,
    notifications: NotificationCenter,
    drive: DriveConsumer,
    reset_on_close: bool,
    metrics: Option<Arc<Mutex<UploadMetrics>>>,
}

/// Clears the in-flight flag however the submission ends, including when the
/// submitting future is dropped mid-upload.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One upload modal's worth of state, bound to the provider's shared client.
#[derive(Clone)]
pub struct UploadSession {
    inner: Arc<SessionInner>,
}

impl UploadSession {
    pub fn new(drive: DriveConsumer, config: &SessionConfig) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                state: Mutex::new(SessionState {
                    phase: UploadPhase::Idle,
                    selection: None,
                    account: None,
                    modal: Modal::default(),
                    last_receipt: None,
                }),
                in_flight: AtomicBool::new(false),
                notifications: NotificationCenter::new(),
                drive,
                reset_on_close: config.reset_on_close,
                metrics: None,
            }),
        }
    }

    /// Record every attempt that reaches the storage client.
    ///
    /// Must be called before the session is cloned.
    pub fn with_metrics(mut self, metrics: Arc<Mutex<UploadMetrics>>) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.metrics = Some(metrics);
        } else {
            warn!("Session already shared, metrics not attached");
        }
        self
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.inner.notifications
    }

    pub fn notification(&self) -> Notification {
        self.inner.notifications.current()
    }

    pub fn phase(&self) -> UploadPhase {
        self.state().phase
    }

    pub fn is_uploading(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    pub fn selection(&self) -> Option<SelectedFile> {
        self.state().selection.clone()
    }

    pub fn account(&self) -> Option<String> {
        self.state().account.clone()
    }

    pub fn is_modal_open(&self) -> bool {
        self.state().modal.is_open()
    }

    pub fn last_receipt(&self) -> Option<UploadReceipt> {
        self.state().last_receipt.clone()
    }

    pub fn selection_summary(&self) -> Option<SelectionSummary> {
        self.state().selection.as_ref().map(SelectionSummary::from)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let notification = self.notification();
        let uploading = self.is_uploading();
        let state = self.state();
        SessionSnapshot {
            phase: state.phase,
            modal_open: state.modal.is_open(),
            uploading,
            account: state.account.clone(),
            selection: state.selection.as_ref().map(SelectionSummary::from),
            notification,
            last_location: state.last_receipt.as_ref().map(|r| r.location.clone()),
            fee_note: FEE_NOTE,
        }
    }

    /// Set (or clear) the target storage account supplied by the caller.
    pub fn set_account(&self, account: Option<String>) {
        self.state().account = account;
    }

    /// Replace the current selection.
    ///
    /// The picker has already applied its limits; nothing is checked here.
    pub fn pick_file(&self, file: SelectedFile) {
        info!("Selected {} ({} bytes)", file.name(), file.size());
        let mut state = self.state();
        state.selection = Some(file);
        // an in-flight upload keeps its own copy and settles the phase itself
        if state.phase != UploadPhase::Submitting {
            state.phase = UploadPhase::FileSelected;
        }
    }

    pub fn dismiss_notification(&self) {
        self.inner.notifications.dismiss();
    }

    pub fn open_modal(&self) {
        self.state().modal.open();
    }

    pub fn close_modal(&self) {
        let closed = self.state().modal.close();
        if closed {
            self.reset_after_close();
        }
    }

    /// Feed a pointer press to the modal; an outside press closes it.
    ///
    /// Returns true if the press closed the modal.
    pub fn pointer_down(&self, inside_modal: bool) -> bool {
        let closed = self.state().modal.pointer_down(inside_modal);
        if closed {
            self.reset_after_close();
        }
        closed
    }

    /// Clear the modal's contents if configured to.
    ///
    /// Skipped while an upload is in flight: its outcome would land in the
    /// cleared session anyway.
    fn reset_after_close(&self) {
        if !self.inner.reset_on_close {
            return;
        }

        {
            // checked under the lock: a submit validates under it too
            let mut state = self.state();
            if self.is_uploading() {
                info!("Modal closed during an upload, keeping its state");
                return;
            }
            state.selection = None;
            state.last_receipt = None;
            state.phase = UploadPhase::Idle;
        }
        self.inner.notifications.dismiss();
    }

    fn reject(&self, reason: ValidationError) -> SubmitOutcome {
        warn!("Upload refused: {}", reason);
        self.inner
            .notifications
            .show(Notification::error(reason.to_string()));
        SubmitOutcome::Rejected(reason)
    }

    fn validate(&self) -> Result<(SelectedFile, AccountId), ValidationError> {
        let state = self.state();
        let file = state.selection.clone().ok_or(ValidationError::NoFile)?;
        let raw = state.account.as_deref().ok_or(ValidationError::NoAccount)?;
        let account = AccountId::parse(raw)?;
        Ok((file, account))
    }

    /// Upload the current selection to the current account.
    ///
    /// # Errors
    /// Only [`DriveError::ProviderMissing`]: the session outlived the provider
    /// it was built from. Every user-facing failure is reported through the
    /// returned [`SubmitOutcome`] and the notification slot instead.
    pub async fn submit(&self) -> Result<SubmitOutcome, DriveError> {
        if self
            .inner
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Upload already in progress, ignoring submit");
            return Ok(SubmitOutcome::Busy);
        }
        let _in_flight = InFlight(&self.inner.in_flight);

        let (file, account) = match self.validate() {
            Ok(checked) => checked,
            Err(reason) => return Ok(self.reject(reason)),
        };

        let handle = match self.inner.drive.current()? {
            ClientState::Ready(handle) => handle,
            ClientState::Absent => return Ok(self.reject(ValidationError::WalletNotConnected)),
        };

        Ok(self.upload(handle, account, file).await)
    }

    async fn upload(&self, handle: DriveHandle, account: AccountId, file: SelectedFile) -> SubmitOutcome {
        let attempt_id = Uuid::new_v4();
        self.state().phase = UploadPhase::Submitting;
        self.inner
            .notifications
            .show(Notification::pending(UPLOADING_MESSAGE));

        info!(
            "📤 Upload {} started: {} ({} bytes) -> {}",
            attempt_id,
            file.name(),
            file.size(),
            account
        );

        let started = Instant::now();
        let result = handle.upload_file(&account, &file).await;
        let latency = started.elapsed();

        if let Some(metrics) = &self.inner.metrics {
            let failure = result.as_ref().err().map(|e| e.to_string());
            metrics
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .record_attempt(attempt_id, file.size(), latency, failure.is_none(), failure);
        }

        match result {
            Ok(receipt) => {
                info!(
                    "✅ Upload {} finished in {}ms: {}",
                    attempt_id,
                    latency.as_millis(),
                    receipt.location
                );
                for message in &receipt.errors {
                    warn!("Upload {} reported: {}", attempt_id, message);
                }
                {
                    let mut state = self.state();
                    state.phase = UploadPhase::Succeeded;
                    state.last_receipt = Some(receipt.clone());
                }
                self.inner
                    .notifications
                    .show(Notification::success(SUCCESS_MESSAGE));
                SubmitOutcome::Uploaded(receipt)
            }
            Err(e) => {
                error!("❌ Upload {} failed: {}", attempt_id, e);
                self.state().phase = UploadPhase::Failed;
                self.inner
                    .notifications
                    .show(Notification::error(FAILURE_MESSAGE));
                SubmitOutcome::Failed
            }
        }
    }
}
