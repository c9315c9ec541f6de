//! # Upload Components
//!
//! ## File Picker ([`picker`])
//! Size and MIME limits applied before a file ever reaches the session.
//!
//! ## Upload Session ([`session`])
//! The modal's state machine: selection, account, notification, submit.
//!
//! ## Modal ([`modal`]) and Metrics ([`metrics`])
//! Modal visibility with dismiss-on-outside, and per-attempt upload metrics.

pub mod metrics;
pub mod modal;
pub mod picker;
pub mod session;

// Re-export for convenience
pub use metrics::UploadMetrics;
pub use modal::Modal;
pub use picker::{Candidate, PickerRules};
pub use session::{SubmitOutcome, UploadPhase, UploadSession};
