//! # HTTP Front-End
//!
//! [`routes`] holds the API that drives an upload session; the
//! `web_server` binary wires it to a listener and the static front-end.

pub mod routes;

pub use routes::{router, AppState};
