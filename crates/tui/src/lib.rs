//! Terminal client for the ledger API.
//!
//! [`controller::Controller`] holds the session and keeps the rendered views
//! in sync with the server; [`app::App`] is the terminal front-end driving it.

pub mod app;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod session;
pub mod ui;
