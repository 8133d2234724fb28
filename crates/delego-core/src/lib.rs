#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

//! Core services of the Delego contact delegation platform.
//!
//! Three components, leaves first:
//! - [`matching`] — the pure filter evaluation engine,
//! - [`delegate`] — the delegation graph manager (Delegate/Filter lifecycle),
//! - [`contact_setting`] — the cascade coordinator for ContactSetting
//!   lifecycle including virtual children.
//!
//! All services operate through the store adapter traits wired into [`app::App`].

pub mod app;
pub mod contact_setting;
pub mod delegate;
pub mod matching;
mod prelude;

pub use crate::app::{App, AppBuilder};

// vim: ts=4
