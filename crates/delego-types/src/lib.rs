//! Shared types, store adapter traits, and error types for Delego.
//!
//! This crate contains the foundational types that are shared between the
//! core service crate and all store adapter implementations. Extracting
//! these into a separate crate allows adapter crates to compile in parallel
//! with the service logic.

pub mod error;
pub mod prelude;
pub mod store;
pub mod types;
pub mod utils;

// vim: ts=4
