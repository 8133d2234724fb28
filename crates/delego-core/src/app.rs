//! App builder - wires the store adapters into a shared application handle.

use std::sync::Arc;

use crate::prelude::*;
use delego_types::store::{ContactSettingStore, DelegateStore, FilterStore};

/// Shared handle over the wired store adapters. Cheap to clone.
#[derive(Clone, Debug)]
pub struct App {
	pub contact_setting_store: Arc<dyn ContactSettingStore>,
	pub delegate_store: Arc<dyn DelegateStore>,
	pub filter_store: Arc<dyn FilterStore>,
}

#[derive(Default)]
pub struct AppBuilder {
	contact_setting_store: Option<Arc<dyn ContactSettingStore>>,
	delegate_store: Option<Arc<dyn DelegateStore>>,
	filter_store: Option<Arc<dyn FilterStore>>,
}

impl AppBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn contact_setting_store(&mut self, store: Arc<dyn ContactSettingStore>) -> &mut Self {
		self.contact_setting_store = Some(store);
		self
	}

	pub fn delegate_store(&mut self, store: Arc<dyn DelegateStore>) -> &mut Self {
		self.delegate_store = Some(store);
		self
	}

	pub fn filter_store(&mut self, store: Arc<dyn FilterStore>) -> &mut Self {
		self.filter_store = Some(store);
		self
	}

	pub fn build(&mut self) -> DgResult<App> {
		Ok(App {
			contact_setting_store: self
				.contact_setting_store
				.take()
				.ok_or_else(|| Error::validation("contact setting store is required"))?,
			delegate_store: self
				.delegate_store
				.take()
				.ok_or_else(|| Error::validation("delegate store is required"))?,
			filter_store: self
				.filter_store
				.take()
				.ok_or_else(|| Error::validation("filter store is required"))?,
		})
	}
}

/// Initializes the global tracing subscriber from `RUST_LOG`.
///
/// Call once from the embedding binary; safe to call again (subsequent calls
/// are no-ops).
pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_target(false)
		.try_init();
}

// vim: ts=4
