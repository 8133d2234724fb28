#![allow(dead_code)]

use std::sync::Arc;

use delego_core::{App, AppBuilder};
use delego_store_adapter_sqlite::StoreAdapterSqlite;
use delego_types::store::{
	ContactChannel, ContactMethod, CreateContactSetting, CreateFilter, Operator, Rule,
};
use tempfile::TempDir;

pub const MUNICIPALITY: &str = "2281";

pub async fn create_test_app() -> (App, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");

	let adapter = Arc::new(
		StoreAdapterSqlite::new(temp_dir.path().join("delego.db"))
			.await
			.expect("Failed to create store adapter"),
	);

	let app = AppBuilder::new()
		.contact_setting_store(adapter.clone())
		.delegate_store(adapter.clone())
		.filter_store(adapter)
		.build()
		.expect("Failed to build app");

	(app, temp_dir)
}

/// Creates a real (party-owned) contact setting and returns its id.
pub async fn create_setting(app: &App, municipality_id: &str, party_id: &str) -> Box<str> {
	let setting = delego_core::contact_setting::create(
		app,
		municipality_id,
		&CreateContactSetting {
			party_id: Some(party_id.into()),
			alias: Some(format!("setting for {}", party_id).into()),
			..Default::default()
		},
	)
	.await
	.expect("Failed to create contact setting");

	setting.id
}

pub fn channel(destination: &str) -> ContactChannel {
	ContactChannel {
		contact_method: ContactMethod::Sms,
		alias: "mobile".into(),
		destination: destination.into(),
		disabled: false,
	}
}

pub fn rule(name: &str, operator: Operator, value: &str) -> Rule {
	Rule { attribute_name: name.into(), operator, attribute_value: value.into() }
}

pub fn filter_with_rules(rules: Vec<Rule>) -> CreateFilter {
	CreateFilter { alias: None, channel: None, rules }
}

// vim: ts=4
