//! Store adapter traits and the model types they persist.
//!
//! The core never talks to a database directly. Every persistence concern is
//! behind one of three traits (ContactSettings, Delegates, Filters), so any
//! implementation honoring these contracts can back the service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::HashMap;
use std::fmt::Debug;

use crate::error::DgResult;
use crate::types::{Patch, Timestamp};

/// The attribute query matched against delegate filters.
///
/// String-keyed multimap: one attribute may carry several values.
pub type QueryFilter = HashMap<String, Vec<String>>;

/// Reserved attribute name/value marking a match-all rule.
pub const MATCH_ALL: &str = "*";

// ContactSetting //
//****************//

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum ContactMethod {
	#[serde(rename = "SMS")]
	Sms,
	#[serde(rename = "EMAIL")]
	Email,
}

/// A single reachable destination (phone number, email address) of a
/// ContactSetting.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactChannel {
	pub contact_method: ContactMethod,
	pub alias: Box<str>,
	pub destination: Box<str>,
	#[serde(default)]
	pub disabled: bool,
}

/// A routable identity a message may be sent to or from.
///
/// Real settings carry a `party_id`; virtual ones carry none and reference
/// the setting that produced them through `created_by_id`.
#[skip_serializing_none]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSetting {
	pub id: Box<str>,
	pub party_id: Option<Box<str>>,
	pub municipality_id: Box<str>,
	pub alias: Option<Box<str>>,
	pub created_by_id: Option<Box<str>>,
	/// Derived: `party_id.is_none()`. Stored on the struct so it serializes
	/// without a custom impl.
	#[serde(rename = "virtual")]
	pub is_virtual: bool,
	pub channels: Vec<ContactChannel>,
	pub created: Timestamp,
	pub modified: Option<Timestamp>,
}

/// Data needed to create a ContactSetting. At least one of `party_id` and
/// `created_by_id` is required; timestamps are set by the store.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContactSetting {
	pub party_id: Option<Box<str>>,
	pub created_by_id: Option<Box<str>>,
	pub alias: Option<Box<str>>,
	#[serde(default)]
	pub channels: Vec<ContactChannel>,
}

/// Partial update of a ContactSetting. `channels`, when present, replaces
/// the whole channel list.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContactSetting {
	#[serde(default)]
	pub alias: Patch<Box<str>>,
	pub channels: Option<Vec<ContactChannel>>,
}

// Delegate //
//**********//

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum Operator {
	#[serde(rename = "EQUALS")]
	Equals,
	#[serde(rename = "NOT_EQUALS")]
	NotEquals,
}

/// One AND-term of a Filter: a single attribute comparison.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
	pub attribute_name: Box<str>,
	pub operator: Operator,
	pub attribute_value: Box<str>,
}

impl Rule {
	/// The reserved `"*" EQUALS "*"` sentinel, satisfied regardless of the
	/// query's content.
	pub fn is_match_all(&self) -> bool {
		self.operator == Operator::Equals
			&& &*self.attribute_name == MATCH_ALL
			&& &*self.attribute_value == MATCH_ALL
	}
}

/// One OR-branch of a Delegate's activation condition (AND of its rules).
#[skip_serializing_none]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
	pub id: Box<str>,
	pub alias: Option<Box<str>>,
	pub channel: Option<Box<str>>,
	pub rules: Vec<Rule>,
	pub created: Timestamp,
	pub modified: Option<Timestamp>,
}

/// A directed edge of the delegation graph: `agent` acts on behalf of
/// `principal`, gated by `filters`.
#[skip_serializing_none]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Delegate {
	pub id: Box<str>,
	pub principal_id: Box<str>,
	pub agent_id: Box<str>,
	pub filters: Vec<Filter>,
	pub created: Timestamp,
	pub modified: Option<Timestamp>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFilter {
	pub alias: Option<Box<str>>,
	pub channel: Option<Box<str>>,
	pub rules: Vec<Rule>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFilter {
	#[serde(default)]
	pub alias: Patch<Box<str>>,
	#[serde(default)]
	pub channel: Patch<Box<str>>,
	pub rules: Option<Vec<Rule>>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDelegate {
	pub principal_id: Box<str>,
	pub agent_id: Box<str>,
	#[serde(default)]
	pub filters: Vec<CreateFilter>,
}

/// Endpoint selection for delegate queries. At least one side must be given.
#[derive(Clone, Debug, Default)]
pub struct FindDelegatesOptions<'a> {
	pub agent_id: Option<&'a str>,
	pub principal_id: Option<&'a str>,
}

// Store traits //
//**************//

/// Persistence contract for ContactSettings.
///
/// `read_*` methods fail with `Error::NotFound` when no row matches;
/// existence checks return a boolean instead.
#[async_trait]
pub trait ContactSettingStore: Debug + Send + Sync {
	async fn create_contact_setting(
		&self,
		municipality_id: &str,
		data: &CreateContactSetting,
	) -> DgResult<ContactSetting>;

	async fn read_contact_setting(&self, id: &str) -> DgResult<ContactSetting>;

	async fn read_contact_setting_by_party_id(
		&self,
		municipality_id: &str,
		party_id: &str,
	) -> DgResult<ContactSetting>;

	/// All settings created as virtual children of the given setting.
	async fn list_contact_settings_by_created_by_id(
		&self,
		created_by_id: &str,
	) -> DgResult<Vec<ContactSetting>>;

	/// Existence check scoped by municipality.
	async fn contact_setting_exists(&self, municipality_id: &str, id: &str) -> DgResult<bool>;

	async fn update_contact_setting(
		&self,
		id: &str,
		data: &UpdateContactSetting,
	) -> DgResult<ContactSetting>;

	async fn delete_contact_setting(&self, id: &str) -> DgResult<()>;

	/// Batch delete in one transaction. Used by the cascade.
	async fn delete_contact_settings_by_id(&self, ids: &[Box<str>]) -> DgResult<()>;

	async fn list_contact_settings_by_channel_destination(
		&self,
		municipality_id: &str,
		destination: &str,
	) -> DgResult<Vec<ContactSetting>>;
}

/// Persistence contract for Delegates.
#[async_trait]
pub trait DelegateStore: Debug + Send + Sync {
	/// Persists the delegate and its initial filters as a single unit.
	///
	/// The store enforces a uniqueness constraint on
	/// `(principal_id, agent_id)` and rejects the loser of a concurrent
	/// create with `Error::Conflict`.
	async fn create_delegate(&self, data: &CreateDelegate) -> DgResult<Delegate>;

	/// Reads a delegate with its filters attached.
	async fn read_delegate(&self, id: &str) -> DgResult<Delegate>;

	async fn delegate_exists(&self, id: &str) -> DgResult<bool>;

	/// Deletes the delegate and all its filters atomically.
	async fn delete_delegate(&self, id: &str) -> DgResult<()>;

	async fn list_delegates_by_agent_id(&self, agent_id: &str) -> DgResult<Vec<Delegate>>;

	async fn list_delegates_by_principal_id(&self, principal_id: &str) -> DgResult<Vec<Delegate>>;

	async fn list_delegates_by_principal_and_agent(
		&self,
		principal_id: &str,
		agent_id: &str,
	) -> DgResult<Vec<Delegate>>;

	/// Batch delete (with filters) in one transaction. Used by the cascade.
	async fn delete_delegates_by_id(&self, ids: &[Box<str>]) -> DgResult<()>;
}

/// Persistence contract for Filters. Filters are always addressed through
/// their owning delegate.
#[async_trait]
pub trait FilterStore: Debug + Send + Sync {
	async fn create_filter(&self, delegate_id: &str, data: &CreateFilter) -> DgResult<Filter>;

	async fn read_filter(&self, delegate_id: &str, filter_id: &str) -> DgResult<Filter>;

	async fn filter_exists(&self, delegate_id: &str, filter_id: &str) -> DgResult<bool>;

	async fn update_filter(
		&self,
		delegate_id: &str,
		filter_id: &str,
		data: &UpdateFilter,
	) -> DgResult<Filter>;

	async fn count_filters_by_delegate_id(&self, delegate_id: &str) -> DgResult<u32>;

	async fn delete_filter(&self, delegate_id: &str, filter_id: &str) -> DgResult<()>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_match_all_rule() {
		let rule = Rule {
			attribute_name: "*".into(),
			operator: Operator::Equals,
			attribute_value: "*".into(),
		};
		assert!(rule.is_match_all());

		let not_equals = Rule { operator: Operator::NotEquals, ..rule.clone() };
		assert!(!not_equals.is_match_all());

		let named = Rule { attribute_name: "caseId".into(), ..rule };
		assert!(!named.is_match_all());
	}

	#[test]
	fn test_rule_serde_shape() {
		let rule = Rule {
			attribute_name: "caseId".into(),
			operator: Operator::NotEquals,
			attribute_value: "789".into(),
		};
		let json = serde_json::to_value(&rule).unwrap();
		assert_eq!(
			json,
			serde_json::json!({
				"attributeName": "caseId",
				"operator": "NOT_EQUALS",
				"attributeValue": "789",
			})
		);
	}

	#[test]
	fn test_delegate_omits_absent_modified() {
		let delegate = Delegate {
			id: "d1".into(),
			principal_id: "p1".into(),
			agent_id: "a1".into(),
			filters: vec![],
			created: Timestamp(0),
			modified: None,
		};
		let json = serde_json::to_value(&delegate).unwrap();
		assert!(json.get("modified").is_none());
		assert_eq!(json["principalId"], serde_json::json!("p1"));
	}

	#[test]
	fn test_contact_setting_virtual_field() {
		let setting = ContactSetting {
			id: "x1".into(),
			party_id: None,
			municipality_id: "2281".into(),
			alias: None,
			created_by_id: Some("x0".into()),
			is_virtual: true,
			channels: vec![],
			created: Timestamp(0),
			modified: None,
		};
		let json = serde_json::to_value(&setting).unwrap();
		assert_eq!(json["virtual"], serde_json::json!(true));
		// skip_serializing_none drops the absent party_id
		assert!(json.get("partyId").is_none());
	}
}

// vim: ts=4
