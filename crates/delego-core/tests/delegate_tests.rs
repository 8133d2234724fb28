//! Delegation graph manager tests: delegate uniqueness, endpoint checks,
//! and the filter lifecycle including last-filter-deletes-delegate.

mod common;

use common::*;
use delego_core::delegate;
use delego_types::error::Error;
use delego_types::store::{CreateDelegate, FindDelegatesOptions, Operator, UpdateFilter};
use delego_types::types::Patch;

fn create_delegate_data(principal_id: &str, agent_id: &str) -> CreateDelegate {
	CreateDelegate {
		principal_id: principal_id.into(),
		agent_id: agent_id.into(),
		filters: vec![filter_with_rules(vec![rule("caseId", Operator::Equals, "789")])],
	}
}

#[tokio::test]
async fn test_create_and_read_delegate() {
	let (app, _temp) = create_test_app().await;
	let principal = create_setting(&app, MUNICIPALITY, "party-p").await;
	let agent = create_setting(&app, MUNICIPALITY, "party-a").await;

	let created =
		delegate::create_delegate(&app, MUNICIPALITY, &create_delegate_data(&principal, &agent))
			.await
			.unwrap();
	assert_eq!(created.principal_id, principal);
	assert_eq!(created.agent_id, agent);
	assert_eq!(created.filters.len(), 1);

	let read = delegate::read_delegate(&app, MUNICIPALITY, &created.id).await.unwrap();
	assert_eq!(read.id, created.id);
	assert_eq!(read.filters.len(), 1);
	assert_eq!(read.filters[0].rules, created.filters[0].rules);
}

#[tokio::test]
async fn test_create_delegate_unknown_endpoint_fails() {
	let (app, _temp) = create_test_app().await;
	let principal = create_setting(&app, MUNICIPALITY, "party-p").await;

	let result =
		delegate::create_delegate(&app, MUNICIPALITY, &create_delegate_data(&principal, "missing"))
			.await;
	assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_create_delegate_endpoint_in_other_municipality_fails() {
	let (app, _temp) = create_test_app().await;
	let principal = create_setting(&app, MUNICIPALITY, "party-p").await;
	let agent = create_setting(&app, "1480", "party-a").await;

	// The agent exists, but not within the requested municipality
	let result =
		delegate::create_delegate(&app, MUNICIPALITY, &create_delegate_data(&principal, &agent))
			.await;
	assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_duplicate_delegate_conflict() {
	let (app, _temp) = create_test_app().await;
	let principal = create_setting(&app, MUNICIPALITY, "party-p").await;
	let agent = create_setting(&app, MUNICIPALITY, "party-a").await;

	delegate::create_delegate(&app, MUNICIPALITY, &create_delegate_data(&principal, &agent))
		.await
		.unwrap();

	let second =
		delegate::create_delegate(&app, MUNICIPALITY, &create_delegate_data(&principal, &agent))
			.await;
	assert!(matches!(second, Err(Error::Conflict(_))));

	// The reverse edge is a different pair and is allowed
	delegate::create_delegate(&app, MUNICIPALITY, &create_delegate_data(&agent, &principal))
		.await
		.unwrap();
}

#[tokio::test]
async fn test_self_delegation_is_permitted() {
	let (app, _temp) = create_test_app().await;
	let setting = create_setting(&app, MUNICIPALITY, "party-p").await;

	let created =
		delegate::create_delegate(&app, MUNICIPALITY, &create_delegate_data(&setting, &setting))
			.await
			.unwrap();
	assert_eq!(created.principal_id, created.agent_id);
}

#[tokio::test]
async fn test_create_delegate_with_empty_rules_fails() {
	let (app, _temp) = create_test_app().await;
	let principal = create_setting(&app, MUNICIPALITY, "party-p").await;
	let agent = create_setting(&app, MUNICIPALITY, "party-a").await;

	let data = CreateDelegate {
		principal_id: principal.clone(),
		agent_id: agent.clone(),
		filters: vec![filter_with_rules(vec![])],
	};
	let result = delegate::create_delegate(&app, MUNICIPALITY, &data).await;
	assert!(matches!(result, Err(Error::ValidationError(_))));
}

#[tokio::test]
async fn test_create_delegate_without_filters_is_allowed() {
	let (app, _temp) = create_test_app().await;
	let principal = create_setting(&app, MUNICIPALITY, "party-p").await;
	let agent = create_setting(&app, MUNICIPALITY, "party-a").await;

	let data = CreateDelegate {
		principal_id: principal.clone(),
		agent_id: agent.clone(),
		filters: vec![],
	};
	let created = delegate::create_delegate(&app, MUNICIPALITY, &data).await.unwrap();
	assert!(created.filters.is_empty());
}

#[tokio::test]
async fn test_find_delegates_requires_an_endpoint() {
	let (app, _temp) = create_test_app().await;

	let result =
		delegate::find_delegates(&app, MUNICIPALITY, &FindDelegatesOptions::default()).await;
	assert!(matches!(result, Err(Error::ValidationError(_))));
}

#[tokio::test]
async fn test_find_delegates_by_endpoints() {
	let (app, _temp) = create_test_app().await;
	let p1 = create_setting(&app, MUNICIPALITY, "party-p1").await;
	let p2 = create_setting(&app, MUNICIPALITY, "party-p2").await;
	let agent = create_setting(&app, MUNICIPALITY, "party-a").await;

	delegate::create_delegate(&app, MUNICIPALITY, &create_delegate_data(&p1, &agent))
		.await
		.unwrap();
	delegate::create_delegate(&app, MUNICIPALITY, &create_delegate_data(&p2, &agent))
		.await
		.unwrap();

	let by_agent = delegate::find_delegates(
		&app,
		MUNICIPALITY,
		&FindDelegatesOptions { agent_id: Some(&agent), ..Default::default() },
	)
	.await
	.unwrap();
	assert_eq!(by_agent.len(), 2);

	let by_principal = delegate::find_delegates(
		&app,
		MUNICIPALITY,
		&FindDelegatesOptions { principal_id: Some(&p1), ..Default::default() },
	)
	.await
	.unwrap();
	assert_eq!(by_principal.len(), 1);

	let intersection = delegate::find_delegates(
		&app,
		MUNICIPALITY,
		&FindDelegatesOptions { principal_id: Some(&p2), agent_id: Some(&agent) },
	)
	.await
	.unwrap();
	assert_eq!(intersection.len(), 1);
	assert_eq!(intersection[0].principal_id, p2);

	let unknown = delegate::find_delegates(
		&app,
		MUNICIPALITY,
		&FindDelegatesOptions { principal_id: Some("missing"), ..Default::default() },
	)
	.await;
	assert!(matches!(unknown, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_create_filter_appends() {
	let (app, _temp) = create_test_app().await;
	let principal = create_setting(&app, MUNICIPALITY, "party-p").await;
	let agent = create_setting(&app, MUNICIPALITY, "party-a").await;

	let created =
		delegate::create_delegate(&app, MUNICIPALITY, &create_delegate_data(&principal, &agent))
			.await
			.unwrap();

	let extra = delegate::create_filter(
		&app,
		&created.id,
		&filter_with_rules(vec![rule("city", Operator::Equals, "Y")]),
	)
	.await
	.unwrap();

	let read = delegate::read_delegate(&app, MUNICIPALITY, &created.id).await.unwrap();
	assert_eq!(read.filters.len(), 2);
	assert!(read.filters.iter().any(|f| f.id == extra.id));
}

#[tokio::test]
async fn test_create_filter_on_missing_delegate_fails() {
	let (app, _temp) = create_test_app().await;

	let result = delegate::create_filter(
		&app,
		"missing",
		&filter_with_rules(vec![rule("city", Operator::Equals, "Y")]),
	)
	.await;
	assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_read_filter_under_wrong_delegate_fails() {
	let (app, _temp) = create_test_app().await;
	let p1 = create_setting(&app, MUNICIPALITY, "party-p1").await;
	let p2 = create_setting(&app, MUNICIPALITY, "party-p2").await;
	let agent = create_setting(&app, MUNICIPALITY, "party-a").await;

	let d1 = delegate::create_delegate(&app, MUNICIPALITY, &create_delegate_data(&p1, &agent))
		.await
		.unwrap();
	let d2 = delegate::create_delegate(&app, MUNICIPALITY, &create_delegate_data(&p2, &agent))
		.await
		.unwrap();

	let filter_id = &d1.filters[0].id;
	assert!(delegate::read_filter(&app, &d1.id, filter_id).await.is_ok());

	let crossed = delegate::read_filter(&app, &d2.id, filter_id).await;
	assert!(matches!(crossed, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_update_filter_patch_semantics() {
	let (app, _temp) = create_test_app().await;
	let principal = create_setting(&app, MUNICIPALITY, "party-p").await;
	let agent = create_setting(&app, MUNICIPALITY, "party-a").await;

	let created = delegate::create_delegate(
		&app,
		MUNICIPALITY,
		&CreateDelegate {
			principal_id: principal.clone(),
			agent_id: agent.clone(),
			filters: vec![delego_types::store::CreateFilter {
				alias: Some("original".into()),
				channel: Some("open-e".into()),
				rules: vec![rule("caseId", Operator::Equals, "789")],
			}],
		},
	)
	.await
	.unwrap();
	let filter_id = created.filters[0].id.clone();

	// Replace rules, clear alias, leave channel untouched
	let updated = delegate::update_filter(
		&app,
		&created.id,
		&filter_id,
		&UpdateFilter {
			alias: Patch::Null,
			channel: Patch::Undefined,
			rules: Some(vec![rule("caseId", Operator::NotEquals, "123")]),
		},
	)
	.await
	.unwrap();

	assert_eq!(updated.alias, None);
	assert_eq!(updated.channel.as_deref(), Some("open-e"));
	assert_eq!(updated.rules[0].operator, Operator::NotEquals);
	assert!(updated.modified.is_some());

	// Patching rules to an empty list is rejected
	let emptied = delegate::update_filter(
		&app,
		&created.id,
		&filter_id,
		&UpdateFilter { rules: Some(vec![]), ..Default::default() },
	)
	.await;
	assert!(matches!(emptied, Err(Error::ValidationError(_))));
}

#[tokio::test]
async fn test_delete_one_of_many_filters_keeps_delegate() {
	let (app, _temp) = create_test_app().await;
	let principal = create_setting(&app, MUNICIPALITY, "party-p").await;
	let agent = create_setting(&app, MUNICIPALITY, "party-a").await;

	let created =
		delegate::create_delegate(&app, MUNICIPALITY, &create_delegate_data(&principal, &agent))
			.await
			.unwrap();
	let second = delegate::create_filter(
		&app,
		&created.id,
		&filter_with_rules(vec![rule("city", Operator::Equals, "Y")]),
	)
	.await
	.unwrap();

	delegate::delete_filter(&app, &created.id, &second.id).await.unwrap();

	let read = delegate::read_delegate(&app, MUNICIPALITY, &created.id).await.unwrap();
	assert_eq!(read.filters.len(), 1);
}

#[tokio::test]
async fn test_delete_last_filter_deletes_delegate() {
	let (app, _temp) = create_test_app().await;
	let principal = create_setting(&app, MUNICIPALITY, "party-p").await;
	let agent = create_setting(&app, MUNICIPALITY, "party-a").await;

	let created =
		delegate::create_delegate(&app, MUNICIPALITY, &create_delegate_data(&principal, &agent))
			.await
			.unwrap();

	delegate::delete_filter(&app, &created.id, &created.filters[0].id).await.unwrap();

	let gone = delegate::read_delegate(&app, MUNICIPALITY, &created.id).await;
	assert!(matches!(gone, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_delete_missing_filter_fails() {
	let (app, _temp) = create_test_app().await;
	let principal = create_setting(&app, MUNICIPALITY, "party-p").await;
	let agent = create_setting(&app, MUNICIPALITY, "party-a").await;

	let created =
		delegate::create_delegate(&app, MUNICIPALITY, &create_delegate_data(&principal, &agent))
			.await
			.unwrap();

	let result = delegate::delete_filter(&app, &created.id, "missing").await;
	assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_delete_delegate_removes_it() {
	let (app, _temp) = create_test_app().await;
	let principal = create_setting(&app, MUNICIPALITY, "party-p").await;
	let agent = create_setting(&app, MUNICIPALITY, "party-a").await;

	let created =
		delegate::create_delegate(&app, MUNICIPALITY, &create_delegate_data(&principal, &agent))
			.await
			.unwrap();

	delegate::delete_delegate(&app, MUNICIPALITY, &created.id).await.unwrap();

	let gone = delegate::read_delegate(&app, MUNICIPALITY, &created.id).await;
	assert!(matches!(gone, Err(Error::NotFound(_))));
}

// vim: ts=4
