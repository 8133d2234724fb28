//! Delegation graph manager.
//!
//! Creates, reads and deletes Delegate edges between ContactSettings and
//! owns the Filter lifecycle, including the rule that removing the last
//! filter removes the delegate itself.

use crate::contact_setting::ensure_setting_in_municipality;
use crate::prelude::*;
use delego_types::store::{
	CreateDelegate, CreateFilter, Delegate, Filter, FindDelegatesOptions, Rule, UpdateFilter,
};

/// Creates a delegate once both endpoints resolve within the municipality.
///
/// Fails with `Conflict` when a delegate already exists for the
/// `(principal_id, agent_id)` pair. Self-delegation is permitted. The
/// delegate and its initial filters are persisted as a single unit; an
/// empty filter list is allowed and matches every query.
pub async fn create_delegate(
	app: &App,
	municipality_id: &str,
	data: &CreateDelegate,
) -> DgResult<Delegate> {
	validate_rules(data.filters.iter().map(|f| f.rules.as_slice()))?;

	ensure_setting_in_municipality(app, municipality_id, &data.principal_id).await?;
	ensure_setting_in_municipality(app, municipality_id, &data.agent_id).await?;

	let existing = app
		.delegate_store
		.list_delegates_by_principal_and_agent(&data.principal_id, &data.agent_id)
		.await?;
	if !existing.is_empty() {
		return Err(Error::conflict(format!(
			"delegate already exists for principal {} and agent {}",
			data.principal_id, data.agent_id
		)));
	}

	let delegate = app.delegate_store.create_delegate(data).await?;

	info!(
		delegate_id = %delegate.id,
		principal_id = %delegate.principal_id,
		agent_id = %delegate.agent_id,
		filters = delegate.filters.len(),
		"Created delegate"
	);

	Ok(delegate)
}

/// Reads a delegate. Tenant isolation is enforced through the endpoints:
/// the delegate resolves only when both of its ContactSettings belong to
/// the requested municipality.
pub async fn read_delegate(app: &App, municipality_id: &str, id: &str) -> DgResult<Delegate> {
	let delegate = app.delegate_store.read_delegate(id).await?;

	let principal_ok = app
		.contact_setting_store
		.contact_setting_exists(municipality_id, &delegate.principal_id)
		.await?;
	let agent_ok = app
		.contact_setting_store
		.contact_setting_exists(municipality_id, &delegate.agent_id)
		.await?;
	if !principal_ok || !agent_ok {
		return Err(Error::not_found("Delegate", id));
	}

	Ok(delegate)
}

/// Deletes a delegate and all of its filters.
pub async fn delete_delegate(app: &App, municipality_id: &str, id: &str) -> DgResult<()> {
	let delegate = read_delegate(app, municipality_id, id).await?;
	app.delegate_store.delete_delegate(&delegate.id).await?;

	info!(delegate_id = %id, "Deleted delegate");
	Ok(())
}

/// Finds delegates by agent, principal, or the intersection of both.
/// Every provided endpoint is existence-checked within the municipality.
pub async fn find_delegates(
	app: &App,
	municipality_id: &str,
	opts: &FindDelegatesOptions<'_>,
) -> DgResult<Vec<Delegate>> {
	match (opts.principal_id, opts.agent_id) {
		(None, None) => {
			Err(Error::validation("at least one of agentId and principalId is required"))
		}
		(Some(principal_id), None) => {
			ensure_setting_in_municipality(app, municipality_id, principal_id).await?;
			app.delegate_store.list_delegates_by_principal_id(principal_id).await
		}
		(None, Some(agent_id)) => {
			ensure_setting_in_municipality(app, municipality_id, agent_id).await?;
			app.delegate_store.list_delegates_by_agent_id(agent_id).await
		}
		(Some(principal_id), Some(agent_id)) => {
			ensure_setting_in_municipality(app, municipality_id, principal_id).await?;
			ensure_setting_in_municipality(app, municipality_id, agent_id).await?;
			app.delegate_store.list_delegates_by_principal_and_agent(principal_id, agent_id).await
		}
	}
}

/// Appends a filter to an existing delegate.
pub async fn create_filter(app: &App, delegate_id: &str, data: &CreateFilter) -> DgResult<Filter> {
	validate_rules(std::iter::once(data.rules.as_slice()))?;

	if !app.delegate_store.delegate_exists(delegate_id).await? {
		return Err(Error::not_found("Delegate", delegate_id));
	}

	let created = app.filter_store.create_filter(delegate_id, data).await?;

	info!(delegate_id = %delegate_id, filter_id = %created.id, "Created delegate filter");
	Ok(created)
}

pub async fn read_filter(app: &App, delegate_id: &str, filter_id: &str) -> DgResult<Filter> {
	app.filter_store.read_filter(delegate_id, filter_id).await
}

/// Replaces alias/channel/rules when provided; unspecified fields are left
/// unchanged.
pub async fn update_filter(
	app: &App,
	delegate_id: &str,
	filter_id: &str,
	data: &UpdateFilter,
) -> DgResult<Filter> {
	if let Some(rules) = &data.rules {
		validate_rules(std::iter::once(rules.as_slice()))?;
	}

	if !app.filter_store.filter_exists(delegate_id, filter_id).await? {
		return Err(Error::not_found("Filter", filter_id));
	}

	let updated = app.filter_store.update_filter(delegate_id, filter_id, data).await?;

	info!(delegate_id = %delegate_id, filter_id = %filter_id, "Updated delegate filter");
	Ok(updated)
}

/// Deletes a filter. When it is the last filter on its delegate, the whole
/// delegate is deleted instead; an active delegate never ends up with zero
/// filters.
pub async fn delete_filter(app: &App, delegate_id: &str, filter_id: &str) -> DgResult<()> {
	if !app.filter_store.filter_exists(delegate_id, filter_id).await? {
		return Err(Error::not_found("Filter", filter_id));
	}

	let remaining = app.filter_store.count_filters_by_delegate_id(delegate_id).await?;
	if remaining <= 1 {
		app.delegate_store.delete_delegate(delegate_id).await?;
		info!(
			delegate_id = %delegate_id,
			filter_id = %filter_id,
			"Deleted last filter, removed delegate"
		);
	} else {
		app.filter_store.delete_filter(delegate_id, filter_id).await?;
		info!(delegate_id = %delegate_id, filter_id = %filter_id, "Deleted delegate filter");
	}

	Ok(())
}

fn validate_rules<'a>(rule_sets: impl Iterator<Item = &'a [Rule]>) -> DgResult<()> {
	for rules in rule_sets {
		if rules.is_empty() {
			return Err(Error::validation("filter rules must not be empty"));
		}
	}
	Ok(())
}

// vim: ts=4
