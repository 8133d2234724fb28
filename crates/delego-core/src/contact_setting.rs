//! Contact setting cascade coordinator.
//!
//! Owns the ContactSetting lifecycle: explicit creation (with a party id)
//! or implicit creation as a virtual child, partial updates, and the
//! transitive cleanup of virtual children and delegates on delete.

use std::collections::{HashSet, VecDeque};

use crate::matching;
use crate::prelude::*;
use delego_types::store::{
	ContactSetting, CreateContactSetting, QueryFilter, UpdateContactSetting,
};

/// Creates a contact setting. At least one of `party_id` and
/// `created_by_id` is required; a setting without a party id is virtual.
///
/// The party id conflict check is scoped per municipality.
pub async fn create(
	app: &App,
	municipality_id: &str,
	data: &CreateContactSetting,
) -> DgResult<ContactSetting> {
	if data.party_id.is_none() && data.created_by_id.is_none() {
		return Err(Error::validation("one of partyId and createdById is required"));
	}

	if let Some(party_id) = &data.party_id {
		match app.contact_setting_store.read_contact_setting_by_party_id(municipality_id, party_id).await {
			Ok(_) => {
				return Err(Error::conflict(format!(
					"contact setting already exists for party {}",
					party_id
				)));
			}
			Err(Error::NotFound(_)) => {}
			Err(err) => return Err(err),
		}
	}

	if let Some(created_by_id) = &data.created_by_id {
		ensure_setting_in_municipality(app, municipality_id, created_by_id).await?;
	}

	let setting = app.contact_setting_store.create_contact_setting(municipality_id, data).await?;

	info!(
		contact_setting_id = %setting.id,
		municipality_id = %municipality_id,
		is_virtual = setting.is_virtual,
		"Created contact setting"
	);

	Ok(setting)
}

pub async fn read(app: &App, municipality_id: &str, id: &str) -> DgResult<ContactSetting> {
	let setting = app.contact_setting_store.read_contact_setting(id).await?;
	if &*setting.municipality_id != municipality_id {
		return Err(Error::not_found("ContactSetting", id));
	}
	Ok(setting)
}

/// All settings created as virtual children of the given one.
pub async fn read_children(
	app: &App,
	municipality_id: &str,
	id: &str,
) -> DgResult<Vec<ContactSetting>> {
	ensure_setting_in_municipality(app, municipality_id, id).await?;
	app.contact_setting_store.list_contact_settings_by_created_by_id(id).await
}

/// Merges `alias` and/or `channels` into the existing record. A provided
/// channel list replaces the old one wholesale.
pub async fn update(
	app: &App,
	municipality_id: &str,
	id: &str,
	data: &UpdateContactSetting,
) -> DgResult<ContactSetting> {
	read(app, municipality_id, id).await?;

	let updated = app.contact_setting_store.update_contact_setting(id, data).await?;

	info!(contact_setting_id = %id, "Updated contact setting");
	Ok(updated)
}

/// Deletes a contact setting together with its transitive virtual children
/// and every delegate referencing any of them.
///
/// The id closure is computed up front over `created_by_id` edges with an
/// explicit worklist (deep virtual chains must not recurse), delegates are
/// removed first, settings last, so no delegate ever references a deleted
/// setting.
pub async fn delete(app: &App, municipality_id: &str, id: &str) -> DgResult<()> {
	read(app, municipality_id, id).await?;

	let mut closure: Vec<Box<str>> = Vec::new();
	let mut visited: HashSet<Box<str>> = HashSet::new();
	let mut queue: VecDeque<Box<str>> = VecDeque::from([Box::from(id)]);

	while let Some(current) = queue.pop_front() {
		if !visited.insert(current.clone()) {
			continue;
		}
		for child in
			app.contact_setting_store.list_contact_settings_by_created_by_id(&current).await?
		{
			queue.push_back(child.id);
		}
		closure.push(current);
	}

	let mut delegate_ids: Vec<Box<str>> = Vec::new();
	let mut seen: HashSet<Box<str>> = HashSet::new();
	for setting_id in &closure {
		for delegate in app.delegate_store.list_delegates_by_principal_id(setting_id).await? {
			if seen.insert(delegate.id.clone()) {
				delegate_ids.push(delegate.id);
			}
		}
		for delegate in app.delegate_store.list_delegates_by_agent_id(setting_id).await? {
			if seen.insert(delegate.id.clone()) {
				delegate_ids.push(delegate.id);
			}
		}
	}

	app.delegate_store.delete_delegates_by_id(&delegate_ids).await?;
	app.contact_setting_store.delete_contact_settings_by_id(&closure).await?;

	info!(
		contact_setting_id = %id,
		municipality_id = %municipality_id,
		settings = closure.len(),
		delegates = delegate_ids.len(),
		"Deleted contact setting cascade"
	);

	Ok(())
}

/// Resolves the contact setting chain for a party: the party's own setting
/// plus, transitively, the settings of agents reachable over delegates
/// whose filters accept the query.
///
/// A visited set guards against delegation cycles; agents outside the
/// municipality are skipped.
pub async fn find_by_party_id(
	app: &App,
	municipality_id: &str,
	party_id: &str,
	query: &QueryFilter,
) -> DgResult<Vec<ContactSetting>> {
	let root =
		app.contact_setting_store.read_contact_setting_by_party_id(municipality_id, party_id).await?;

	let mut result: Vec<ContactSetting> = Vec::new();
	let mut visited: HashSet<Box<str>> = HashSet::new();
	let mut queue: VecDeque<ContactSetting> = VecDeque::from([root]);

	while let Some(setting) = queue.pop_front() {
		if !visited.insert(setting.id.clone()) {
			continue;
		}
		for delegate in app.delegate_store.list_delegates_by_principal_id(&setting.id).await? {
			if !matching::matches(query, &delegate.filters) {
				continue;
			}
			match app.contact_setting_store.read_contact_setting(&delegate.agent_id).await {
				Ok(agent) if &*agent.municipality_id == municipality_id => queue.push_back(agent),
				Ok(_) => {}
				// The cascade guarantees no dangling agents; tolerate one anyway
				Err(Error::NotFound(_)) => {
					warn!(
						delegate_id = %delegate.id,
						agent_id = %delegate.agent_id,
						"Delegate references a missing agent, skipping"
					);
				}
				Err(err) => return Err(err),
			}
		}
		result.push(setting);
	}

	Ok(result)
}

/// All settings in the municipality having a channel with the given
/// destination.
pub async fn find_by_channel_destination(
	app: &App,
	municipality_id: &str,
	destination: &str,
) -> DgResult<Vec<ContactSetting>> {
	app.contact_setting_store
		.list_contact_settings_by_channel_destination(municipality_id, destination)
		.await
}

/// Existence check scoped by municipality, failing with the offending id.
pub(crate) async fn ensure_setting_in_municipality(
	app: &App,
	municipality_id: &str,
	id: &str,
) -> DgResult<()> {
	if app.contact_setting_store.contact_setting_exists(municipality_id, id).await? {
		Ok(())
	} else {
		Err(Error::not_found("ContactSetting", id))
	}
}

// vim: ts=4
