//! Contact setting persistence
//!
//! Channels are stored as a JSON column; the destination lookup unnests it
//! with `json_each`.

use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use delego_types::prelude::*;
use delego_types::store::{ContactChannel, ContactSetting, CreateContactSetting, UpdateContactSetting};
use delego_types::utils;

use crate::{collect_res, map_db_err, map_res, push_in};

const COLUMNS: &str =
	"contact_setting_id, municipality_id, party_id, alias, created_by_id, channels, created_at, modified_at";

pub(crate) fn parse_row(row: SqliteRow) -> Result<ContactSetting, sqlx::Error> {
	let channels: String = row.try_get("channels")?;
	let channels: Vec<ContactChannel> =
		serde_json::from_str(&channels).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
	let party_id: Option<String> = row.try_get("party_id")?;

	Ok(ContactSetting {
		id: row.try_get::<String, _>("contact_setting_id")?.into(),
		is_virtual: party_id.is_none(),
		party_id: party_id.map(Into::into),
		municipality_id: row.try_get::<String, _>("municipality_id")?.into(),
		alias: row.try_get::<Option<String>, _>("alias")?.map(Into::into),
		created_by_id: row.try_get::<Option<String>, _>("created_by_id")?.map(Into::into),
		channels,
		created: Timestamp(row.try_get("created_at")?),
		modified: row.try_get::<Option<i64>, _>("modified_at")?.map(Timestamp),
	})
}

pub(crate) async fn create(
	db: &SqlitePool,
	municipality_id: &str,
	data: &CreateContactSetting,
) -> DgResult<ContactSetting> {
	let id = utils::random_id()?;
	let channels = serde_json::to_string(&data.channels).map_err(|_| Error::DbError)?;
	let created = now();

	sqlx::query(
		"INSERT INTO contact_settings
		(contact_setting_id, municipality_id, party_id, alias, created_by_id, channels, created_at)
		VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
	)
	.bind(&id)
	.bind(municipality_id)
	.bind(data.party_id.as_deref())
	.bind(data.alias.as_deref())
	.bind(data.created_by_id.as_deref())
	.bind(&channels)
	.bind(created.0)
	.execute(db)
	.await
	.map_err(map_db_err)?;

	Ok(ContactSetting {
		id: id.into(),
		is_virtual: data.party_id.is_none(),
		party_id: data.party_id.clone(),
		municipality_id: municipality_id.into(),
		alias: data.alias.clone(),
		created_by_id: data.created_by_id.clone(),
		channels: data.channels.clone(),
		created,
		modified: None,
	})
}

pub(crate) async fn read(db: &SqlitePool, id: &str) -> DgResult<ContactSetting> {
	let res = sqlx::query(&format!(
		"SELECT {} FROM contact_settings WHERE contact_setting_id = ?1",
		COLUMNS
	))
	.bind(id)
	.fetch_one(db)
	.await;

	map_res(res, Error::not_found("ContactSetting", id), parse_row)
}

pub(crate) async fn read_by_party_id(
	db: &SqlitePool,
	municipality_id: &str,
	party_id: &str,
) -> DgResult<ContactSetting> {
	let res = sqlx::query(&format!(
		"SELECT {} FROM contact_settings WHERE municipality_id = ?1 AND party_id = ?2",
		COLUMNS
	))
	.bind(municipality_id)
	.bind(party_id)
	.fetch_one(db)
	.await;

	map_res(res, Error::not_found("ContactSetting for party", party_id), parse_row)
}

pub(crate) async fn list_by_created_by_id(
	db: &SqlitePool,
	created_by_id: &str,
) -> DgResult<Vec<ContactSetting>> {
	let res = sqlx::query(&format!(
		"SELECT {} FROM contact_settings WHERE created_by_id = ?1 ORDER BY rowid",
		COLUMNS
	))
	.bind(created_by_id)
	.fetch_all(db)
	.await;

	collect_res(res, parse_row)
}

pub(crate) async fn exists(db: &SqlitePool, municipality_id: &str, id: &str) -> DgResult<bool> {
	let res = sqlx::query(
		"SELECT 1 FROM contact_settings WHERE contact_setting_id = ?1 AND municipality_id = ?2",
	)
	.bind(id)
	.bind(municipality_id)
	.fetch_optional(db)
	.await
	.map_err(map_db_err)?;

	Ok(res.is_some())
}

pub(crate) async fn update(
	db: &SqlitePool,
	id: &str,
	data: &UpdateContactSetting,
) -> DgResult<ContactSetting> {
	let current = read(db, id).await?;

	let alias = match &data.alias {
		Patch::Undefined => current.alias.clone(),
		Patch::Null => None,
		Patch::Value(v) => Some(v.clone()),
	};
	let channels = data.channels.clone().unwrap_or_else(|| current.channels.clone());
	let channels_json = serde_json::to_string(&channels).map_err(|_| Error::DbError)?;
	let modified = now();

	sqlx::query(
		"UPDATE contact_settings SET alias = ?1, channels = ?2, modified_at = ?3
		WHERE contact_setting_id = ?4",
	)
	.bind(alias.as_deref())
	.bind(&channels_json)
	.bind(modified.0)
	.bind(id)
	.execute(db)
	.await
	.map_err(map_db_err)?;

	Ok(ContactSetting { alias, channels, modified: Some(modified), ..current })
}

pub(crate) async fn delete(db: &SqlitePool, id: &str) -> DgResult<()> {
	let res = sqlx::query("DELETE FROM contact_settings WHERE contact_setting_id = ?1")
		.bind(id)
		.execute(db)
		.await
		.map_err(map_db_err)?;

	if res.rows_affected() == 0 {
		return Err(Error::not_found("ContactSetting", id));
	}
	Ok(())
}

pub(crate) async fn delete_all_by_id(db: &SqlitePool, ids: &[Box<str>]) -> DgResult<()> {
	if ids.is_empty() {
		return Ok(());
	}

	let mut tx = db.begin().await.map_err(map_db_err)?;

	let query =
		sqlx::QueryBuilder::new("DELETE FROM contact_settings WHERE contact_setting_id IN ");
	let mut query = push_in(query, ids);
	query.build().execute(&mut *tx).await.map_err(map_db_err)?;

	tx.commit().await.map_err(map_db_err)?;
	Ok(())
}

pub(crate) async fn list_by_channel_destination(
	db: &SqlitePool,
	municipality_id: &str,
	destination: &str,
) -> DgResult<Vec<ContactSetting>> {
	let res = sqlx::query(&format!(
		"SELECT {} FROM contact_settings
		WHERE municipality_id = ?1 AND EXISTS (
			SELECT 1 FROM json_each(contact_settings.channels) AS ch
			WHERE json_extract(ch.value, '$.destination') = ?2
		)
		ORDER BY rowid",
		COLUMNS
	))
	.bind(municipality_id)
	.bind(destination)
	.fetch_all(db)
	.await;

	collect_res(res, parse_row)
}

// vim: ts=4
