//! Filter persistence
//!
//! Rules are stored as a JSON column; filters are always addressed through
//! their owning delegate.

use sqlx::{Row, SqlitePool, SqliteConnection, sqlite::SqliteRow};

use delego_types::prelude::*;
use delego_types::store::{CreateFilter, Filter, Rule, UpdateFilter};
use delego_types::utils;

use crate::{collect_res, map_db_err, map_res};

pub(crate) fn parse_row(row: SqliteRow) -> Result<Filter, sqlx::Error> {
	let rules: String = row.try_get("rules")?;
	let rules: Vec<Rule> =
		serde_json::from_str(&rules).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

	Ok(Filter {
		id: row.try_get::<String, _>("filter_id")?.into(),
		alias: row.try_get::<Option<String>, _>("alias")?.map(Into::into),
		channel: row.try_get::<Option<String>, _>("channel")?.map(Into::into),
		rules,
		created: Timestamp(row.try_get("created_at")?),
		modified: row.try_get::<Option<i64>, _>("modified_at")?.map(Timestamp),
	})
}

/// Inserts one filter row on an existing connection, so delegate creation
/// can run it inside its transaction.
pub(crate) async fn insert(
	conn: &mut SqliteConnection,
	delegate_id: &str,
	data: &CreateFilter,
) -> DgResult<Filter> {
	let filter_id = utils::random_id()?;
	let rules = serde_json::to_string(&data.rules).map_err(|_| Error::DbError)?;
	let created = now();

	sqlx::query(
		"INSERT INTO filters (filter_id, delegate_id, alias, channel, rules, created_at)
		VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
	)
	.bind(&filter_id)
	.bind(delegate_id)
	.bind(data.alias.as_deref())
	.bind(data.channel.as_deref())
	.bind(&rules)
	.bind(created.0)
	.execute(conn)
	.await
	.map_err(map_db_err)?;

	Ok(Filter {
		id: filter_id.into(),
		alias: data.alias.clone(),
		channel: data.channel.clone(),
		rules: data.rules.clone(),
		created,
		modified: None,
	})
}

pub(crate) async fn create(
	db: &SqlitePool,
	delegate_id: &str,
	data: &CreateFilter,
) -> DgResult<Filter> {
	let mut conn = db.acquire().await.map_err(map_db_err)?;
	insert(&mut conn, delegate_id, data).await
}

pub(crate) async fn read(db: &SqlitePool, delegate_id: &str, filter_id: &str) -> DgResult<Filter> {
	let res = sqlx::query(
		"SELECT filter_id, alias, channel, rules, created_at, modified_at
		FROM filters WHERE filter_id = ?1 AND delegate_id = ?2",
	)
	.bind(filter_id)
	.bind(delegate_id)
	.fetch_one(db)
	.await;

	map_res(res, Error::not_found("Filter", filter_id), parse_row)
}

pub(crate) async fn exists(db: &SqlitePool, delegate_id: &str, filter_id: &str) -> DgResult<bool> {
	let res = sqlx::query("SELECT 1 FROM filters WHERE filter_id = ?1 AND delegate_id = ?2")
		.bind(filter_id)
		.bind(delegate_id)
		.fetch_optional(db)
		.await
		.map_err(map_db_err)?;

	Ok(res.is_some())
}

pub(crate) async fn update(
	db: &SqlitePool,
	delegate_id: &str,
	filter_id: &str,
	data: &UpdateFilter,
) -> DgResult<Filter> {
	let current = read(db, delegate_id, filter_id).await?;

	let alias = match &data.alias {
		Patch::Undefined => current.alias.clone(),
		Patch::Null => None,
		Patch::Value(v) => Some(v.clone()),
	};
	let channel = match &data.channel {
		Patch::Undefined => current.channel.clone(),
		Patch::Null => None,
		Patch::Value(v) => Some(v.clone()),
	};
	let rules = data.rules.clone().unwrap_or_else(|| current.rules.clone());
	let rules_json = serde_json::to_string(&rules).map_err(|_| Error::DbError)?;
	let modified = now();

	sqlx::query(
		"UPDATE filters SET alias = ?1, channel = ?2, rules = ?3, modified_at = ?4
		WHERE filter_id = ?5 AND delegate_id = ?6",
	)
	.bind(alias.as_deref())
	.bind(channel.as_deref())
	.bind(&rules_json)
	.bind(modified.0)
	.bind(filter_id)
	.bind(delegate_id)
	.execute(db)
	.await
	.map_err(map_db_err)?;

	Ok(Filter { alias, channel, rules, modified: Some(modified), ..current })
}

pub(crate) async fn count_by_delegate_id(db: &SqlitePool, delegate_id: &str) -> DgResult<u32> {
	let res = sqlx::query("SELECT COUNT(*) AS cnt FROM filters WHERE delegate_id = ?1")
		.bind(delegate_id)
		.fetch_one(db)
		.await;

	map_res(res, Error::not_found("Delegate", delegate_id), |row| {
		let count: i64 = row.try_get("cnt")?;
		Ok(u32::try_from(count).unwrap_or(u32::MAX))
	})
}

pub(crate) async fn delete(db: &SqlitePool, delegate_id: &str, filter_id: &str) -> DgResult<()> {
	let res = sqlx::query("DELETE FROM filters WHERE filter_id = ?1 AND delegate_id = ?2")
		.bind(filter_id)
		.bind(delegate_id)
		.execute(db)
		.await
		.map_err(map_db_err)?;

	if res.rows_affected() == 0 {
		return Err(Error::not_found("Filter", filter_id));
	}
	Ok(())
}

pub(crate) async fn list_by_delegate_id(
	db: &SqlitePool,
	delegate_id: &str,
) -> DgResult<Vec<Filter>> {
	let res = sqlx::query(
		"SELECT filter_id, alias, channel, rules, created_at, modified_at
		FROM filters WHERE delegate_id = ?1 ORDER BY rowid",
	)
	.bind(delegate_id)
	.fetch_all(db)
	.await;

	collect_res(res, parse_row)
}

// vim: ts=4
