//! Delegate persistence
//!
//! A delegate row never exists without its filters being written in the
//! same transaction, and deletion always removes both together.

use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use delego_types::prelude::*;
use delego_types::store::{CreateDelegate, Delegate};
use delego_types::utils;

use crate::{collect_res, filter, map_db_err, map_res, push_in};

pub(crate) fn parse_row(row: SqliteRow) -> Result<Delegate, sqlx::Error> {
	Ok(Delegate {
		id: row.try_get::<String, _>("delegate_id")?.into(),
		principal_id: row.try_get::<String, _>("principal_id")?.into(),
		agent_id: row.try_get::<String, _>("agent_id")?.into(),
		filters: Vec::new(),
		created: Timestamp(row.try_get("created_at")?),
		modified: row.try_get::<Option<i64>, _>("modified_at")?.map(Timestamp),
	})
}

pub(crate) async fn create(db: &SqlitePool, data: &CreateDelegate) -> DgResult<Delegate> {
	let delegate_id = utils::random_id()?;
	let created = now();

	let mut tx = db.begin().await.map_err(map_db_err)?;

	sqlx::query(
		"INSERT INTO delegates (delegate_id, principal_id, agent_id, created_at)
		VALUES (?1, ?2, ?3, ?4)",
	)
	.bind(&delegate_id)
	.bind(&*data.principal_id)
	.bind(&*data.agent_id)
	.bind(created.0)
	.execute(&mut *tx)
	.await
	.map_err(map_db_err)?;

	let mut filters = Vec::with_capacity(data.filters.len());
	for f in &data.filters {
		filters.push(filter::insert(&mut tx, &delegate_id, f).await?);
	}

	tx.commit().await.map_err(map_db_err)?;

	Ok(Delegate {
		id: delegate_id.into(),
		principal_id: data.principal_id.clone(),
		agent_id: data.agent_id.clone(),
		filters,
		created,
		modified: None,
	})
}

pub(crate) async fn read(db: &SqlitePool, id: &str) -> DgResult<Delegate> {
	let res = sqlx::query(
		"SELECT delegate_id, principal_id, agent_id, created_at, modified_at
		FROM delegates WHERE delegate_id = ?1",
	)
	.bind(id)
	.fetch_one(db)
	.await;

	let mut delegate = map_res(res, Error::not_found("Delegate", id), parse_row)?;
	delegate.filters = filter::list_by_delegate_id(db, &delegate.id).await?;
	Ok(delegate)
}

pub(crate) async fn exists(db: &SqlitePool, id: &str) -> DgResult<bool> {
	let res = sqlx::query("SELECT 1 FROM delegates WHERE delegate_id = ?1")
		.bind(id)
		.fetch_optional(db)
		.await
		.map_err(map_db_err)?;

	Ok(res.is_some())
}

pub(crate) async fn delete(db: &SqlitePool, id: &str) -> DgResult<()> {
	let mut tx = db.begin().await.map_err(map_db_err)?;

	sqlx::query("DELETE FROM filters WHERE delegate_id = ?1")
		.bind(id)
		.execute(&mut *tx)
		.await
		.map_err(map_db_err)?;

	let res = sqlx::query("DELETE FROM delegates WHERE delegate_id = ?1")
		.bind(id)
		.execute(&mut *tx)
		.await
		.map_err(map_db_err)?;

	if res.rows_affected() == 0 {
		return Err(Error::not_found("Delegate", id));
	}

	tx.commit().await.map_err(map_db_err)?;
	Ok(())
}

async fn attach_filters(db: &SqlitePool, mut delegates: Vec<Delegate>) -> DgResult<Vec<Delegate>> {
	for delegate in &mut delegates {
		delegate.filters = filter::list_by_delegate_id(db, &delegate.id).await?;
	}
	Ok(delegates)
}

pub(crate) async fn list_by_agent_id(db: &SqlitePool, agent_id: &str) -> DgResult<Vec<Delegate>> {
	let res = sqlx::query(
		"SELECT delegate_id, principal_id, agent_id, created_at, modified_at
		FROM delegates WHERE agent_id = ?1 ORDER BY rowid",
	)
	.bind(agent_id)
	.fetch_all(db)
	.await;

	attach_filters(db, collect_res(res, parse_row)?).await
}

pub(crate) async fn list_by_principal_id(
	db: &SqlitePool,
	principal_id: &str,
) -> DgResult<Vec<Delegate>> {
	let res = sqlx::query(
		"SELECT delegate_id, principal_id, agent_id, created_at, modified_at
		FROM delegates WHERE principal_id = ?1 ORDER BY rowid",
	)
	.bind(principal_id)
	.fetch_all(db)
	.await;

	attach_filters(db, collect_res(res, parse_row)?).await
}

pub(crate) async fn list_by_principal_and_agent(
	db: &SqlitePool,
	principal_id: &str,
	agent_id: &str,
) -> DgResult<Vec<Delegate>> {
	let res = sqlx::query(
		"SELECT delegate_id, principal_id, agent_id, created_at, modified_at
		FROM delegates WHERE principal_id = ?1 AND agent_id = ?2 ORDER BY rowid",
	)
	.bind(principal_id)
	.bind(agent_id)
	.fetch_all(db)
	.await;

	attach_filters(db, collect_res(res, parse_row)?).await
}

pub(crate) async fn delete_all_by_id(db: &SqlitePool, ids: &[Box<str>]) -> DgResult<()> {
	if ids.is_empty() {
		return Ok(());
	}

	let mut tx = db.begin().await.map_err(map_db_err)?;

	let query = sqlx::QueryBuilder::new("DELETE FROM filters WHERE delegate_id IN ");
	let mut query = push_in(query, ids);
	query.build().execute(&mut *tx).await.map_err(map_db_err)?;

	let query = sqlx::QueryBuilder::new("DELETE FROM delegates WHERE delegate_id IN ");
	let mut query = push_in(query, ids);
	query.build().execute(&mut *tx).await.map_err(map_db_err)?;

	tx.commit().await.map_err(map_db_err)?;
	Ok(())
}

// vim: ts=4
