//! SQLite-backed implementation of the Delego store adapter traits.
//!
//! One [`StoreAdapterSqlite`] owns a connection pool and implements all
//! three store contracts; the per-entity query code lives in the
//! `contact_setting`, `delegate`, and `filter` modules.

use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::{self, SqlitePool, SqliteRow};

use delego_types::prelude::*;
use delego_types::store::{
	ContactSetting, ContactSettingStore, CreateContactSetting, CreateDelegate, CreateFilter,
	Delegate, DelegateStore, Filter, FilterStore, UpdateContactSetting, UpdateFilter,
};

mod contact_setting;
mod delegate;
mod filter;
mod schema;

// Helper functions
//******************

fn inspect(err: &sqlx::Error) {
	warn!("DB: {:#?}", err);
}

/// Maps a database error, promoting unique constraint violations to
/// `Conflict` so callers see the store reject the loser of a race.
pub(crate) fn map_db_err(err: sqlx::Error) -> Error {
	if let sqlx::Error::Database(db_err) = &err {
		if db_err.is_unique_violation() {
			return Error::Conflict("unique constraint violation".into());
		}
	}
	inspect(&err);
	Error::DbError
}

pub(crate) fn map_res<T, F>(
	row: Result<SqliteRow, sqlx::Error>,
	not_found: Error,
	f: F,
) -> DgResult<T>
where
	F: FnOnce(SqliteRow) -> Result<T, sqlx::Error>,
{
	match row {
		Ok(row) => f(row).inspect_err(inspect).map_err(|_| Error::DbError),
		Err(sqlx::Error::RowNotFound) => Err(not_found),
		Err(err) => {
			inspect(&err);
			Err(Error::DbError)
		}
	}
}

pub(crate) fn collect_res<T, F>(
	rows: Result<Vec<SqliteRow>, sqlx::Error>,
	f: F,
) -> DgResult<Vec<T>>
where
	F: Fn(SqliteRow) -> Result<T, sqlx::Error>,
{
	rows.inspect_err(inspect)
		.map_err(|_| Error::DbError)?
		.into_iter()
		.map(|row| f(row).inspect_err(inspect).map_err(|_| Error::DbError))
		.collect()
}

pub(crate) fn push_in<'a>(
	mut query: sqlx::QueryBuilder<'a, sqlx::Sqlite>,
	values: &'a [Box<str>],
) -> sqlx::QueryBuilder<'a, sqlx::Sqlite> {
	query.push("(");
	for (i, value) in values.iter().enumerate() {
		if i > 0 {
			query.push(", ");
		}
		query.push_bind(&**value);
	}
	query.push(")");
	query
}

#[derive(Debug)]
pub struct StoreAdapterSqlite {
	db: SqlitePool,
}

impl StoreAdapterSqlite {
	pub async fn new(path: impl AsRef<Path>) -> DgResult<Self> {
		let opts = sqlite::SqliteConnectOptions::new()
			.filename(path.as_ref())
			.create_if_missing(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.inspect_err(inspect)
			.or(Err(Error::DbError))?;

		schema::init_db(&db).await.inspect_err(inspect).or(Err(Error::DbError))?;

		Ok(Self { db })
	}
}

#[async_trait]
impl ContactSettingStore for StoreAdapterSqlite {
	async fn create_contact_setting(
		&self,
		municipality_id: &str,
		data: &CreateContactSetting,
	) -> DgResult<ContactSetting> {
		contact_setting::create(&self.db, municipality_id, data).await
	}

	async fn read_contact_setting(&self, id: &str) -> DgResult<ContactSetting> {
		contact_setting::read(&self.db, id).await
	}

	async fn read_contact_setting_by_party_id(
		&self,
		municipality_id: &str,
		party_id: &str,
	) -> DgResult<ContactSetting> {
		contact_setting::read_by_party_id(&self.db, municipality_id, party_id).await
	}

	async fn list_contact_settings_by_created_by_id(
		&self,
		created_by_id: &str,
	) -> DgResult<Vec<ContactSetting>> {
		contact_setting::list_by_created_by_id(&self.db, created_by_id).await
	}

	async fn contact_setting_exists(&self, municipality_id: &str, id: &str) -> DgResult<bool> {
		contact_setting::exists(&self.db, municipality_id, id).await
	}

	async fn update_contact_setting(
		&self,
		id: &str,
		data: &UpdateContactSetting,
	) -> DgResult<ContactSetting> {
		contact_setting::update(&self.db, id, data).await
	}

	async fn delete_contact_setting(&self, id: &str) -> DgResult<()> {
		contact_setting::delete(&self.db, id).await
	}

	async fn delete_contact_settings_by_id(&self, ids: &[Box<str>]) -> DgResult<()> {
		contact_setting::delete_all_by_id(&self.db, ids).await
	}

	async fn list_contact_settings_by_channel_destination(
		&self,
		municipality_id: &str,
		destination: &str,
	) -> DgResult<Vec<ContactSetting>> {
		contact_setting::list_by_channel_destination(&self.db, municipality_id, destination).await
	}
}

#[async_trait]
impl DelegateStore for StoreAdapterSqlite {
	async fn create_delegate(&self, data: &CreateDelegate) -> DgResult<Delegate> {
		delegate::create(&self.db, data).await
	}

	async fn read_delegate(&self, id: &str) -> DgResult<Delegate> {
		delegate::read(&self.db, id).await
	}

	async fn delegate_exists(&self, id: &str) -> DgResult<bool> {
		delegate::exists(&self.db, id).await
	}

	async fn delete_delegate(&self, id: &str) -> DgResult<()> {
		delegate::delete(&self.db, id).await
	}

	async fn list_delegates_by_agent_id(&self, agent_id: &str) -> DgResult<Vec<Delegate>> {
		delegate::list_by_agent_id(&self.db, agent_id).await
	}

	async fn list_delegates_by_principal_id(&self, principal_id: &str) -> DgResult<Vec<Delegate>> {
		delegate::list_by_principal_id(&self.db, principal_id).await
	}

	async fn list_delegates_by_principal_and_agent(
		&self,
		principal_id: &str,
		agent_id: &str,
	) -> DgResult<Vec<Delegate>> {
		delegate::list_by_principal_and_agent(&self.db, principal_id, agent_id).await
	}

	async fn delete_delegates_by_id(&self, ids: &[Box<str>]) -> DgResult<()> {
		delegate::delete_all_by_id(&self.db, ids).await
	}
}

#[async_trait]
impl FilterStore for StoreAdapterSqlite {
	async fn create_filter(&self, delegate_id: &str, data: &CreateFilter) -> DgResult<Filter> {
		filter::create(&self.db, delegate_id, data).await
	}

	async fn read_filter(&self, delegate_id: &str, filter_id: &str) -> DgResult<Filter> {
		filter::read(&self.db, delegate_id, filter_id).await
	}

	async fn filter_exists(&self, delegate_id: &str, filter_id: &str) -> DgResult<bool> {
		filter::exists(&self.db, delegate_id, filter_id).await
	}

	async fn update_filter(
		&self,
		delegate_id: &str,
		filter_id: &str,
		data: &UpdateFilter,
	) -> DgResult<Filter> {
		filter::update(&self.db, delegate_id, filter_id, data).await
	}

	async fn count_filters_by_delegate_id(&self, delegate_id: &str) -> DgResult<u32> {
		filter::count_by_delegate_id(&self.db, delegate_id).await
	}

	async fn delete_filter(&self, delegate_id: &str, filter_id: &str) -> DgResult<()> {
		filter::delete(&self.db, delegate_id, filter_id).await
	}
}

// vim: ts=4
