//! Database schema initialization
//!
//! Creates all tables and indexes inside a single transaction.

use sqlx::SqlitePool;

pub(crate) async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	// Contact settings
	//******************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS contact_settings (
		contact_setting_id text NOT NULL,
		municipality_id text NOT NULL,
		party_id text,
		alias text,
		created_by_id text,
		channels json NOT NULL DEFAULT '[]',
		created_at datetime DEFAULT (unixepoch()),
		modified_at datetime,
		PRIMARY KEY(contact_setting_id)
	)",
	)
	.execute(&mut *tx)
	.await?;

	// party_id uniqueness is scoped per municipality
	sqlx::query(
		"CREATE UNIQUE INDEX IF NOT EXISTS idx_contact_settings_party
		ON contact_settings(municipality_id, party_id) WHERE party_id IS NOT NULL",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_contact_settings_created_by
		ON contact_settings(created_by_id)",
	)
	.execute(&mut *tx)
	.await?;

	// Delegates
	//***********
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS delegates (
		delegate_id text NOT NULL,
		principal_id text NOT NULL,
		agent_id text NOT NULL,
		created_at datetime DEFAULT (unixepoch()),
		modified_at datetime,
		PRIMARY KEY(delegate_id),
		UNIQUE(principal_id, agent_id)
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query("CREATE INDEX IF NOT EXISTS idx_delegates_agent ON delegates(agent_id)")
		.execute(&mut *tx)
		.await?;

	// Filters
	//*********
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS filters (
		filter_id text NOT NULL,
		delegate_id text NOT NULL,
		alias text,
		channel text,
		rules json NOT NULL,
		created_at datetime DEFAULT (unixepoch()),
		modified_at datetime,
		PRIMARY KEY(filter_id)
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query("CREATE INDEX IF NOT EXISTS idx_filters_delegate ON filters(delegate_id)")
		.execute(&mut *tx)
		.await?;

	tx.commit().await?;

	Ok(())
}

// vim: ts=4
