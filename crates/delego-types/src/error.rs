//! Error types shared by the whole Delego stack.
//!
//! All fallible operations return [`DgResult`]. Errors carry the offending
//! identifier where one exists, so the caller can surface it directly.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub type DgResult<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
	/// A ContactSetting, Delegate, or Filter does not exist, or does not
	/// resolve within the requested municipality scope.
	NotFound(Box<str>),
	/// Duplicate party_id on ContactSetting creation, or duplicate
	/// (principal_id, agent_id) pair on Delegate creation.
	Conflict(Box<str>),
	/// Missing or malformed input detected before touching the store.
	ValidationError(Box<str>),
	/// Database failure. Driver detail is logged, not propagated.
	DbError,
	Internal(Box<str>),
}

impl Error {
	pub fn not_found(what: &str, id: &str) -> Self {
		Self::NotFound(format!("{} not found: {}", what, id).into())
	}

	pub fn conflict(msg: impl Into<Box<str>>) -> Self {
		Self::Conflict(msg.into())
	}

	pub fn validation(msg: impl Into<Box<str>>) -> Self {
		Self::ValidationError(msg.into())
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Error::NotFound(msg) => write!(f, "{}", msg),
			Error::Conflict(msg) => write!(f, "conflict: {}", msg),
			Error::ValidationError(msg) => write!(f, "validation error: {}", msg),
			Error::DbError => write!(f, "database error"),
			Error::Internal(msg) => write!(f, "internal error: {}", msg),
		}
	}
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
	fn into_response(self) -> axum::response::Response {
		let (status, message) = match &self {
			Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg.to_string()),
			Error::Conflict(msg) => (StatusCode::CONFLICT, msg.to_string()),
			Error::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.to_string()),
			Error::DbError | Error::Internal(_) => {
				(StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
			}
		};
		(status, Json(json!({ "status": status.as_u16(), "message": message }))).into_response()
	}
}


// vim: ts=4
