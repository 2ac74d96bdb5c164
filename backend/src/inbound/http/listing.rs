//! Shared listing primitives for collection endpoints.

use pagination::Cursor;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::OwnerId;

use super::auth::RequestIdentity;

/// Query parameters accepted by collection listings.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListQuery {
    /// Opaque continuation token from a previous page.
    pub cursor: Option<String>,
}

impl ListQuery {
    /// Continuation cursor, when one was supplied.
    pub fn cursor(&self) -> Option<Cursor> {
        self.cursor.clone().map(Cursor::from_token)
    }
}

/// Owner scope for a listing: verified subjects see their own entities,
/// anonymous requests fall back to public read over the whole kind.
pub const fn owner_scope(identity: &RequestIdentity) -> Option<&OwnerId> {
    match identity {
        RequestIdentity::Subject(subject) => Some(subject),
        RequestIdentity::Anonymous => None,
    }
}
