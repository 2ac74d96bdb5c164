//! User HTTP handlers.
//!
//! ```text
//! POST /api/v1/users
//! GET  /api/v1/users
//! ```
//!
//! Registration keys the user record by the verified subject id, so
//! registering twice overwrites in place rather than duplicating.

use actix_web::{HttpRequest, HttpResponse, get, post, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{EntityKey, ErrorCode, Stored, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth;
use crate::inbound::http::listing::ListQuery;
use crate::inbound::http::state::HttpState;

/// User representation returned to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponseBody {
    /// Provider-issued subject id.
    pub id: String,
}

impl From<Stored<User>> for UserResponseBody {
    fn from(stored: Stored<User>) -> Self {
        Self {
            id: stored.entity.sub.to_string(),
        }
    }
}

/// One page of users with the exact registration total.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserPageBody {
    /// Users on this page.
    pub users: Vec<UserResponseBody>,
    /// Exact registration count.
    pub total: u64,
    /// Link to the next page; absent on the final page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// Register the authenticated subject.
///
/// Idempotent: an already-registered subject gets its existing record back
/// with 200 instead of a fresh 201, and the registration count is
/// unchanged.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    responses(
        (status = 201, description = "Subject registered", body = UserResponseBody),
        (status = 200, description = "Subject was already registered", body = UserResponseBody),
        (status = 401, description = "Unauthorized", body = crate::domain::Error),
        (status = 500, description = "Storage failure", body = crate::domain::Error)
    ),
    tags = ["users"],
    operation_id = "registerUser",
    security(("BearerAuth" = []))
)]
#[post("/users")]
pub async fn register_user(
    state: web::Data<HttpState>,
    req: HttpRequest,
) -> ApiResult<HttpResponse> {
    let subject = auth::require_subject(&req, state.identity.as_ref()).await?;
    let key = EntityKey::Name(subject.as_str().to_owned());

    match state.lifecycle.fetch::<User>(&key).await {
        Ok(existing) => Ok(HttpResponse::Ok().json(UserResponseBody::from(existing))),
        Err(err) if err.code() == ErrorCode::NotFound => {
            let created = state.lifecycle.create(User::new(subject)).await?;
            Ok(HttpResponse::Created().json(UserResponseBody::from(created)))
        }
        Err(err) => Err(err),
    }
}

/// List registered users one page at a time.
///
/// Public read: no credential is required, but a presented credential must
/// still verify.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of users", body = UserPageBody),
        (status = 400, description = "Malformed cursor", body = crate::domain::Error),
        (status = 401, description = "Invalid credential", body = crate::domain::Error)
    ),
    tags = ["users"],
    operation_id = "listUsers",
    security((), ("BearerAuth" = []))
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    req: HttpRequest,
    query: web::Query<ListQuery>,
) -> ApiResult<web::Json<UserPageBody>> {
    // Users are not owner-scoped; verification only rejects bad tokens.
    auth::identify(&req, state.identity.as_ref()).await?;

    let listing = state.lifecycle.list::<User>(None, query.cursor()).await?;
    let page = listing.page.map(UserResponseBody::from);
    let next = page
        .next_cursor
        .as_ref()
        .and_then(|cursor| state.next_url("users", cursor));

    Ok(web::Json(UserPageBody {
        users: page.items,
        total: listing.total,
        next,
    }))
}
