//! Boat HTTP handlers.
//!
//! ```text
//! POST   /api/v1/boats
//! GET    /api/v1/boats
//! GET    /api/v1/boats/{boat_id}
//! PATCH  /api/v1/boats/{boat_id}
//! PUT    /api/v1/boats/{boat_id}
//! DELETE /api/v1/boats/{boat_id}
//! PUT    /api/v1/boats/{boat_id}/loads/{load_id}
//! DELETE /api/v1/boats/{boat_id}/loads/{load_id}
//! ```

use actix_web::{HttpRequest, HttpResponse, delete, get, patch, post, put, web};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::domain::{Boat, Document, EntityKey, Error, Load, Stored};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth;
use crate::inbound::http::listing::{ListQuery, owner_scope};
use crate::inbound::http::state::HttpState;

/// Request payload for creating or replacing a boat.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct BoatBody {
    /// Vessel name, 1–50 characters.
    pub name: String,
    /// Vessel type, 1–50 characters.
    #[serde(rename = "type")]
    pub boat_type: String,
    /// Hull length in feet, 1–9999.
    pub length: i64,
}

/// Boat representation returned to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BoatResponseBody {
    /// Store-allocated id.
    pub id: i64,
    /// Vessel name.
    pub name: String,
    /// Vessel type.
    #[serde(rename = "type")]
    pub boat_type: String,
    /// Hull length in feet.
    pub length: i64,
    /// Owning subject id.
    pub user: String,
}

impl BoatResponseBody {
    fn try_from_stored(stored: &Stored<Boat>) -> ApiResult<Self> {
        let id = stored
            .id()
            .ok_or_else(|| Error::internal("boat key has no numeric id"))?;
        Ok(Self {
            id,
            name: stored.entity.name.clone(),
            boat_type: stored.entity.boat_type.clone(),
            length: stored.entity.length,
            user: stored.entity.user.to_string(),
        })
    }
}

/// One page of boats with the exact kind total and a continuation link.
#[derive(Debug, Serialize, ToSchema)]
pub struct BoatPageBody {
    /// Boats on this page.
    pub boats: Vec<BoatResponseBody>,
    /// Exact count for the listing's scope.
    pub total: u64,
    /// Link to the next page; absent on the final page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// Create a boat owned by the authenticated subject.
#[utoipa::path(
    post,
    path = "/api/v1/boats",
    request_body = BoatBody,
    responses(
        (status = 201, description = "Boat created", body = BoatResponseBody),
        (status = 400, description = "Validation failed", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 500, description = "Storage failure", body = Error)
    ),
    tags = ["boats"],
    operation_id = "createBoat",
    security(("BearerAuth" = []))
)]
#[post("/boats")]
pub async fn create_boat(
    state: web::Data<HttpState>,
    req: HttpRequest,
    payload: web::Json<BoatBody>,
) -> ApiResult<HttpResponse> {
    let subject = auth::require_subject(&req, state.identity.as_ref()).await?;
    let BoatBody {
        name,
        boat_type,
        length,
    } = payload.into_inner();

    let created = state
        .lifecycle
        .create(Boat::new(name, boat_type, length, subject))
        .await?;

    Ok(HttpResponse::Created().json(BoatResponseBody::try_from_stored(&created)?))
}

/// Fetch one boat owned by the authenticated subject.
#[utoipa::path(
    get,
    path = "/api/v1/boats/{boat_id}",
    params(("boat_id" = i64, Path, description = "Boat id")),
    responses(
        (status = 200, description = "Boat found", body = BoatResponseBody),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "No such boat", body = Error)
    ),
    tags = ["boats"],
    operation_id = "getBoat",
    security(("BearerAuth" = []))
)]
#[get("/boats/{boat_id}")]
pub async fn get_boat(
    state: web::Data<HttpState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> ApiResult<web::Json<BoatResponseBody>> {
    let subject = auth::require_subject(&req, state.identity.as_ref()).await?;
    let key = EntityKey::Id(path.into_inner());

    let stored = state.lifecycle.fetch::<Boat>(&key).await?;
    auth::ensure_owned_by(&stored, &subject)?;

    Ok(web::Json(BoatResponseBody::try_from_stored(&stored)?))
}

/// List boats one page at a time.
///
/// Authenticated requests list the subject's own boats; anonymous requests
/// fall back to public read over every boat.
#[utoipa::path(
    get,
    path = "/api/v1/boats",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of boats", body = BoatPageBody),
        (status = 400, description = "Malformed cursor", body = Error),
        (status = 401, description = "Invalid credential", body = Error)
    ),
    tags = ["boats"],
    operation_id = "listBoats",
    security((), ("BearerAuth" = []))
)]
#[get("/boats")]
pub async fn list_boats(
    state: web::Data<HttpState>,
    req: HttpRequest,
    query: web::Query<ListQuery>,
) -> ApiResult<web::Json<BoatPageBody>> {
    let identity = auth::identify(&req, state.identity.as_ref()).await?;
    let listing = state
        .lifecycle
        .list::<Boat>(owner_scope(&identity), query.cursor())
        .await?;

    let boats = listing
        .page
        .items
        .iter()
        .map(BoatResponseBody::try_from_stored)
        .collect::<ApiResult<Vec<_>>>()?;
    let next = listing
        .page
        .next_cursor
        .as_ref()
        .and_then(|cursor| state.next_url("boats", cursor));

    Ok(web::Json(BoatPageBody {
        boats,
        total: listing.total,
        next,
    }))
}

/// Patch a boat's editable fields, re-validating the whole record.
#[utoipa::path(
    patch,
    path = "/api/v1/boats/{boat_id}",
    params(("boat_id" = i64, Path, description = "Boat id")),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Boat updated", body = BoatResponseBody),
        (status = 400, description = "Merged record failed validation", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "No such boat", body = Error)
    ),
    tags = ["boats"],
    operation_id = "updateBoat",
    security(("BearerAuth" = []))
)]
#[patch("/boats/{boat_id}")]
pub async fn update_boat(
    state: web::Data<HttpState>,
    req: HttpRequest,
    path: web::Path<i64>,
    payload: web::Json<Document>,
) -> ApiResult<web::Json<BoatResponseBody>> {
    let subject = auth::require_subject(&req, state.identity.as_ref()).await?;
    let key = EntityKey::Id(path.into_inner());

    let stored = state.lifecycle.fetch::<Boat>(&key).await?;
    auth::ensure_owned_by(&stored, &subject)?;

    let updated = state.lifecycle.update(&stored, &payload.into_inner()).await?;
    Ok(web::Json(BoatResponseBody::try_from_stored(&updated)?))
}

/// Replace every field of a boat, keeping its id and owner.
#[utoipa::path(
    put,
    path = "/api/v1/boats/{boat_id}",
    params(("boat_id" = i64, Path, description = "Boat id")),
    request_body = BoatBody,
    responses(
        (status = 200, description = "Boat replaced", body = BoatResponseBody),
        (status = 400, description = "Replacement failed validation", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "No such boat", body = Error)
    ),
    tags = ["boats"],
    operation_id = "replaceBoat",
    security(("BearerAuth" = []))
)]
#[put("/boats/{boat_id}")]
pub async fn replace_boat(
    state: web::Data<HttpState>,
    req: HttpRequest,
    path: web::Path<i64>,
    payload: web::Json<BoatBody>,
) -> ApiResult<web::Json<BoatResponseBody>> {
    let subject = auth::require_subject(&req, state.identity.as_ref()).await?;
    let key = EntityKey::Id(path.into_inner());

    let stored = state.lifecycle.fetch::<Boat>(&key).await?;
    auth::ensure_owned_by(&stored, &subject)?;

    let BoatBody {
        name,
        boat_type,
        length,
    } = payload.into_inner();
    let replacement = Boat::new(name, boat_type, length, stored.entity.user.clone());

    let replaced = state.lifecycle.replace(&stored, replacement).await?;
    Ok(web::Json(BoatResponseBody::try_from_stored(&replaced)?))
}

/// Delete a boat and detach every load it carried.
#[utoipa::path(
    delete,
    path = "/api/v1/boats/{boat_id}",
    params(("boat_id" = i64, Path, description = "Boat id")),
    responses(
        (status = 204, description = "Boat deleted"),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "No such boat", body = Error)
    ),
    tags = ["boats"],
    operation_id = "deleteBoat",
    security(("BearerAuth" = []))
)]
#[delete("/boats/{boat_id}")]
pub async fn delete_boat(
    state: web::Data<HttpState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let subject = auth::require_subject(&req, state.identity.as_ref()).await?;
    let key = EntityKey::Id(path.into_inner());

    let stored = state.lifecycle.fetch::<Boat>(&key).await?;
    auth::ensure_owned_by(&stored, &subject)?;

    state.lifecycle.destroy(&stored).await?;

    // Best-effort cascade: the delete stands even if detaching fails.
    if let Some(boat_id) = stored.id() {
        if let Err(failure) = state.carriers.detach_all(boat_id).await {
            error!(error = %failure, boat_id, "carrier cascade failed after boat delete");
        }
    }

    Ok(HttpResponse::NoContent().finish())
}

/// Assign a load to a boat as its carrier.
#[utoipa::path(
    put,
    path = "/api/v1/boats/{boat_id}/loads/{load_id}",
    params(
        ("boat_id" = i64, Path, description = "Boat id"),
        ("load_id" = i64, Path, description = "Load id")
    ),
    responses(
        (status = 204, description = "Load assigned"),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "No such boat or load", body = Error),
        (status = 409, description = "Load already carried", body = Error)
    ),
    tags = ["boats"],
    operation_id = "assignLoad",
    security(("BearerAuth" = []))
)]
#[put("/boats/{boat_id}/loads/{load_id}")]
pub async fn assign_load(
    state: web::Data<HttpState>,
    req: HttpRequest,
    path: web::Path<(i64, i64)>,
) -> ApiResult<HttpResponse> {
    let subject = auth::require_subject(&req, state.identity.as_ref()).await?;
    let (boat_id, load_id) = path.into_inner();
    let boat_key = EntityKey::Id(boat_id);
    let load_key = EntityKey::Id(load_id);

    let boat = state.lifecycle.fetch::<Boat>(&boat_key).await?;
    auth::ensure_owned_by(&boat, &subject)?;
    let load = state.lifecycle.fetch::<Load>(&load_key).await?;
    auth::ensure_owned_by(&load, &subject)?;

    state.carriers.assign(&boat_key, &load_key).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Detach a load from the boat carrying it.
#[utoipa::path(
    delete,
    path = "/api/v1/boats/{boat_id}/loads/{load_id}",
    params(
        ("boat_id" = i64, Path, description = "Boat id"),
        ("load_id" = i64, Path, description = "Load id")
    ),
    responses(
        (status = 204, description = "Load detached"),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "Pairing does not exist", body = Error)
    ),
    tags = ["boats"],
    operation_id = "unassignLoad",
    security(("BearerAuth" = []))
)]
#[delete("/boats/{boat_id}/loads/{load_id}")]
pub async fn unassign_load(
    state: web::Data<HttpState>,
    req: HttpRequest,
    path: web::Path<(i64, i64)>,
) -> ApiResult<HttpResponse> {
    let subject = auth::require_subject(&req, state.identity.as_ref()).await?;
    let (boat_id, load_id) = path.into_inner();
    let boat_key = EntityKey::Id(boat_id);
    let load_key = EntityKey::Id(load_id);

    let boat = state.lifecycle.fetch::<Boat>(&boat_key).await?;
    auth::ensure_owned_by(&boat, &subject)?;
    let load = state.lifecycle.fetch::<Load>(&load_key).await?;
    auth::ensure_owned_by(&load, &subject)?;

    state.carriers.unassign(&boat_key, &load_key).await?;
    Ok(HttpResponse::NoContent().finish())
}
