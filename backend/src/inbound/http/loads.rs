//! Load HTTP handlers.
//!
//! ```text
//! POST   /api/v1/loads
//! GET    /api/v1/loads
//! GET    /api/v1/loads/{load_id}
//! PATCH  /api/v1/loads/{load_id}
//! PUT    /api/v1/loads/{load_id}
//! DELETE /api/v1/loads/{load_id}
//! ```
//!
//! The carrier field is read-only on this surface; it changes only through
//! the carrier routes on the boats resource.

use actix_web::{HttpRequest, HttpResponse, delete, get, patch, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{CarrierRef, Document, EntityKey, Error, Load, Stored};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth;
use crate::inbound::http::listing::{ListQuery, owner_scope};
use crate::inbound::http::state::HttpState;

/// Request payload for creating or replacing a load.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoadBody {
    /// Cargo volume, 1–9999.
    pub volume: i64,
    /// Item description, 1–50 characters.
    pub item: String,
    /// Creation date in `DD/MM/YYYY` form.
    pub creation_date: String,
}

/// Carrier reference returned to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CarrierBody {
    /// Id of the carrying boat.
    pub id: i64,
    /// Kind of the referenced entity.
    pub kind: String,
}

impl From<CarrierRef> for CarrierBody {
    fn from(reference: CarrierRef) -> Self {
        Self {
            id: reference.id,
            kind: reference.kind.as_str().to_owned(),
        }
    }
}

/// Load representation returned to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoadResponseBody {
    /// Store-allocated id.
    pub id: i64,
    /// Cargo volume.
    pub volume: i64,
    /// Item description.
    pub item: String,
    /// Creation date in `DD/MM/YYYY` form.
    pub creation_date: String,
    /// Owning subject id.
    pub user: String,
    /// Carrying boat; null while unassigned.
    pub carrier: Option<CarrierBody>,
}

impl LoadResponseBody {
    fn try_from_stored(stored: &Stored<Load>) -> ApiResult<Self> {
        let id = stored
            .id()
            .ok_or_else(|| Error::internal("load key has no numeric id"))?;
        Ok(Self {
            id,
            volume: stored.entity.volume,
            item: stored.entity.item.clone(),
            creation_date: stored.entity.creation_date.clone(),
            user: stored.entity.user.to_string(),
            carrier: stored.entity.carrier.map(CarrierBody::from),
        })
    }
}

/// One page of loads with the exact kind total and a continuation link.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoadPageBody {
    /// Loads on this page.
    pub loads: Vec<LoadResponseBody>,
    /// Exact count for the listing's scope.
    pub total: u64,
    /// Link to the next page; absent on the final page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// Create a load owned by the authenticated subject.
///
/// New loads start unassigned; only the carrier routes change assignment.
#[utoipa::path(
    post,
    path = "/api/v1/loads",
    request_body = LoadBody,
    responses(
        (status = 201, description = "Load created", body = LoadResponseBody),
        (status = 400, description = "Validation failed", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 500, description = "Storage failure", body = Error)
    ),
    tags = ["loads"],
    operation_id = "createLoad",
    security(("BearerAuth" = []))
)]
#[post("/loads")]
pub async fn create_load(
    state: web::Data<HttpState>,
    req: HttpRequest,
    payload: web::Json<LoadBody>,
) -> ApiResult<HttpResponse> {
    let subject = auth::require_subject(&req, state.identity.as_ref()).await?;
    let LoadBody {
        volume,
        item,
        creation_date,
    } = payload.into_inner();

    let created = state
        .lifecycle
        .create(Load::new(volume, item, creation_date, subject))
        .await?;

    Ok(HttpResponse::Created().json(LoadResponseBody::try_from_stored(&created)?))
}

/// Fetch one load owned by the authenticated subject.
#[utoipa::path(
    get,
    path = "/api/v1/loads/{load_id}",
    params(("load_id" = i64, Path, description = "Load id")),
    responses(
        (status = 200, description = "Load found", body = LoadResponseBody),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "No such load", body = Error)
    ),
    tags = ["loads"],
    operation_id = "getLoad",
    security(("BearerAuth" = []))
)]
#[get("/loads/{load_id}")]
pub async fn get_load(
    state: web::Data<HttpState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> ApiResult<web::Json<LoadResponseBody>> {
    let subject = auth::require_subject(&req, state.identity.as_ref()).await?;
    let key = EntityKey::Id(path.into_inner());

    let stored = state.lifecycle.fetch::<Load>(&key).await?;
    auth::ensure_owned_by(&stored, &subject)?;

    Ok(web::Json(LoadResponseBody::try_from_stored(&stored)?))
}

/// List loads one page at a time.
///
/// Authenticated requests list the subject's own loads; anonymous requests
/// fall back to public read over every load.
#[utoipa::path(
    get,
    path = "/api/v1/loads",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of loads", body = LoadPageBody),
        (status = 400, description = "Malformed cursor", body = Error),
        (status = 401, description = "Invalid credential", body = Error)
    ),
    tags = ["loads"],
    operation_id = "listLoads",
    security((), ("BearerAuth" = []))
)]
#[get("/loads")]
pub async fn list_loads(
    state: web::Data<HttpState>,
    req: HttpRequest,
    query: web::Query<ListQuery>,
) -> ApiResult<web::Json<LoadPageBody>> {
    let identity = auth::identify(&req, state.identity.as_ref()).await?;
    let listing = state
        .lifecycle
        .list::<Load>(owner_scope(&identity), query.cursor())
        .await?;

    let loads = listing
        .page
        .items
        .iter()
        .map(LoadResponseBody::try_from_stored)
        .collect::<ApiResult<Vec<_>>>()?;
    let next = listing
        .page
        .next_cursor
        .as_ref()
        .and_then(|cursor| state.next_url("loads", cursor));

    Ok(web::Json(LoadPageBody {
        loads,
        total: listing.total,
        next,
    }))
}

/// Patch a load's editable fields, re-validating the whole record.
///
/// The carrier field is not editable here; patches naming it are ignored.
#[utoipa::path(
    patch,
    path = "/api/v1/loads/{load_id}",
    params(("load_id" = i64, Path, description = "Load id")),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Load updated", body = LoadResponseBody),
        (status = 400, description = "Merged record failed validation", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "No such load", body = Error)
    ),
    tags = ["loads"],
    operation_id = "updateLoad",
    security(("BearerAuth" = []))
)]
#[patch("/loads/{load_id}")]
pub async fn update_load(
    state: web::Data<HttpState>,
    req: HttpRequest,
    path: web::Path<i64>,
    payload: web::Json<Document>,
) -> ApiResult<web::Json<LoadResponseBody>> {
    let subject = auth::require_subject(&req, state.identity.as_ref()).await?;
    let key = EntityKey::Id(path.into_inner());

    let stored = state.lifecycle.fetch::<Load>(&key).await?;
    auth::ensure_owned_by(&stored, &subject)?;

    let updated = state.lifecycle.update(&stored, &payload.into_inner()).await?;
    Ok(web::Json(LoadResponseBody::try_from_stored(&updated)?))
}

/// Replace every field of a load, keeping its id, owner, and carrier.
#[utoipa::path(
    put,
    path = "/api/v1/loads/{load_id}",
    params(("load_id" = i64, Path, description = "Load id")),
    request_body = LoadBody,
    responses(
        (status = 200, description = "Load replaced", body = LoadResponseBody),
        (status = 400, description = "Replacement failed validation", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "No such load", body = Error)
    ),
    tags = ["loads"],
    operation_id = "replaceLoad",
    security(("BearerAuth" = []))
)]
#[put("/loads/{load_id}")]
pub async fn replace_load(
    state: web::Data<HttpState>,
    req: HttpRequest,
    path: web::Path<i64>,
    payload: web::Json<LoadBody>,
) -> ApiResult<web::Json<LoadResponseBody>> {
    let subject = auth::require_subject(&req, state.identity.as_ref()).await?;
    let key = EntityKey::Id(path.into_inner());

    let stored = state.lifecycle.fetch::<Load>(&key).await?;
    auth::ensure_owned_by(&stored, &subject)?;

    let LoadBody {
        volume,
        item,
        creation_date,
    } = payload.into_inner();
    let mut replacement = Load::new(volume, item, creation_date, stored.entity.user.clone());
    // Replacement data has no carrier surface; the existing assignment
    // survives a full replace.
    replacement.carrier = stored.entity.carrier;

    let replaced = state.lifecycle.replace(&stored, replacement).await?;
    Ok(web::Json(LoadResponseBody::try_from_stored(&replaced)?))
}

/// Delete a load.
#[utoipa::path(
    delete,
    path = "/api/v1/loads/{load_id}",
    params(("load_id" = i64, Path, description = "Load id")),
    responses(
        (status = 204, description = "Load deleted"),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "No such load", body = Error)
    ),
    tags = ["loads"],
    operation_id = "deleteLoad",
    security(("BearerAuth" = []))
)]
#[delete("/loads/{load_id}")]
pub async fn delete_load(
    state: web::Data<HttpState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let subject = auth::require_subject(&req, state.identity.as_ref()).await?;
    let key = EntityKey::Id(path.into_inner());

    let stored = state.lifecycle.fetch::<Load>(&key).await?;
    auth::ensure_owned_by(&stored, &subject)?;

    state.lifecycle.destroy(&stored).await?;
    Ok(HttpResponse::NoContent().finish())
}
