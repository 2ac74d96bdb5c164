//! OpenAPI documentation configuration.
//!
//! Defines the [`ApiDoc`] struct generating the OpenAPI specification for
//! the REST surface: boat and load CRUD, carrier assignment, user
//! registration, and health probes. Swagger UI serves the document in
//! debug builds.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Marina freight API",
        description = "HTTP interface for boat and load management with \
                       carrier assignment and per-owner counts."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerAuth" = [])),
    paths(
        crate::inbound::http::boats::create_boat,
        crate::inbound::http::boats::get_boat,
        crate::inbound::http::boats::list_boats,
        crate::inbound::http::boats::update_boat,
        crate::inbound::http::boats::replace_boat,
        crate::inbound::http::boats::delete_boat,
        crate::inbound::http::boats::assign_load,
        crate::inbound::http::boats::unassign_load,
        crate::inbound::http::loads::create_load,
        crate::inbound::http::loads::get_load,
        crate::inbound::http::loads::list_loads,
        crate::inbound::http::loads::update_load,
        crate::inbound::http::loads::replace_load,
        crate::inbound::http::loads::delete_load,
        crate::inbound::http::users::register_user,
        crate::inbound::http::users::list_users,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        crate::domain::Error,
        crate::domain::ErrorCode,
        crate::inbound::http::boats::BoatBody,
        crate::inbound::http::boats::BoatResponseBody,
        crate::inbound::http::boats::BoatPageBody,
        crate::inbound::http::loads::LoadBody,
        crate::inbound::http::loads::CarrierBody,
        crate::inbound::http::loads::LoadResponseBody,
        crate::inbound::http::loads::LoadPageBody,
        crate::inbound::http::users::UserResponseBody,
        crate::inbound::http::users::UserPageBody,
    )),
    tags(
        (name = "boats", description = "Boat CRUD and carrier assignment"),
        (name = "loads", description = "Load CRUD"),
        (name = "users", description = "User registration and listing"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
