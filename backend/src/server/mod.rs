//! Server construction and route wiring.

mod config;

pub use config::ServerConfig;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use crate::Trace;
#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::inbound::http::boats::{
    assign_load, create_boat, delete_boat, get_boat, list_boats, replace_boat, unassign_load,
    update_boat,
};
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::loads::{
    create_load, delete_load, get_load, list_loads, replace_load, update_load,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::{list_users, register_user};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// Dependency bundle for one worker's app instance.
#[derive(Clone)]
pub struct AppDependencies {
    /// Shared readiness and liveness state.
    pub health_state: web::Data<HealthState>,
    /// Service and port bundle for the REST handlers.
    pub http_state: web::Data<HttpState>,
}

/// Assemble the application: REST routes under `/api/v1`, health probes,
/// trace middleware, and (in debug builds) Swagger UI.
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
    } = deps;

    let api = web::scope("/api/v1")
        .app_data(http_state)
        .service(create_boat)
        .service(list_boats)
        .service(get_boat)
        .service(update_boat)
        .service(replace_boat)
        .service(delete_boat)
        .service(assign_load)
        .service(unassign_load)
        .service(create_load)
        .service(list_loads)
        .service(get_load)
        .service(update_load)
        .service(replace_load)
        .service(delete_load)
        .service(register_user)
        .service(list_users);

    let app = App::new()
        .app_data(health_state)
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct an Actix HTTP server from pre-built state and configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    http_state: HttpState,
    config: &ServerConfig,
) -> std::io::Result<Server> {
    let http_state = web::Data::new(http_state);
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
        })
    })
    .bind(config.bind_addr())?
    .run();

    health_state.mark_ready();
    Ok(server)
}
