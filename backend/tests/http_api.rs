//! HTTP integration coverage driven through the assembled application.
//!
//! Exercises the REST surface end to end over the in-memory store: bearer
//! auth with public-read fallback, ownership enforcement, CRUD round
//! trips, carrier assignment, pagination links, and health probes.

use std::sync::Arc;

use actix_web::{test, web};
use serde_json::{Value, json};
use url::Url;

use backend::domain::ports::{DocumentStore, FixtureIdentityVerifier, IdentityVerifier};
use backend::domain::{CarrierService, CounterLedger, EntityLifecycle, OwnerId};
use backend::inbound::http::health::HealthState;
use backend::inbound::http::state::HttpState;
use backend::outbound::MemoryDocumentStore;
use backend::server::{AppDependencies, build_app};

const ALICE_TOKEN: &str = "alice-token";
const BOB_TOKEN: &str = "bob-token";

async fn deps() -> AppDependencies {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
    let counters = Arc::new(CounterLedger::new(Arc::clone(&store)));
    counters.initialize().await.expect("bootstrap succeeds");

    let identity: Arc<dyn IdentityVerifier> = Arc::new(
        FixtureIdentityVerifier::new()
            .with_token(
                ALICE_TOKEN,
                OwnerId::new("auth0|alice").expect("valid subject"),
            )
            .with_token(BOB_TOKEN, OwnerId::new("auth0|bob").expect("valid subject")),
    );

    let http_state = HttpState {
        lifecycle: Arc::new(EntityLifecycle::new(
            Arc::clone(&store),
            Arc::clone(&counters),
        )),
        carriers: Arc::new(CarrierService::new(store)),
        identity,
        public_base: Url::parse("http://localhost:8080/api/v1/").expect("valid base url"),
    };

    let health_state = web::Data::new(HealthState::new());
    health_state.mark_ready();

    AppDependencies {
        health_state,
        http_state: web::Data::new(http_state),
    }
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

fn boat_body(name: &str, length: i64) -> Value {
    json!({ "name": name, "type": "Sailboat", "length": length })
}

fn load_body(item: &str) -> Value {
    json!({ "volume": 5, "item": item, "creation_date": "01/02/2003" })
}

async fn create_boat<S, B>(app: &S, token: &str, name: &str) -> i64
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse<B>,
            Error = actix_web::Error,
        >,
    B: actix_web::body::MessageBody,
    B::Error: std::fmt::Debug,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/boats")
        .insert_header(bearer(token))
        .set_json(boat_body(name, 28))
        .to_request();
    let res = test::call_service(app, req).await;
    assert_eq!(res.status(), 201, "boat create should succeed");
    let body: Value = test::read_body_json(res).await;
    body["id"].as_i64().expect("created boat has an id")
}

async fn create_load<S, B>(app: &S, token: &str, item: &str) -> i64
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse<B>,
            Error = actix_web::Error,
        >,
    B: actix_web::body::MessageBody,
    B::Error: std::fmt::Debug,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/loads")
        .insert_header(bearer(token))
        .set_json(load_body(item))
        .to_request();
    let res = test::call_service(app, req).await;
    assert_eq!(res.status(), 201, "load create should succeed");
    let body: Value = test::read_body_json(res).await;
    body["id"].as_i64().expect("created load has an id")
}

#[actix_web::test]
async fn boat_crud_round_trips() {
    let app = test::init_service(build_app(deps().await)).await;
    let boat_id = create_boat(&app, ALICE_TOKEN, "Sea Witch").await;

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/boats/{boat_id}"))
            .insert_header(bearer(ALICE_TOKEN))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), 200);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["name"], "Sea Witch");
    assert_eq!(body["type"], "Sailboat");
    assert_eq!(body["length"], 28);
    assert_eq!(body["user"], "auth0|alice");

    let res = test::call_service(
        &app,
        test::TestRequest::patch()
            .uri(&format!("/api/v1/boats/{boat_id}"))
            .insert_header(bearer(ALICE_TOKEN))
            .set_json(json!({ "name": "Sea Witch II" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), 200);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["name"], "Sea Witch II");
    assert_eq!(body["length"], 28, "unpatched fields survive");

    let res = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/v1/boats/{boat_id}"))
            .insert_header(bearer(ALICE_TOKEN))
            .set_json(boat_body("Revenant", 41))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), 200);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["id"].as_i64(), Some(boat_id), "replace keeps the id");
    assert_eq!(body["name"], "Revenant");
    assert_eq!(body["length"], 41);

    let res = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/boats/{boat_id}"))
            .insert_header(bearer(ALICE_TOKEN))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), 204);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/boats/{boat_id}"))
            .insert_header(bearer(ALICE_TOKEN))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), 404);
}

#[actix_web::test]
async fn invalid_boats_are_rejected_with_field_detail() {
    let app = test::init_service(build_app(deps().await)).await;

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/boats")
            .insert_header(bearer(ALICE_TOKEN))
            .set_json(boat_body("Sea Witch", 0))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), 400);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["failure"]["field"], "length");
}

#[actix_web::test]
async fn mutations_require_a_bearer_credential() {
    let app = test::init_service(build_app(deps().await)).await;

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/boats")
            .set_json(boat_body("Sea Witch", 28))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), 401);
}

#[actix_web::test]
async fn foreign_entities_are_forbidden() {
    let app = test::init_service(build_app(deps().await)).await;
    let boat_id = create_boat(&app, ALICE_TOKEN, "Sea Witch").await;

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/boats/{boat_id}"))
            .insert_header(bearer(BOB_TOKEN))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), 403);
}

#[actix_web::test]
async fn listings_fall_back_to_public_read_without_a_credential() {
    let app = test::init_service(build_app(deps().await)).await;
    create_boat(&app, ALICE_TOKEN, "Alice One").await;
    create_boat(&app, ALICE_TOKEN, "Alice Two").await;
    create_boat(&app, BOB_TOKEN, "Bob One").await;

    // Anonymous: every boat, with the kind total.
    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/boats").to_request(),
    )
    .await;
    assert_eq!(res.status(), 200);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["total"], 3);

    // Authenticated: scoped to the subject's own boats.
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/boats")
            .insert_header(bearer(ALICE_TOKEN))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), 200);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["total"], 2);
    let boats = body["boats"].as_array().expect("boats array");
    assert!(boats.iter().all(|boat| boat["user"] == "auth0|alice"));

    // A presented-but-invalid credential is rejected, not downgraded.
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/boats")
            .insert_header(bearer("forged-token"))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), 401);
}

#[actix_web::test]
async fn listing_pages_chain_through_next_links() {
    let app = test::init_service(build_app(deps().await)).await;
    for index in 0..7 {
        create_boat(&app, ALICE_TOKEN, &format!("Boat {index}")).await;
    }

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/boats")
            .insert_header(bearer(ALICE_TOKEN))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), 200);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["boats"].as_array().map(Vec::len), Some(5));
    assert_eq!(body["total"], 7);

    let next = body["next"].as_str().expect("first page links onward");
    let next_url = Url::parse(next).expect("next link is a URL");
    let cursor = next_url
        .query_pairs()
        .find(|(name, _)| name == "cursor")
        .map(|(_, value)| value.into_owned())
        .expect("next link carries the cursor");

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/boats?cursor={cursor}"))
            .insert_header(bearer(ALICE_TOKEN))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), 200);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["boats"].as_array().map(Vec::len), Some(2));
    assert_eq!(body.get("next"), None, "final page has no next link");
}

#[actix_web::test]
async fn garbage_cursors_are_bad_requests() {
    let app = test::init_service(build_app(deps().await)).await;

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/boats?cursor=garbage!")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), 400);
}

#[actix_web::test]
async fn carrier_assignment_and_cascade_flow() {
    let app = test::init_service(build_app(deps().await)).await;
    let first_boat = create_boat(&app, ALICE_TOKEN, "Sea Witch").await;
    let second_boat = create_boat(&app, ALICE_TOKEN, "Revenant").await;
    let load_id = create_load(&app, ALICE_TOKEN, "LEGO Blocks").await;

    let res = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/v1/boats/{first_boat}/loads/{load_id}"))
            .insert_header(bearer(ALICE_TOKEN))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), 204);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/loads/{load_id}"))
            .insert_header(bearer(ALICE_TOKEN))
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["carrier"]["id"].as_i64(), Some(first_boat));
    assert_eq!(body["carrier"]["kind"], "Boat");

    // Exclusivity: a carried load cannot be reassigned directly.
    let res = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/v1/boats/{second_boat}/loads/{load_id}"))
            .insert_header(bearer(ALICE_TOKEN))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), 409);

    // Unassigning from a boat that is not the carrier is a 404.
    let res = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/boats/{second_boat}/loads/{load_id}"))
            .insert_header(bearer(ALICE_TOKEN))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), 404);

    // Deleting the carrying boat detaches the load.
    let res = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/boats/{first_boat}"))
            .insert_header(bearer(ALICE_TOKEN))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), 204);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/loads/{load_id}"))
            .insert_header(bearer(ALICE_TOKEN))
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["carrier"], Value::Null);
}

#[actix_web::test]
async fn user_registration_is_idempotent() {
    let app = test::init_service(build_app(deps().await)).await;

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/users")
            .insert_header(bearer(ALICE_TOKEN))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), 201);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["id"], "auth0|alice");

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/users")
            .insert_header(bearer(ALICE_TOKEN))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), 200);

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/users").to_request(),
    )
    .await;
    assert_eq!(res.status(), 200);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["total"], 1, "re-registration does not double count");
}

#[actix_web::test]
async fn health_probes_answer() {
    let app = test::init_service(build_app(deps().await)).await;

    for path in ["/health/live", "/health/ready"] {
        let res = test::call_service(&app, test::TestRequest::get().uri(path).to_request()).await;
        assert_eq!(res.status(), 200, "{path} should answer 200");
    }
}
