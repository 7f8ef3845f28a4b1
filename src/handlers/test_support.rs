use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App, Error};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::db::MemoryRepository;
use crate::handlers::auth::KnownUsernames;
use crate::services::activity::ActivityService;
use crate::utils::jwt::JwtKeys;

pub(crate) const TEST_PASSWORD: &str = "password123";

/// Full route table over a fresh in-memory store.
pub(crate) async fn init_app(
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    let service = ActivityService::new(Arc::new(MemoryRepository::new()));
    test::init_service(
        App::new()
            .app_data(web::Data::new(service))
            .app_data(web::Data::new(JwtKeys::new("test-secret")))
            .app_data(web::Data::new(KnownUsernames::new(100)))
            .app_data(web::JsonConfig::default().error_handler(crate::errors::json_error_handler))
            .configure(crate::configure_routes),
    )
    .await
}

pub(crate) fn authed(req: test::TestRequest, token: &str) -> test::TestRequest {
    req.insert_header(("Authorization", format!("Bearer {}", token)))
}

/// Registers `username` and returns its bearer token.
pub(crate) async fn register_user<S, B>(app: &S, username: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/register/")
        .set_json(json!({"username": username, "password": TEST_PASSWORD}))
        .to_request();
    let body: Value = test::call_and_read_body_json(app, req).await;
    body["token"].as_str().unwrap().to_string()
}

pub(crate) async fn create_activity<S, B>(app: &S, token: &str, date: &str, kg: f64) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = authed(test::TestRequest::post(), token)
        .uri("/api/activities/")
        .set_json(json!({"date": date, "category": "transport", "carbon_emission_kg": kg}))
        .to_request();
    test::call_and_read_body_json(app, req).await
}

pub(crate) async fn get_json<S, B>(app: &S, token: &str, uri: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = authed(test::TestRequest::get(), token).uri(uri).to_request();
    test::call_and_read_body_json(app, req).await
}
