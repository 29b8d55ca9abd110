use actix_web::{middleware::Logger, test, App};
use chrono::DateTime;
use std::sync::Arc;
use todo_auth_server::{configure_routes, AppState, InMemoryCredentialStore, Settings};

#[actix_web::test]
async fn test_health_check() {
    let config = Settings::for_test("test_secret").expect("Failed to load test config");
    let state = AppState::new(config, Arc::new(InMemoryCredentialStore::new())).unwrap();

    let app = test::init_service(App::new().configure(|cfg| configure_routes(cfg, &state))).await;

    // Health sits outside the protected prefix, so no token is needed
    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body = test::read_body(resp).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["status"], "healthy");
    assert!(DateTime::parse_from_rfc3339(json["timestamp"].as_str().unwrap()).is_ok());
}

#[actix_web::test]
async fn test_routes_behind_request_logger() {
    let config = Settings::for_test("test_secret").expect("Failed to load test config");
    let state = AppState::new(config, Arc::new(InMemoryCredentialStore::new())).unwrap();

    let app = test::init_service(
        App::new()
            .wrap(Logger::default())
            .configure(|cfg| configure_routes(cfg, &state)),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    // The gate still answers 401 through the logging wrapper
    let req = test::TestRequest::get().uri("/api/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
}
