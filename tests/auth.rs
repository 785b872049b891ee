use actix_web::http::StatusCode;
use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use chrono::Duration;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use taskboard::auth::{LoginResponse, TokenService};
use taskboard::models::User;
use taskboard::store::{self, query::Filter, MemoryStore};
use taskboard::config::Config;
use taskboard::{commands, routes, AppContext};

async fn seeded_context() -> AppContext {
    let store = MemoryStore::new();
    commands::create_all(&store).await.unwrap();
    commands::seed(&store, 4).await.unwrap();
    AppContext::new(
        Arc::new(store),
        TokenService::new("integration-secret", Duration::hours(24)),
        4,
    )
}

#[actix_rt::test]
async fn test_register_and_login_flow() {
    let ctx = seeded_context().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(ctx.clone()))
            .wrap(Logger::default())
            .configure(routes::config),
    )
    .await;

    // Register a new user
    let register_payload = json!({
        "name": "Integration User",
        "email": "integration@example.com",
        "password": "Password123!"
    });
    let req = test::TestRequest::post()
        .uri("/auth/register/")
        .set_json(&register_payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let status = resp.status();
    let body_bytes = test::read_body(resp).await;
    assert_eq!(
        status,
        StatusCode::CREATED,
        "Registration failed. Body: {:?}",
        String::from_utf8_lossy(&body_bytes)
    );

    let registered: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
    assert_eq!(
        registered,
        json!({
            "id": 3,
            "name": "Integration User",
            "email": "integration@example.com",
            "is_admin": false
        })
    );

    // The stored password is a hash, not the submitted text
    let stored = User::find_by_email(ctx.store(), "integration@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_ne!(stored.password, "Password123!");

    // Login with the registered user
    let req_login = test::TestRequest::post()
        .uri("/auth/login/")
        .set_json(json!({
            "email": "integration@example.com",
            "password": "Password123!"
        }))
        .to_request();
    let resp_login = test::call_service(&app, req_login).await;
    let status_login = resp_login.status();
    let body_bytes_login = test::read_body(resp_login).await;
    assert_eq!(
        status_login,
        StatusCode::OK,
        "Login failed. Body: {:?}",
        String::from_utf8_lossy(&body_bytes_login)
    );

    let login_response: LoginResponse =
        serde_json::from_slice(&body_bytes_login).expect("Failed to parse login response JSON");
    assert_eq!(login_response.email, "integration@example.com");
    assert!(!login_response.is_admin);

    let claims = ctx.tokens.verify_token(&login_response.token).unwrap();
    assert_eq!(claims.sub, stored.id);
}

#[actix_rt::test]
async fn test_duplicate_email_is_a_conflict() {
    let ctx = seeded_context().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(ctx.clone()))
            .configure(routes::config),
    )
    .await;

    let payload = json!({ "email": "twice@example.com", "password": "Password123!" });
    let first = test::TestRequest::post()
        .uri("/auth/register/")
        .set_json(&payload)
        .to_request();
    assert_eq!(test::call_service(&app, first).await.status(), StatusCode::CREATED);

    let second = test::TestRequest::post()
        .uri("/auth/register/")
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, second).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Email address already in use" }));

    // Seeded accounts are taken too
    let seeded = test::TestRequest::post()
        .uri("/auth/register/")
        .set_json(json!({ "email": "admin@spam.com", "password": "whatever1" }))
        .to_request();
    assert_eq!(test::call_service(&app, seeded).await.status(), StatusCode::CONFLICT);

    let rows = store::count::<User>(ctx.store(), &Filter::eq("email", "twice@example.com"))
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[actix_rt::test]
async fn test_invalid_registration_inputs() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(seeded_context().await))
            .configure(routes::config),
    )
    .await;

    let test_cases = vec![
        // Deserialization errors (expect 400 for missing fields)
        (
            json!({ "password": "Password123!" }),
            StatusCode::BAD_REQUEST,
            "missing email",
        ),
        (
            json!({ "email": "test@example.com" }),
            StatusCode::BAD_REQUEST,
            "missing password",
        ),
        // Validation errors (expect 422 after successful deserialization)
        (
            json!({ "email": "invalid-email", "password": "Password123!" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid email format",
        ),
        (
            json!({ "email": "test@example.com", "password": "123" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "password too short",
        ),
    ];

    for (payload, expected_status, description) in test_cases {
        let req = test::TestRequest::post()
            .uri("/auth/register/")
            .set_json(&payload)
            .to_request();

        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body_bytes = test::read_body(resp).await;

        assert_eq!(
            status,
            expected_status,
            "Test case failed: {}. Body: {:?}",
            description,
            String::from_utf8_lossy(&body_bytes)
        );

        let body: serde_json::Value = serde_json::from_slice(&body_bytes)
            .unwrap_or_else(|_| panic!("{}: body is not JSON", description));
        assert!(
            body["error"].is_string(),
            "{}: expected an error message, got {}",
            description,
            body
        );
    }

    // Not JSON at all
    let req = test::TestRequest::post()
        .uri("/auth/register/")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
}

#[actix_rt::test]
async fn test_bad_credentials_get_identical_responses() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(seeded_context().await))
            .configure(routes::config),
    )
    .await;

    let attempts = [
        json!({ "email": "admin@spam.com", "password": "WrongPassword123!" }),
        json!({ "email": "nonexistent@example.com", "password": "spinynorman" }),
    ];

    let mut bodies = Vec::new();
    for payload in attempts {
        let req = test::TestRequest::post()
            .uri("/auth/login/")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "payload {}", payload);
        bodies.push(test::read_body(resp).await);
    }

    assert_eq!(bodies[0], bodies[1]);
    let body: serde_json::Value = serde_json::from_slice(&bodies[0]).unwrap();
    assert_eq!(body, json!({ "error": "Invalid email or password" }));
}

#[actix_rt::test]
async fn test_seeded_admin_can_login() {
    let ctx = seeded_context().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(ctx.clone()))
            .configure(routes::config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_json(json!({ "email": "admin@spam.com", "password": "spinynorman" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let login: LoginResponse = test::read_body_json(resp).await;
    assert!(login.is_admin);
    assert_eq!(login.email, "admin@spam.com");
    assert_eq!(ctx.tokens.verify_token(&login.token).unwrap().sub, 1);
}

#[actix_rt::test]
async fn test_memory_store_from_config_is_ready_to_use() {
    let config = Config {
        database_url: "memory://".to_string(),
        jwt_secret: "memory-secret".to_string(),
        token_ttl_hours: 1,
        bcrypt_cost: 4,
        server_port: 0,
        server_host: "127.0.0.1".to_string(),
    };
    let ctx = AppContext::from_config(&config).await.unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(ctx.clone()))
            .configure(routes::config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/auth/register/")
        .set_json(json!({ "email": "fresh@example.com", "password": "Password123!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["id"], 1);

    let user = User::find_by_email(ctx.store(), "fresh@example.com")
        .await
        .unwrap()
        .expect("registered user should be stored");
    assert!(!user.is_admin);
}

#[actix_rt::test]
async fn test_from_config_rejects_a_bad_token_lifetime() {
    let config = Config {
        database_url: "memory://".to_string(),
        jwt_secret: "memory-secret".to_string(),
        token_ttl_hours: i64::MAX,
        bcrypt_cost: 4,
        server_port: 0,
        server_host: "127.0.0.1".to_string(),
    };
    assert!(matches!(
        AppContext::from_config(&config).await,
        Err(taskboard::AppError::ConfigError(_))
    ));
}
