use std::sync::Arc;

use actix_web::{App, http::StatusCode, test, web};
use serde_json::{Value, json};

use gamecorn_alerts::{
    config::{AuthConfig, DonationConfig},
    external::SimulatedSynthesizer,
    handlers,
    middlewares::AuthMiddleware,
    services::*,
    utils::JwtService,
};

struct TestServices {
    auth: AuthService,
    donations: DonationService,
    player: OverlayPlayer,
    store: QueueStore,
}

fn services(enabled: bool) -> TestServices {
    let store = QueueStore::in_memory("donations");
    let synthesizer = Arc::new(SimulatedSynthesizer::new(10.0));
    let auth = AuthService::new(
        JwtService::new("api-test-secret", 600),
        AuthConfig {
            email: "admin@gamecorn.live".to_string(),
            username: "GameCorn".to_string(),
            password_hash: bcrypt::hash("Password123", 4).unwrap(),
        },
    );
    let donations = DonationService::new(
        store.clone(),
        synthesizer.clone(),
        DonationConfig {
            enabled,
            ..DonationConfig::default()
        },
    );
    let player = OverlayPlayer::new(store.clone(), synthesizer, PlaybackTimings::default());
    TestServices {
        auth,
        donations,
        player,
        store,
    }
}

macro_rules! init_app {
    ($svc:expr) => {
        test::init_service(
            App::new()
                .wrap(AuthMiddleware::new($svc.auth.clone()))
                .app_data(web::Data::new($svc.auth.clone()))
                .app_data(web::Data::new($svc.donations.clone()))
                .app_data(web::Data::new($svc.player.clone()))
                .configure(handlers::overlay_config)
                .service(
                    web::scope("/api/v1")
                        .configure(handlers::auth_config)
                        .configure(handlers::voice_config)
                        .configure(handlers::donation_config),
                ),
        )
        .await
    };
}

macro_rules! login_token {
    ($app:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({"email": "admin@gamecorn.live", "password": "Password123"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&$app, req).await;
        body["data"]["access_token"].as_str().unwrap().to_string()
    }};
}

#[actix_web::test]
async fn test_voice_catalog_is_public() {
    let svc = services(true);
    let app = init_app!(svc);

    let req = test::TestRequest::get().uri("/api/v1/voices").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["success"], true);
    let voices = body["data"].as_array().unwrap();
    assert_eq!(voices.len(), 15);
    assert!(voices.iter().any(|v| v["id"] == "fun-robot"));
}

#[actix_web::test]
async fn test_login_rejects_bad_password() {
    let svc = services(true);
    let app = init_app!(svc);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({"email": "admin@gamecorn.live", "password": "wrong"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "AUTH_ERROR");
}

#[actix_web::test]
async fn test_anonymous_donation_is_rejected() {
    let svc = services(true);
    let app = init_app!(svc);

    let req = test::TestRequest::post()
        .uri("/api/v1/donations")
        .set_json(json!({"amount": "100", "message": "Hi!"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "NOT_AUTHENTICATED");
    assert!(svc.store.read().await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_logged_in_donation_is_queued() {
    let svc = services(true);
    let app = init_app!(svc);
    let token = login_token!(app);

    let req = test::TestRequest::post()
        .uri("/api/v1/donations")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({"amount": "100", "message": "Hi!", "voice": "ru-RU-DmitryNeural"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["voice_name"], "Дмитрий");
    assert_eq!(body["data"]["donation"]["username"], "GameCorn");
    assert_eq!(body["data"]["donation"]["isPlaying"], false);

    let records = svc.store.read().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].message, "Hi!");
}

#[actix_web::test]
async fn test_invalid_amount_with_session() {
    let svc = services(true);
    let app = init_app!(svc);
    let token = login_token!(app);

    let req = test::TestRequest::post()
        .uri("/api/v1/donations")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({"amount": "0", "message": ""}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "INVALID_AMOUNT");
}

#[actix_web::test]
async fn test_disabled_donations_are_forbidden() {
    let svc = services(false);
    let app = init_app!(svc);
    let token = login_token!(app);

    let req = test::TestRequest::post()
        .uri("/api/v1/donations")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({"amount": "100", "message": "Hi!"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/api/v1/donations/settings")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["enabled"], false);
    assert_eq!(body["data"]["message_max_chars"], 500);
}

#[actix_web::test]
async fn test_queue_requires_operator_token() {
    let svc = services(true);
    let app = init_app!(svc);

    let req = test::TestRequest::get()
        .uri("/api/v1/donations/queue")
        .to_request();
    let err = test::try_call_service(&app, req).await.err().unwrap();
    assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);

    let token = login_token!(app);
    let req = test::TestRequest::get()
        .uri("/api/v1/donations/queue")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 0);
}

#[actix_web::test]
async fn test_anonymous_preview_is_rejected() {
    let svc = services(true);
    let app = init_app!(svc);

    let req = test::TestRequest::post()
        .uri("/api/v1/donations/preview")
        .set_json(json!({"message": "Test", "voice": "fun-giant"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "NOT_AUTHENTICATED");
}

#[actix_web::test]
async fn test_preview_returns_utterance() {
    let svc = services(true);
    let app = init_app!(svc);
    let token = login_token!(app);

    let req = test::TestRequest::post()
        .uri("/api/v1/donations/preview")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({"message": "Test", "voice": "fun-giant"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["data"]["lang"], "en-US");
    assert!(svc.store.read().await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_overlay_state_starts_idle() {
    let svc = services(true);
    let app = init_app!(svc);

    let req = test::TestRequest::get().uri("/overlay/state").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["data"]["phase"], "idle");
    assert_eq!(body["data"]["progress"], 0.0);
}
