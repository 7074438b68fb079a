use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use chrono::NaiveDate;
use configuration::Config;
use core_types::Town;
use database::{DbRepository, connect_in_memory, run_migrations};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use weather::{CurrentConditions, DailyForecast, WeatherError, WeatherGateway};
use web_server::{AppState, build_router};

/// Canned weather, or a failure when `fail` is set.
struct StubGateway {
    fail: bool,
}

#[async_trait]
impl WeatherGateway for StubGateway {
    async fn get_current(&self, town: Town) -> Result<CurrentConditions, WeatherError> {
        if self.fail {
            return Err(WeatherError::Api(503, "down".to_string()));
        }
        Ok(CurrentConditions {
            town,
            observed_at: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap().and_hms_opt(10, 0, 0).unwrap(),
            temperature_c: 30.0,
            relative_humidity_pct: 70.0,
            wind_speed_kmh: 12.0,
            precipitation_mm: 0.0,
            weather_code: 0,
            description: "Clear sky".to_string(),
            icon: "clear-sky".to_string(),
        })
    }

    async fn get_forecast(&self, _town: Town, days: u8) -> Result<Vec<DailyForecast>, WeatherError> {
        if self.fail {
            return Err(WeatherError::Malformed("down".to_string()));
        }
        Ok((0..days)
            .map(|i| DailyForecast {
                date: NaiveDate::from_ymd_opt(2025, 3, 14 + i as u32).unwrap(),
                weather_code: 61,
                description: "Slight rain".to_string(),
                icon: "light-rain".to_string(),
                temperature_max_c: 31.0,
                temperature_min_c: 23.0,
                precipitation_mm: 2.5,
            })
            .collect())
    }
}

async fn app_with_gateway(fail: bool) -> Router {
    let pool = connect_in_memory().await.unwrap();
    run_migrations(&pool).await.unwrap();

    let mut config = Config::default();
    config.auth.bcrypt_cost = 4;

    let state = AppState::new(
        DbRepository::new(pool),
        Arc::new(StubGateway { fail }),
        config,
    )
    .unwrap();
    build_router(Arc::new(state))
}

async fn app() -> Router {
    app_with_gateway(false).await
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Option<String>, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().split(';').next().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, set_cookie, json)
}

async fn sign_up_and_log_in(app: &Router, username: &str) -> String {
    let (status, _, _) = send(
        app,
        Method::POST,
        "/api/signup",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "secret1",
            "confirm_password": "secret1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, cookie, body) = send(
        app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "username": username, "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], username);
    assert!(body.get("password_hash").is_none());
    cookie.unwrap()
}

fn submission(harvest: f64, cost: f64) -> Value {
    let price = 50.0 + 0.5 * harvest + 0.01 * cost;
    let revenue = price * harvest;
    json!({
        "market_price": price,
        "harvest_amount": harvest,
        "total_cost": cost,
        "total_revenue": revenue,
        "net_profit": revenue - cost
    })
}

#[tokio::test]
async fn health_and_towns_are_public() {
    let app = app().await;
    let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");

    let (status, _, towns) = send(&app, Method::GET, "/api/towns", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(towns.as_array().unwrap().len(), 12);
    assert_eq!(towns[0]["name"], "Anuradhapura");
}

#[tokio::test]
async fn protected_routes_need_a_session() {
    let app = app().await;
    for uri in ["/api/profile", "/api/analytics", "/api/weather"] {
        let (status, _, _) = send(&app, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
    }
    let (status, _, _) =
        send(&app, Method::GET, "/api/profile", Some("harvest_session=bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, home) = send(&app, Method::GET, "/api/home", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(home["greeting"].is_null());
}

#[tokio::test]
async fn signup_rules() {
    let app = app().await;
    let cookie = sign_up_and_log_in(&app, "farmer").await;
    assert!(cookie.starts_with("harvest_session="));

    let duplicate = json!({
        "username": "farmer",
        "email": "other@example.com",
        "password": "secret1",
        "confirm_password": "secret1"
    });
    let (status, _, body) = send(&app, Method::POST, "/api/signup", None, Some(duplicate)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Username already exists.");

    let mismatch = json!({
        "username": "grower",
        "email": "grower@example.com",
        "password": "secret1",
        "confirm_password": "secret2"
    });
    let (status, _, _) = send(&app, Method::POST, "/api/signup", None, Some(mismatch)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let short_name = json!({
        "username": "abc",
        "email": "abc@example.com",
        "password": "secret1",
        "confirm_password": "secret1"
    });
    let (status, _, _) = send(&app, Method::POST, "/api/signup", None, Some(short_name)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = app().await;
    sign_up_and_log_in(&app, "farmer").await;

    let (status, cookie, body) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "username": "farmer", "password": "nope123" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(cookie.is_none());
    assert_eq!(body["error"], "Invalid username or password.");
}

#[tokio::test]
async fn analytics_without_data_reports_insufficient_data() {
    let app = app().await;
    let cookie = sign_up_and_log_in(&app, "farmer").await;

    let (status, _, body) = send(&app, Method::GET, "/api/analytics", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "insufficient_data");
    assert!(body.get("chart").is_none());
    assert_eq!(body["summary"]["total_data_points"], 0);
}

#[tokio::test]
async fn submissions_feed_the_forecast() {
    let app = app().await;
    let cookie = sign_up_and_log_in(&app, "farmer").await;

    let figures = [
        (50.0, 4000.0),
        (61.0, 9000.0),
        (72.0, 5200.0),
        (83.0, 11000.0),
        (94.0, 6100.0),
        (105.0, 12000.0),
        (116.0, 4800.0),
        (127.0, 8800.0),
        (138.0, 7000.0),
        (150.0, 10400.0),
    ];
    for (harvest, cost) in figures {
        let (status, _, body) = send(
            &app,
            Method::POST,
            "/api/market-data",
            Some(&cookie),
            Some(submission(harvest, cost)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["id"].as_i64().unwrap() > 0);
    }

    let (status, _, body) = send(&app, Method::GET, "/api/analytics", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["summary"]["total_data_points"], 10);
    assert_eq!(body["history"].as_array().unwrap().len(), 3);
    assert_eq!(body["history"][0]["label"], "Month 1");

    let chart = &body["chart"];
    assert_eq!(chart["labels"].as_array().unwrap().len(), 3);
    assert_eq!(chart["price_series"].as_array().unwrap().len(), 3);
    assert_eq!(chart["profit_series"].as_array().unwrap().len(), 3);
    assert_eq!(chart["metrics"]["method"], "regression");
    assert!(chart["metrics"]["price_r2"].as_f64().unwrap() > 0.8);

    let (status, _, body) =
        send(&app, Method::DELETE, "/api/market-data", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 10);
}

#[tokio::test]
async fn invalid_submissions_are_rejected() {
    let app = app().await;
    let cookie = sign_up_and_log_in(&app, "farmer").await;

    let mut bad = submission(100.0, 8000.0);
    bad["market_price"] = json!(0.0);
    let (status, _, body) =
        send(&app, Method::POST, "/api/market-data", Some(&cookie), Some(bad)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("market_price"));
}

#[tokio::test]
async fn cost_profit_summary_reports_status() {
    let app = app().await;
    let cookie = sign_up_and_log_in(&app, "farmer").await;

    let figures = json!({
        "market_price": 50.0,
        "harvest_amount": 100.0,
        "total_cost": 8000.0,
        "total_revenue": 5000.0,
        "net_profit": -3000.0
    });
    let (status, _, body) =
        send(&app, Method::POST, "/api/cost-profit/summary", Some(&cookie), Some(figures)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "loss");
    assert_eq!(body["loss_pct"], 60.0);
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn weather_for_a_town() {
    let app = app().await;
    let cookie = sign_up_and_log_in(&app, "farmer").await;

    let (status, _, body) =
        send(&app, Method::GET, "/api/weather?town=mihintale&days=3", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["town"]["name"], "Mihintale");
    assert_eq!(body["current"]["description"], "Clear sky");
    assert_eq!(body["forecast"].as_array().unwrap().len(), 3);

    let (status, _, _) =
        send(&app, Method::GET, "/api/weather?town=Colombo", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn weather_failure_shows_the_fallback_message() {
    let app = app_with_gateway(true).await;
    let cookie = sign_up_and_log_in(&app, "farmer").await;

    let (status, _, body) = send(&app, Method::GET, "/api/weather", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Unable to fetch weather data. Please try again.");
}

#[tokio::test]
async fn password_change_and_logout() {
    let app = app().await;
    let cookie = sign_up_and_log_in(&app, "farmer").await;

    let same = json!({
        "current_password": "secret1",
        "new_password": "secret1",
        "confirm_password": "secret1"
    });
    let (status, _, _) =
        send(&app, Method::POST, "/api/settings/password", Some(&cookie), Some(same)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let wrong = json!({
        "current_password": "guess12",
        "new_password": "secret2",
        "confirm_password": "secret2"
    });
    let (status, _, body) =
        send(&app, Method::POST, "/api/settings/password", Some(&cookie), Some(wrong)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Current password is incorrect.");

    let change = json!({
        "current_password": "secret1",
        "new_password": "secret2",
        "confirm_password": "secret2"
    });
    let (status, _, _) =
        send(&app, Method::POST, "/api/settings/password", Some(&cookie), Some(change)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, home) = send(&app, Method::GET, "/api/home", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(home["greeting"].as_str().unwrap().starts_with("Good "));

    let (status, _, _) = send(&app, Method::POST, "/api/logout", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = send(&app, Method::GET, "/api/profile", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "username": "farmer", "password": "secret2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn support_messages_are_validated() {
    let app = app().await;
    let cookie = sign_up_and_log_in(&app, "farmer").await;

    let ok = json!({ "name": "Farmer", "email": "farmer@example.com", "message": "Hello" });
    let (status, _, body) = send(&app, Method::POST, "/api/support", Some(&cookie), Some(ok)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Your message has been sent!");

    let long = json!({ "name": "Farmer", "email": "farmer@example.com", "message": "x".repeat(501) });
    let (status, _, _) = send(&app, Method::POST, "/api/support", Some(&cookie), Some(long)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
