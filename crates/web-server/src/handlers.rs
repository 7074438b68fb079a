use crate::error::AppError;
use crate::session::{
    CurrentUser, expired_cookie, hash_password, hash_token, new_token, session_cookie,
    verify_password,
};
use crate::views::{
    AnalyticsView, ChartPayload, ClearedView, HomeView, INSUFFICIENT_DATA_MESSAGE, MessageView,
    PredictionView, SubmissionView, TownView, WeatherView, greeting,
};
use crate::AppState;
use analytics::{CostProfitSummary, PredictionError, recent_history, summarize};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{Duration, Utc};
use core_types::{NewMarketData, Town, UserAccount};
use serde::Deserialize;
use std::sync::Arc;

const MIN_PASSWORD_LEN: usize = 6;
const MAX_FIELD_LEN: usize = 150;
const MAX_SUPPORT_MESSAGE_LEN: usize = 500;
const HISTORY_LIMIT: usize = 3;

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct SupportForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub town: Option<String>,
    pub days: Option<u8>,
}

/// # GET /api/home
pub async fn home(user: Option<CurrentUser>) -> Json<HomeView> {
    let user = user.map(|u| u.user);
    Json(HomeView {
        greeting: user.as_ref().map(|_| greeting(Utc::now())),
        user,
    })
}

/// # GET /api/towns
pub async fn list_towns() -> Json<Vec<TownView>> {
    Json(Town::ALL.into_iter().map(TownView::from).collect())
}

/// # POST /api/signup
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(form): Json<SignupForm>,
) -> Result<impl IntoResponse, AppError> {
    let username = form.username.trim();
    let email = form.email.trim();

    let username_len = username.chars().count();
    if !(4..=MAX_FIELD_LEN).contains(&username_len) {
        return Err(AppError::Validation(
            "Username must be between 4 and 150 characters.".to_string(),
        ));
    }
    if !is_valid_email(email) {
        return Err(AppError::Validation("Please enter a valid email address.".to_string()));
    }
    validate_new_password(&form.password, &form.confirm_password)?;

    if state.repo.find_user_by_username(username).await?.is_some() {
        return Err(AppError::Conflict("Username already exists.".to_string()));
    }
    if state.repo.find_user_by_email(email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered.".to_string()));
    }

    let hash = hash_password(form.password, state.config.auth.bcrypt_cost).await?;
    let user = state.repo.create_user(username, email, &hash).await?;
    tracing::info!(user_id = user.id, "Account created.");

    Ok((StatusCode::CREATED, Json(user)))
}

/// # POST /api/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(form): Json<LoginForm>,
) -> Result<(CookieJar, Json<UserAccount>), AppError> {
    let invalid = || AppError::Unauthorized("Invalid username or password.".to_string());

    let user = state
        .repo
        .find_user_by_username(form.username.trim())
        .await?
        .ok_or_else(invalid)?;
    if !verify_password(form.password, user.password_hash.clone()).await? {
        return Err(invalid());
    }

    let now = Utc::now();
    match state.repo.purge_expired_sessions(now).await {
        Ok(0) => {}
        Ok(purged) => tracing::debug!(purged, "Expired sessions removed."),
        Err(e) => tracing::warn!(error = ?e, "Could not purge expired sessions."),
    }

    let token = new_token();
    let ttl = Duration::hours(state.config.auth.session_ttl_hours as i64);
    state
        .repo
        .create_session(user.id, &hash_token(&token), now + ttl)
        .await?;
    tracing::info!(user_id = user.id, "User logged in.");

    let jar = jar.add(session_cookie(token, state.config.auth.cookie_secure));
    Ok((jar, Json(user)))
}

/// # POST /api/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageView>), AppError> {
    state.repo.delete_session(&current.token_hash).await?;
    Ok((jar.remove(expired_cookie()), Json(MessageView::new("You have been logged out."))))
}

/// # GET /api/profile
pub async fn profile(current: CurrentUser) -> Json<UserAccount> {
    Json(current.user)
}

/// # POST /api/settings/password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(form): Json<PasswordForm>,
) -> Result<Json<MessageView>, AppError> {
    validate_new_password(&form.new_password, &form.confirm_password)?;

    let verified =
        verify_password(form.current_password.clone(), current.user.password_hash.clone()).await?;
    if !verified {
        return Err(AppError::Validation("Current password is incorrect.".to_string()));
    }
    if form.new_password == form.current_password {
        return Err(AppError::Validation(
            "New password cannot be the same as the current password.".to_string(),
        ));
    }

    let hash = hash_password(form.new_password, state.config.auth.bcrypt_cost).await?;
    state
        .repo
        .update_password(current.user.id, &hash, Some(&current.token_hash))
        .await?;
    tracing::info!(user_id = current.user.id, "Password updated.");

    Ok(Json(MessageView::new("Password updated successfully!")))
}

/// # POST /api/support
pub async fn support(
    current: CurrentUser,
    Json(form): Json<SupportForm>,
) -> Result<Json<MessageView>, AppError> {
    let filled = [&form.name, &form.email, &form.message]
        .iter()
        .all(|f| !f.trim().is_empty());
    if !filled || form.message.chars().count() > MAX_SUPPORT_MESSAGE_LEN {
        return Err(AppError::Validation(
            "Please fill out all fields correctly (message max 500 characters).".to_string(),
        ));
    }

    tracing::info!(user_id = current.user.id, from = %form.email, "Support message received.");
    Ok(Json(MessageView::new("Your message has been sent!")))
}

/// # GET /api/weather?town=&days=
pub async fn get_weather(
    State(state): State<Arc<AppState>>,
    _current: CurrentUser,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<WeatherView>, AppError> {
    let town = match query.town.as_deref() {
        Some(name) if !name.trim().is_empty() => name.parse::<Town>()?,
        _ => state.config.weather.default_town,
    };
    let days = query.days.unwrap_or(state.config.weather.forecast_days);

    let (current, forecast) = tokio::join!(
        state.gateway.get_current(town),
        state.gateway.get_forecast(town, days)
    );

    Ok(Json(WeatherView {
        town: TownView::from(town),
        current: current?,
        forecast: forecast?,
    }))
}

/// # POST /api/cost-profit/summary
pub async fn cost_profit_summary(
    _current: CurrentUser,
    Json(data): Json<NewMarketData>,
) -> Result<Json<CostProfitSummary>, AppError> {
    data.validate()?;
    Ok(Json(CostProfitSummary::from_figures(
        data.market_price,
        data.harvest_amount,
        data.total_cost,
        data.total_revenue,
        data.net_profit,
    )))
}

/// # POST /api/market-data
pub async fn submit_market_data(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(data): Json<NewMarketData>,
) -> Result<impl IntoResponse, AppError> {
    data.validate()?;
    let id = state.repo.append_market_data(&data, Some(current.user.id)).await?;
    tracing::info!(user_id = current.user.id, record_id = id, "Market data submitted.");

    Ok((
        StatusCode::CREATED,
        Json(SubmissionView { id, message: "Data successfully added to analysis" }),
    ))
}

/// # DELETE /api/market-data
pub async fn clear_market_data(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Json<ClearedView>, AppError> {
    let deleted = state.repo.clear_market_data_for_user(current.user.id).await?;
    tracing::info!(user_id = current.user.id, deleted, "User market data cleared.");

    Ok(Json(ClearedView {
        deleted,
        message: "All your data has been cleared successfully!",
    }))
}

/// # GET /api/analytics
///
/// Summary and history cover the caller's own submissions; the forecast is
/// fitted over every submission in the store.
pub async fn get_analytics(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Json<AnalyticsView>, AppError> {
    let own = state.repo.list_market_data_for_user(current.user.id).await?;
    let all = state.repo.list_market_data().await?;

    let predictions = match state.engine.fit_and_predict(&all, state.config.prediction.horizon) {
        Ok(report) => PredictionView::Ready {
            chart: ChartPayload::from_report(&report, Utc::now().date_naive()),
        },
        Err(PredictionError::InsufficientData { required, actual }) => {
            tracing::debug!(required, actual, "Not enough records for a forecast.");
            PredictionView::InsufficientData { message: INSUFFICIENT_DATA_MESSAGE }
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Json(AnalyticsView {
        summary: summarize(&own),
        history: recent_history(&own, HISTORY_LIMIT),
        predictions,
    }))
}

fn validate_new_password(password: &str, confirmation: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(
            "Password must be at least 6 characters long.".to_string(),
        ));
    }
    if password != confirmation {
        return Err(AppError::Validation("Passwords must match.".to_string()));
    }
    Ok(())
}

/// Syntax only: one `@`, a non-empty local part, a dotted domain and no whitespace.
/// These are the same rules the signup form's email field has always applied.
fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.chars().count() > MAX_FIELD_LEN || email.contains(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|part| !part.is_empty())
        }
        None => false,
    }
}
