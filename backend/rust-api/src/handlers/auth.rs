use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::sync::Arc;
use validator::Validate;

use crate::{
    middlewares::auth::{JwtClaims, JwtService},
    models::{
        refresh_token::RefreshTokenResponse,
        user::{AuthResponseCookie, LoginRequest, RegisterRequest, UserProfile},
    },
    services::{auth_service::AuthService, AppState},
};

const REFRESH_COOKIE: &str = "refresh_token";
const REFRESH_COOKIE_PATH: &str = "/api/v1/auth";

fn refresh_cookie(state: &AppState, value: String, max_age: time::Duration) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, value))
        .path(REFRESH_COOKIE_PATH)
        .http_only(true)
        .secure(state.config.cookie_secure)
        .same_site(axum_extra::extract::cookie::SameSite::Lax)
        .max_age(max_age)
        .build()
}

/// POST /api/v1/auth/register - Register a new user
pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if let Err(e) = req.validate() {
        return Err((StatusCode::BAD_REQUEST, format!("Validation error: {}", e)));
    }

    tracing::info!("Registering new user: {}", req.username);

    let jwt_service = JwtService::new(&state.config.jwt_secret);
    let service = AuthService::new(state.mongo.clone(), jwt_service);

    match service.register(req).await {
        Ok(response) => {
            tracing::info!("User registered successfully");

            let cookie = refresh_cookie(
                &state,
                response.refresh_token.clone(),
                time::Duration::days(30),
            );
            let jar = jar.add(cookie);

            let response_body = AuthResponseCookie {
                access_token: response.access_token,
                user: response.user,
            };

            Ok((StatusCode::CREATED, jar, Json(response_body)))
        }
        Err(e) => {
            tracing::error!("Failed to register user: {}", e);
            Err((StatusCode::BAD_REQUEST, e.to_string()))
        }
    }
}

/// POST /api/v1/auth/login - Login with username and password
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if let Err(e) = req.validate() {
        return Err((StatusCode::BAD_REQUEST, format!("Validation error: {}", e)));
    }

    tracing::info!("Login attempt for user: {}", req.username);

    let jwt_service = JwtService::new(&state.config.jwt_secret);
    let service = AuthService::new(state.mongo.clone(), jwt_service);

    match service.login(req).await {
        Ok(response) => {
            tracing::info!("User logged in successfully");

            let cookie = refresh_cookie(
                &state,
                response.refresh_token.clone(),
                time::Duration::days(30),
            );
            let jar = jar.add(cookie);

            let response_body = AuthResponseCookie {
                access_token: response.access_token,
                user: response.user,
            };

            Ok((StatusCode::OK, jar, Json(response_body)))
        }
        Err(e) => {
            tracing::warn!("Failed login: {}", e);
            Err((StatusCode::UNAUTHORIZED, e.to_string()))
        }
    }
}

/// POST /api/v1/auth/refresh - Refresh access token
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    tracing::debug!("Refreshing access token");

    let refresh_token = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                "Missing refresh token cookie".to_string(),
            )
        })?;

    let jwt_service = JwtService::new(&state.config.jwt_secret);
    let service = AuthService::new(state.mongo.clone(), jwt_service);

    match service.refresh_token(&refresh_token).await {
        Ok(access_token) => {
            tracing::debug!("Access token refreshed successfully");
            Ok((StatusCode::OK, Json(RefreshTokenResponse { access_token })))
        }
        Err(e) => {
            tracing::warn!("Failed to refresh token: {}", e);
            Err((StatusCode::UNAUTHORIZED, e.to_string()))
        }
    }
}

/// POST /api/v1/auth/logout - Logout (revoke refresh token)
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    tracing::info!("Logging out user");

    let refresh_token = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                "Missing refresh token cookie".to_string(),
            )
        })?;

    let jwt_service = JwtService::new(&state.config.jwt_secret);
    let service = AuthService::new(state.mongo.clone(), jwt_service);

    match service.logout(&refresh_token).await {
        Ok(()) => {
            tracing::info!("User logged out successfully");

            let cookie = refresh_cookie(&state, String::new(), time::Duration::ZERO);
            let jar = jar.add(cookie);

            Ok((StatusCode::NO_CONTENT, jar))
        }
        Err(e) => {
            tracing::error!("Failed to logout: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// GET /api/v1/auth/me - Get current user profile (protected)
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    tracing::debug!("Getting current user profile for user_id: {}", claims.sub);

    let jwt_service = JwtService::new(&state.config.jwt_secret);
    let service = AuthService::new(state.mongo.clone(), jwt_service);

    match service.get_user_by_id(&claims.sub).await {
        Ok(user) => {
            let profile = UserProfile::from(user);
            Ok((StatusCode::OK, Json(profile)))
        }
        Err(e) => {
            tracing::error!("Failed to get user: {}", e);
            Err((StatusCode::NOT_FOUND, e.to_string()))
        }
    }
}
