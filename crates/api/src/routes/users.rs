//! User routes: sign up, sign in, profile lookup.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use validator::Validate;

use crate::AppState;
use crate::error::{
    ApiJson, ApiResult, bad_request, database_error, not_found, validation_error,
};
use folio_core::auth::{hash_password, verify_password};
use folio_db::{UserRepository, entities::users, repositories::UserError};
use folio_shared::AppError;

/// Creates the user router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/signup", post(signup))
        .route("/users/signin", post(signin))
        .route("/users/{id}", get(get_user))
}

/// Sign up request body.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    /// Display name.
    #[validate(length(min = 1, max = 150, message = "Name must be 1-150 characters"))]
    pub name: String,
    /// Login email.
    #[validate(email(message = "Email is invalid"))]
    pub email: String,
    /// Plaintext password.
    #[serde(alias = "passwordHash")]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Sign in request body.
#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    /// Login email.
    pub email: String,
    /// Plaintext password.
    #[serde(alias = "passwordHash")]
    pub password: String,
}

/// Public view of a user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// User ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Email.
    pub email: String,
    /// Created at.
    pub created_at: DateTime<FixedOffset>,
    /// Last update.
    pub updated_at: DateTime<FixedOffset>,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Token plus the user it was issued for.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Bearer token.
    pub token: String,
    /// The user.
    pub user: UserResponse,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// POST /users/signup
async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignupRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate().map_err(|e| validation_error(&e))?;

    let repo = UserRepository::new(state.db.clone());
    let email = normalize_email(&payload.email);

    if repo.email_exists(&email).await.map_err(|e| database_error(&e))? {
        return Err(AppError::Conflict("Email already registered".into()).into());
    }

    let password_hash =
        hash_password(&payload.password).map_err(|e| AppError::Internal(e.to_string()))?;

    let user = repo
        .create(payload.name.trim(), &email, &password_hash)
        .await
        .map_err(|e| match e {
            UserError::EmailTaken(_) => AppError::Conflict("Email already registered".into()),
            UserError::Database(e) => AppError::Database(e.to_string()),
        })?;

    let token = state
        .jwt_service
        .generate_token(user.id, &user.email)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    info!(user_id = user.id, "user signed up");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// POST /users/signin
async fn signin(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SigninRequest>,
) -> impl IntoResponse {
    let invalid = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "invalid_credentials",
                "message": "Invalid email or password"
            })),
        )
            .into_response()
    };
    let internal = || {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "internal_error",
                "message": "An error occurred during sign in"
            })),
        )
            .into_response()
    };

    let repo = UserRepository::new(state.db.clone());
    let user = match repo.find_by_email(&normalize_email(&payload.email)).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            info!(email = %payload.email, "sign in for unknown email");
            return invalid();
        }
        Err(e) => {
            error!(error = %e, "database error during sign in");
            return internal();
        }
    };

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            info!(user_id = user.id, "sign in with wrong password");
            return invalid();
        }
        Err(e) => {
            error!(error = %e, "password verification error");
            return internal();
        }
    }

    let token = match state.jwt_service.generate_token(user.id, &user.email) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "failed to issue token");
            return internal();
        }
    };

    (
        StatusCode::OK,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    )
        .into_response()
}

/// GET /users/{id}
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    let id: i64 = id.parse().map_err(|_| bad_request("Invalid user id"))?;

    let user = UserRepository::new(state.db.clone())
        .find_by_id(id)
        .await
        .map_err(|e| database_error(&e))?
        .ok_or_else(|| not_found("User not found"))?;

    Ok(Json(user.into()))
}
