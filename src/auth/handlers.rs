use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse},
        jwt::JwtKeys,
        services::AuthService,
    },
    error::{AppError, ServiceError},
    state::AppState,
    validation::ValidJson,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

#[instrument(skip(auth, keys, payload))]
pub async fn login(
    State(auth): State<AuthService>,
    State(keys): State<JwtKeys>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = auth
        .login(&payload.login, &payload.password)
        .await
        .map_err(|e| match e {
            ServiceError::InvalidCredentials => {
                AppError::Unauthorized("Login or password incorrect.")
            }
            other => AppError::internal(other),
        })?;

    let token = keys.sign(user.id, &user.login).map_err(AppError::internal)?;

    info!(user_id = %user.id, login = %user.login, "user logged in");
    Ok(Json(LoginResponse {
        success: true,
        message: "Successfully logged in.",
        token,
        user,
    }))
}
