use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::AuthUser,
    error::{AppError, ServiceError},
    state::AppState,
    users::{
        dto::{
            CreateUserRequest, CreatedUserResponse, MessageResponse, UpdateUserRequest,
            UserListResponse, UserResponse,
        },
        repo_types::UserView,
        services::UserService,
    },
    validation::{IdPath, ValidJson},
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(users))]
pub async fn list_users(
    State(users): State<UserService>,
) -> Result<Json<UserListResponse>, AppError> {
    let data = users.find_all().await.map_err(AppError::internal)?;
    Ok(Json(UserListResponse {
        success: true,
        data,
    }))
}

#[instrument(skip(users))]
pub async fn get_user(
    State(users): State<UserService>,
    IdPath(id): IdPath,
) -> Result<Json<UserResponse<UserView>>, AppError> {
    let user = users.find_by_id(id).await.map_err(|e| match e {
        ServiceError::UserNotFound => AppError::BadRequest("User not found."),
        other => AppError::internal(other),
    })?;
    Ok(Json(UserResponse {
        success: true,
        message: None,
        user,
    }))
}

#[instrument(skip(users, payload))]
pub async fn create_user(
    State(users): State<UserService>,
    ValidJson(payload): ValidJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreatedUserResponse>), AppError> {
    let user = users.create(payload).await.map_err(|e| match e {
        ServiceError::UserAlreadyExists => AppError::Conflict("Login already in use."),
        other => AppError::internal(other),
    })?;
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            success: true,
            message: Some("User successfully created."),
            user,
        }),
    ))
}

#[instrument(skip(users, payload))]
pub async fn update_user(
    State(users): State<UserService>,
    IdPath(id): IdPath,
    ValidJson(payload): ValidJson<UpdateUserRequest>,
) -> Result<Json<UserResponse<UserView>>, AppError> {
    let user = users.update(id, payload).await.map_err(|e| match e {
        ServiceError::UserNotFound => AppError::NotFound("User not found."),
        ServiceError::LoginAlreadyTaken => AppError::Conflict("Login already in use."),
        other => AppError::internal(other),
    })?;
    Ok(Json(UserResponse {
        success: true,
        message: Some("User successfully updated."),
        user,
    }))
}

/// Gated: the bearer token is checked before the id or the store.
#[instrument(skip(users))]
pub async fn delete_user(
    caller: AuthUser,
    State(users): State<UserService>,
    IdPath(id): IdPath,
) -> Result<Json<MessageResponse>, AppError> {
    users.delete(id).await.map_err(|e| match e {
        ServiceError::UserNotFound => AppError::NotFound("User not found."),
        ServiceError::UserHasPokemon => {
            AppError::NotFound("User can't be deleted because they have registered pokemon.")
        }
        other => AppError::internal(other),
    })?;
    info!(user_id = %id, by = %caller.login, "user removed");
    Ok(Json(MessageResponse {
        success: true,
        message: "User successfully deleted.",
    }))
}
