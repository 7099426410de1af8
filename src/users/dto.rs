use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::{
    users::repo_types::{CreatedUser, UserView},
    validation::not_blank,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(
        length(min = 1, message = "login is required"),
        custom(function = "not_blank")
    )]
    pub login: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[validate(schema(function = "require_user_changes"))]
pub struct UpdateUserRequest {
    #[validate(
        length(min = 1, message = "login must not be empty"),
        custom(function = "not_blank")
    )]
    pub login: Option<String>,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: Option<String>,
}

fn require_user_changes(req: &UpdateUserRequest) -> Result<(), ValidationError> {
    if req.login.is_none() && req.password.is_none() {
        let mut err = ValidationError::new("no_fields");
        err.message = Some("at least one of login or password is required".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub success: bool,
    pub data: Vec<UserView>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse<U> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub user: U,
}

pub type CreatedUserResponse = UserResponse<CreatedUser>;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}
