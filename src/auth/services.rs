use std::sync::Arc;

use axum::extract::FromRef;
use tracing::warn;

use crate::{
    auth::{dto::LoggedInUser, password},
    error::{ServiceError, ServiceResult},
    state::AppState,
    users::repo::UserRepo,
};

/// Credential check. Keeps no session state.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepo>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepo>) -> Self {
        Self { users }
    }

    pub async fn login(&self, login: &str, plain_password: &str) -> ServiceResult<LoggedInUser> {
        let Some(user) = self.users.find_by_login(login).await? else {
            password::verify_dummy(plain_password);
            warn!(login = %login, "login with unknown user");
            return Err(ServiceError::InvalidCredentials);
        };

        if !password::verify_password(plain_password, &user.password_hash)? {
            warn!(user_id = %user.id, "login with wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        Ok(LoggedInUser {
            id: user.id,
            name: user.login.clone(),
            login: user.login,
        })
    }
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
