use std::sync::Arc;

use axum::extract::FromRef;
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::password::hash_password,
    error::{ServiceError, ServiceResult},
    state::AppState,
    store::StoreError,
    users::{
        dto::{CreateUserRequest, UpdateUserRequest},
        repo::UserRepo,
        repo_types::{CreatedUser, NewUser, UserChanges, UserView},
    },
};

/// User business rules on top of the user repository.
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepo>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepo>) -> Self {
        Self { repo }
    }

    pub async fn find_all(&self) -> ServiceResult<Vec<UserView>> {
        let users = self.repo.list().await?;
        Ok(users.into_iter().map(UserView::from).collect())
    }

    pub async fn find_by_id(&self, id: Uuid) -> ServiceResult<UserView> {
        self.repo
            .find_by_id(id)
            .await?
            .map(UserView::from)
            .ok_or(ServiceError::UserNotFound)
    }

    /// Signup. The password is hashed before it reaches the store.
    pub async fn create(&self, input: CreateUserRequest) -> ServiceResult<CreatedUser> {
        if self.repo.find_by_login(&input.login).await?.is_some() {
            return Err(ServiceError::UserAlreadyExists);
        }

        let password_hash = hash_password(&input.password)?;
        let user = self
            .repo
            .insert(NewUser {
                id: Uuid::new_v4(),
                login: input.login,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation => ServiceError::UserAlreadyExists,
                other => other.into(),
            })?;

        info!(user_id = %user.id, login = %user.login, "user created");
        Ok(CreatedUser {
            id: user.id,
            login: user.login,
        })
    }

    pub async fn update(&self, id: Uuid, input: UpdateUserRequest) -> ServiceResult<UserView> {
        if self.repo.find_by_id(id).await?.is_none() {
            return Err(ServiceError::UserNotFound);
        }

        if let Some(login) = input.login.as_deref() {
            if let Some(holder) = self.repo.find_by_login(login).await? {
                if holder.id != id {
                    return Err(ServiceError::LoginAlreadyTaken);
                }
            }
        }

        let password_hash = input
            .password
            .as_deref()
            .map(hash_password)
            .transpose()?;

        let changes = UserChanges {
            login: input.login,
            password_hash,
        };
        let user = self
            .repo
            .update(id, changes)
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation => ServiceError::LoginAlreadyTaken,
                other => other.into(),
            })?
            .ok_or(ServiceError::UserNotFound)?;

        info!(user_id = %user.id, "user updated");
        Ok(user.into())
    }

    /// Refused with `UserHasPokemon` while any pokemon names this user as creator.
    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        if self.repo.find_by_id(id).await?.is_none() {
            return Err(ServiceError::UserNotFound);
        }

        let deleted = self.repo.delete(id).await.map_err(|e| match e {
            StoreError::ForeignKeyViolation => ServiceError::UserHasPokemon,
            other => other.into(),
        })?;
        if !deleted {
            return Err(ServiceError::UserNotFound);
        }

        info!(user_id = %id, "user deleted");
        Ok(())
    }
}

impl FromRef<AppState> for UserService {
    fn from_ref(state: &AppState) -> Self {
        state.users.clone()
    }
}
