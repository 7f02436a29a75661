use crate::models::user::User;
use crate::repositories::user_repository::{RepositoryError, UserRepository};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString},
    Argon2, PasswordVerifier,
};
use std::sync::Arc;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Password too weak (minimum {MIN_PASSWORD_LEN} characters)")]
    WeakPassword,
    #[error("User not found")]
    UserNotFound,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Password hashing failed: {0}")]
    HashingError(String),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
}

pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User, UserServiceError> {
        let email = request.email.trim();
        validate_email(email)?;
        validate_password(&request.password)?;

        let password_hash = hash_password(&request.password)?;

        match self.repository.create_user(email, &password_hash).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, "Registered user");
                Ok(user)
            }
            Err(RepositoryError::AlreadyExists) => Err(UserServiceError::EmailTaken),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, UserServiceError> {
        Ok(self.repository.find_by_email(email.trim()).await?)
    }

    pub async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        Ok(self.repository.find_by_id(id).await?)
    }

    pub async fn list_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<User>, UserServiceError> {
        Ok(self.repository.list_users(limit, offset).await?)
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), UserServiceError> {
        match self.repository.delete_user(id).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    pub fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        verify_password(password, password_hash)
    }
}

fn validate_email(email: &str) -> Result<(), UserServiceError> {
    if email.is_empty() || !email.contains('@') || email.len() > 255 {
        return Err(UserServiceError::InvalidEmail);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), UserServiceError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(UserServiceError::WeakPassword);
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, UserServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserServiceError::HashingError(e.to_string()))
}

/// Checks `password` against an argon2 PHC string. Malformed hashes never verify.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed_hash) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok(),
        Err(_) => false,
    }
}
