use crate::models::user::User;
use crate::repositories::user_repository::{RepositoryError, UserRepository};
use crate::services::user_service::verify_password;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("User not found")]
    UserNotFound,
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub struct AuthService {
    user_repository: Arc<dyn UserRepository>,
}

impl AuthService {
    pub fn new(user_repository: Arc<dyn UserRepository>) -> Self {
        Self { user_repository }
    }

    pub async fn authenticate(&self, request: LoginRequest) -> Result<User, AuthServiceError> {
        let user = self
            .user_repository
            .find_by_email(request.email.trim())
            .await?
            .ok_or(AuthServiceError::InvalidCredentials)?;

        if !verify_password(&request.password, &user.password_hash) {
            tracing::debug!(user_id = user.id, "Password mismatch");
            return Err(AuthServiceError::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn get_user_by_id(&self, user_id: i64) -> Result<User, AuthServiceError> {
        self.user_repository
            .find_by_id(user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::user_repository::MockUserRepository;
    use argon2::{
        password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
        Argon2,
    };
    use mockall::predicate::*;

    fn stored_user(password: &str) -> User {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .expect("hashing should succeed")
            .to_string();
        User {
            id: 3,
            email: "test@example.com".to_string(),
            password_hash,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_authenticate_invalid_email() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_find_by_email()
            .with(eq("test@example.com"))
            .times(1)
            .returning(|_| Box::pin(async move { Ok(None) }));

        let service = AuthService::new(Arc::new(mock_repo));

        let request = LoginRequest {
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };

        let result = service.authenticate(request).await;
        assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let mut mock_repo = MockUserRepository::new();
        let user = stored_user("password123");

        mock_repo.expect_find_by_email().times(1).returning(move |_| {
            let user = user.clone();
            Box::pin(async move { Ok(Some(user)) })
        });

        let service = AuthService::new(Arc::new(mock_repo));
        let request = LoginRequest {
            email: "test@example.com".to_string(),
            password: "wrong-password".to_string(),
        };

        let result = service.authenticate(request).await;
        assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let mut mock_repo = MockUserRepository::new();
        let user = stored_user("password123");

        mock_repo
            .expect_find_by_email()
            .with(eq("test@example.com"))
            .times(1)
            .returning(move |_| {
                let user = user.clone();
                Box::pin(async move { Ok(Some(user)) })
            });

        let service = AuthService::new(Arc::new(mock_repo));
        let request = LoginRequest {
            email: " test@example.com".to_string(),
            password: "password123".to_string(),
        };

        let user = service.authenticate(request).await.expect("should log in");
        assert_eq!(user.id, 3);
    }

    #[tokio::test]
    async fn test_get_user_by_id_not_found() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_find_by_id()
            .with(eq(1))
            .times(1)
            .returning(|_| Box::pin(async move { Ok(None) }));

        let service = AuthService::new(Arc::new(mock_repo));

        let result = service.get_user_by_id(1).await;
        assert!(matches!(result, Err(AuthServiceError::UserNotFound)));
    }
}
