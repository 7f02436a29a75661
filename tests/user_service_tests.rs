use resume_matcher::{
    repositories::user_repository::SqliteUserRepository,
    services::user_service::{CreateUserRequest, UserService, UserServiceError},
    test_utils::test_helpers,
};
use std::sync::Arc;

fn request(email: &str, password: &str) -> CreateUserRequest {
    CreateUserRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn test_create_user_success() {
    // Create isolated test database
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = Arc::new(SqliteUserRepository::new(pool));
    let service = UserService::new(repository);

    let user = service
        .create_user(request("test@example.com", "password123"))
        .await
        .unwrap();

    assert_eq!(user.email, "test@example.com");
    assert_ne!(user.password_hash, "password123");
    assert!(user.password_hash.starts_with("$argon2"));
}

#[tokio::test]
async fn test_create_user_duplicate_email() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = Arc::new(SqliteUserRepository::new(pool));
    let service = UserService::new(repository);

    service
        .create_user(request("duplicate@example.com", "password123"))
        .await
        .unwrap();

    let result = service
        .create_user(request("duplicate@example.com", "password456"))
        .await;
    assert!(matches!(result, Err(UserServiceError::EmailTaken)));
}

#[tokio::test]
async fn test_create_user_validation() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = Arc::new(SqliteUserRepository::new(pool));
    let service = UserService::new(repository);

    let bad_email = service.create_user(request("not-an-email", "password123")).await;
    assert!(matches!(bad_email, Err(UserServiceError::InvalidEmail)));

    let weak = service.create_user(request("weak@example.com", "short")).await;
    assert!(matches!(weak, Err(UserServiceError::WeakPassword)));
}

#[tokio::test]
async fn test_find_list_and_delete() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = Arc::new(SqliteUserRepository::new(pool));
    let service = UserService::new(repository);

    let first = service
        .create_user(request("first@example.com", "password123"))
        .await
        .unwrap();
    service
        .create_user(request("second@example.com", "password123"))
        .await
        .unwrap();

    let found = service
        .find_user_by_email("first@example.com")
        .await
        .unwrap()
        .expect("user to exist");
    assert_eq!(found.id, first.id);
    assert!(found.created_at.is_some());

    let users = service.list_users(Some(10), Some(0)).await.unwrap();
    assert_eq!(users.len(), 2);

    service.delete_user(first.id).await.unwrap();
    assert!(service.find_user_by_id(first.id).await.unwrap().is_none());

    let again = service.delete_user(first.id).await;
    assert!(matches!(again, Err(UserServiceError::UserNotFound)));
}

#[tokio::test]
async fn test_verify_password_against_stored_hash() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = Arc::new(SqliteUserRepository::new(pool));
    let service = UserService::new(repository);

    let user = service
        .create_user(request("verify@example.com", "password123"))
        .await
        .unwrap();

    assert!(service.verify_password("password123", &user.password_hash));
    assert!(!service.verify_password("password124", &user.password_hash));
}
