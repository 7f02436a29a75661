pub mod handlers;
pub mod middleware;

/// Session key holding the logged-in user's id.
pub const SESSION_USER_ID: &str = "user_id";
/// Session key holding the logged-in user's email.
pub const SESSION_EMAIL: &str = "email";
