pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use extractors::AuthenticatedUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenService};

/// Payload of a login request.
///
/// Deliberately unvalidated beyond presence: a malformed email is just an unknown one.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Payload of a registration request: the inbound fields of a user.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Must be a valid email format.
    #[validate(email)]
    pub email: String,
    /// Plaintext; hashed before it is stored. At least 6 characters.
    #[validate(length(min = 6))]
    pub password: String,
    /// Optional display name, at most 100 characters.
    #[validate(length(max = 100))]
    pub name: Option<String>,
}

/// Successful login response.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub email: String,
    /// Bearer token for the `Authorization` header.
    pub token: String,
    pub is_admin: bool,
}
