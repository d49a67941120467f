use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::UserResponse;
use crate::utils::validation::PHONE_RE;

/// Registro público de clientes
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(min = 2, max = 200))]
    pub full_name: String,

    #[validate(regex(path = "PHONE_RE", message = "Invalid phone number"))]
    pub phone: Option<String>,

    #[validate(length(max = 200))]
    pub company_name: Option<String>,

    pub address: Option<String>,

    #[validate(length(max = 64))]
    pub tax_number: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

impl LoginResponse {
    pub fn bearer(token: String, expires_at: DateTime<Utc>, user: UserResponse) -> Self {
        Self {
            token,
            token_type: "Bearer",
            expires_at,
            user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_validation() {
        let mut request = RegisterRequest {
            email: "sara@example.com".to_string(),
            password: "supersecret".to_string(),
            full_name: "Sara".to_string(),
            phone: Some("+966501234567".to_string()),
            company_name: None,
            address: None,
            tax_number: None,
        };
        assert!(request.validate().is_ok());

        request.password = "short".to_string();
        request.email = "not-an-email".to_string();
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("email"));
    }

    #[test]
    fn test_login_requires_password() {
        let request = LoginRequest {
            email: "a@b.com".to_string(),
            password: String::new(),
        };
        assert!(request.validate().is_err());
    }
}
