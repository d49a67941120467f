use chrono::NaiveDate;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::models::user::Role;
use crate::utils::validation::PHONE_RE;

/// Alta de usuario por un administrador, con los datos de su perfil
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_profile_fields", skip_on_field_errors = false))]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(min = 2, max = 200))]
    pub full_name: String,

    #[validate(regex(path = "PHONE_RE", message = "Invalid phone number"))]
    pub phone: Option<String>,

    pub role: Role,

    // Conductor y agente de aduanas
    #[validate(length(min = 3, max = 64))]
    pub license_number: Option<String>,
    pub license_expiry: Option<NaiveDate>,
    pub nationality: Option<String>,

    // Cliente y agente de aduanas
    pub company_name: Option<String>,
    pub address: Option<String>,
    pub tax_number: Option<String>,

    // Contable
    pub employee_number: Option<String>,
}

fn validate_profile_fields(request: &CreateUserRequest) -> Result<(), ValidationError> {
    let needs_license = matches!(request.role, Role::Driver | Role::CustomsBroker);
    if needs_license && request.license_number.as_deref().map_or(true, |l| l.trim().is_empty()) {
        let mut error = ValidationError::new("license_required");
        error.message = Some("license_number is required for drivers and customs brokers".into());
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserStatusRequest {
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub role: Option<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(role: Role, license: Option<&str>) -> CreateUserRequest {
        CreateUserRequest {
            email: "driver@profleet.sa".to_string(),
            password: "password123".to_string(),
            full_name: "Omar Driver".to_string(),
            phone: None,
            role,
            license_number: license.map(str::to_string),
            license_expiry: None,
            nationality: None,
            company_name: None,
            address: None,
            tax_number: None,
            employee_number: None,
        }
    }

    #[test]
    fn test_driver_requires_license() {
        assert!(request(Role::Driver, None).validate().is_err());
        assert!(request(Role::Driver, Some("DL-12345")).validate().is_ok());
        assert!(request(Role::CustomsBroker, None).validate().is_err());
    }

    #[test]
    fn test_accountant_needs_no_license() {
        assert!(request(Role::Accountant, None).validate().is_ok());
    }
}
