use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::api_response::ApiResponse;
use crate::dto::user_dto::CreateUserRequest;
use crate::models::user::{AvailableDriver, Role, UserResponse};
use crate::repositories::user_repository::{NewProfile, NewUser, UserRepository};
use crate::services::password::hash_password;
use crate::utils::errors::{not_found_error, validation_error, AppError};

pub struct UserController {
    repository: UserRepository,
}

impl UserController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: UserRepository::new(pool),
        }
    }

    pub async fn list(&self, role: Option<Role>) -> Result<Vec<UserResponse>, AppError> {
        let users = self.repository.list(role).await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn create(&self, request: CreateUserRequest) -> Result<ApiResponse<UserResponse>, AppError> {
        request.validate()?;

        let profile = match request.role {
            Role::Admin => NewProfile::None,
            Role::Driver => NewProfile::Driver {
                license_number: request.license_number.clone().unwrap_or_default(),
                license_expiry: request.license_expiry,
                nationality: request.nationality.clone(),
            },
            Role::Customer => NewProfile::Customer {
                company_name: request.company_name.clone(),
                address: request.address.clone(),
                tax_number: request.tax_number.clone(),
            },
            Role::Accountant => NewProfile::Accountant {
                employee_number: request.employee_number.clone(),
            },
            Role::CustomsBroker => NewProfile::CustomsBroker {
                license_number: request.license_number.clone().unwrap_or_default(),
                company_name: request.company_name.clone(),
            },
        };

        let user = self
            .repository
            .create(
                NewUser {
                    email: request.email.trim().to_string(),
                    password_hash: hash_password(&request.password)?,
                    full_name: request.full_name.trim().to_string(),
                    phone: request.phone,
                    role: request.role,
                },
                profile,
            )
            .await?;

        info!("👤 Usuario {} creado con rol {}", user.email, user.role.as_str());
        let profile = self.repository.find_profile(&user).await?;
        Ok(ApiResponse::success_with_message(
            UserResponse::from(user).with_profile(profile),
            "User created successfully",
        ))
    }

    /// Activa o desactiva una cuenta; un admin no puede desactivarse a sí mismo
    pub async fn set_status(&self, acting_admin: Uuid, id: Uuid, is_active: bool) -> Result<UserResponse, AppError> {
        if acting_admin == id && !is_active {
            return Err(validation_error("is_active", "You cannot deactivate your own account"));
        }

        let user = self
            .repository
            .set_active(id, is_active)
            .await?
            .ok_or_else(|| not_found_error("User", &id.to_string()))?;

        info!("👤 Usuario {} {}", user.email, if is_active { "activado" } else { "desactivado" });
        Ok(UserResponse::from(user))
    }

    pub async fn available_drivers(&self) -> Result<Vec<AvailableDriver>, AppError> {
        self.repository.available_drivers().await
    }
}
