use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::dto::api_response::ApiResponse;
use crate::dto::auth_dto::{LoginRequest, LoginResponse, RegisterRequest};
use crate::models::user::{Role, UserResponse};
use crate::repositories::user_repository::{NewProfile, NewUser, UserRepository};
use crate::services::jwt_service::JwtService;
use crate::services::password::{hash_password, verify_password};
use crate::state::AppState;
use crate::utils::errors::AppError;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub struct AuthController {
    repository: UserRepository,
    jwt: Arc<JwtService>,
}

impl AuthController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repository: UserRepository::new(state.pool.clone()),
            jwt: state.jwt.clone(),
        }
    }

    /// Alta pública: siempre crea un CUSTOMER
    pub async fn register(&self, request: RegisterRequest) -> Result<ApiResponse<UserResponse>, AppError> {
        request.validate()?;

        let user = self
            .repository
            .create(
                NewUser {
                    email: request.email.trim().to_string(),
                    password_hash: hash_password(&request.password)?,
                    full_name: request.full_name.trim().to_string(),
                    phone: request.phone,
                    role: Role::Customer,
                },
                NewProfile::Customer {
                    company_name: request.company_name,
                    address: request.address,
                    tax_number: request.tax_number,
                },
            )
            .await?;

        info!("👤 Cliente registrado: {}", user.email);
        let profile = self.repository.find_profile(&user).await?;
        Ok(ApiResponse::success_with_message(
            UserResponse::from(user).with_profile(profile),
            "Account created successfully",
        ))
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        request.validate()?;

        let user = match self.repository.find_by_email(request.email.trim()).await? {
            Some(user) => user,
            None => {
                warn!("🔐 Login fallido (email desconocido): {}", request.email);
                return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
        };

        if !verify_password(&request.password, &user.password_hash)? || !user.is_active {
            warn!("🔐 Login fallido para {}", user.email);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let (token, expires_at) = self.jwt.generate_access_token(user.id, &user.email, user.role)?;
        info!("🔓 Login correcto: {} ({})", user.email, user.role.as_str());

        let profile = self.repository.find_profile(&user).await?;
        Ok(LoginResponse::bearer(
            token,
            expires_at,
            UserResponse::from(user).with_profile(profile),
        ))
    }

    pub async fn me(&self, user_id: Uuid) -> Result<UserResponse, AppError> {
        let user = self
            .repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let profile = self.repository.find_profile(&user).await?;
        Ok(UserResponse::from(user).with_profile(profile))
    }
}
