//! Middleware de autenticación JWT y control de roles
//!
//! Cada grupo de rutas declara los roles admitidos. Sin token, con token
//! inválido o con un rol fuera del grupo se responde 401 antes de tocar la
//! base de datos; después se comprueba que el usuario siga existiendo y
//! activo.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;
use uuid::Uuid;

use crate::models::user::Role;
use crate::repositories::user_repository::UserRepository;
use crate::services::jwt_service::JwtService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub const ANY_ROLE: &[Role] = &[
    Role::Admin,
    Role::Driver,
    Role::Customer,
    Role::Accountant,
    Role::CustomsBroker,
];
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];
pub const CUSTOMER_ONLY: &[Role] = &[Role::Customer];
pub const DRIVER_ONLY: &[Role] = &[Role::Driver];
pub const ACCOUNTING: &[Role] = &[Role::Admin, Role::Accountant];
pub const CUSTOMS: &[Role] = &[Role::Admin, Role::CustomsBroker];

/// Usuario autenticado que se inyecta en las requests
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Extrae el token de `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Guardia de roles para `middleware::from_fn_with_state((state, roles), require_roles)`
pub async fn require_roles(
    State((state, allowed)): State<(AppState, &'static [Role])>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| AppError::Unauthorized("Authorization token required".to_string()))?;

    let claims = state.jwt.validate_token(token)?;
    if !allowed.contains(&claims.role) {
        warn!("🚫 Rol {} sin acceso a {}", claims.role.as_str(), request.uri().path());
        return Err(AppError::Unauthorized(
            "Your role does not grant access to this resource".to_string(),
        ));
    }

    let user_id = JwtService::user_id(&claims)?;
    let user = UserRepository::new(state.pool.clone())
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    if !user.is_active {
        return Err(AppError::Unauthorized("Account is inactive".to_string()));
    }
    if user.role != claims.role {
        return Err(AppError::Unauthorized("Role changed, please sign in again".to_string()));
    }

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: user.id,
        email: user.email,
        role: user.role,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_role_groups() {
        assert!(ACCOUNTING.contains(&Role::Admin));
        assert!(!ACCOUNTING.contains(&Role::Customer));
        assert!(CUSTOMS.contains(&Role::CustomsBroker));
        assert_eq!(ANY_ROLE.len(), 5);
    }
}
