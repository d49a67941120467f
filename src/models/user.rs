//! Modelo de User
//!
//! Usuarios del sistema y sus perfiles por rol. Mapea a la tabla `users`
//! y a las tablas `*_profiles` (relación uno a uno).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Rol del usuario - mapea al ENUM user_role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Driver,
    Customer,
    Accountant,
    CustomsBroker,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Driver => "DRIVER",
            Role::Customer => "CUSTOMER",
            Role::Accountant => "ACCOUNTANT",
            Role::CustomsBroker => "CUSTOMS_BROKER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ADMIN" => Some(Role::Admin),
            "DRIVER" => Some(Role::Driver),
            "CUSTOMER" => Some(Role::Customer),
            "ACCOUNTANT" => Some(Role::Accountant),
            "CUSTOMS_BROKER" => Some(Role::CustomsBroker),
            _ => None,
        }
    }
}

/// User principal - mapea exactamente a la tabla users
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub phone: Option<String>,
    pub full_name: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DriverProfile {
    pub user_id: Uuid,
    pub license_number: String,
    pub license_expiry: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub is_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CustomerProfile {
    pub user_id: Uuid,
    pub company_name: Option<String>,
    pub address: Option<String>,
    pub tax_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccountantProfile {
    pub user_id: Uuid,
    pub employee_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CustomsBrokerProfile {
    pub user_id: Uuid,
    pub license_number: String,
    pub company_name: Option<String>,
}

/// Conductor libre para asignación
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AvailableDriver {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub license_number: String,
    pub license_expiry: Option<NaiveDate>,
}

/// Perfil específico del rol
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Profile {
    Admin,
    Driver(DriverProfile),
    Customer(CustomerProfile),
    Accountant(AccountantProfile),
    CustomsBroker(CustomsBrokerProfile),
}

/// Response de usuario para la API (sin password)
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub phone: Option<String>,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            phone: user.phone,
            full_name: user.full_name,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
            profile: None,
        }
    }
}

impl UserResponse {
    pub fn with_profile(mut self, profile: Option<Profile>) -> Self {
        self.profile = profile;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_names() {
        for role in [Role::Admin, Role::Driver, Role::Customer, Role::Accountant, Role::CustomsBroker] {
            assert_eq!(Role::from_str(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_str("admin"), None);
    }

    #[test]
    fn test_role_serde_name() {
        assert_eq!(serde_json::to_string(&Role::CustomsBroker).unwrap(), "\"CUSTOMS_BROKER\"");
    }
}
