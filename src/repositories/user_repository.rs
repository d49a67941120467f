use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::{
    AccountantProfile, AvailableDriver, CustomerProfile, CustomsBrokerProfile, DriverProfile, Profile, Role, User,
};
use crate::utils::errors::{map_unique_violation, AppError};

/// Datos de un usuario nuevo
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
}

/// Perfil a crear junto con el usuario
pub enum NewProfile {
    None,
    Driver {
        license_number: String,
        license_expiry: Option<NaiveDate>,
        nationality: Option<String>,
    },
    Customer {
        company_name: Option<String>,
        address: Option<String>,
        tax_number: Option<String>,
    },
    Accountant {
        employee_number: Option<String>,
    },
    CustomsBroker {
        license_number: String,
        company_name: Option<String>,
    },
}

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn list(&self, role: Option<Role>) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE ($1::user_role IS NULL OR role = $1) ORDER BY created_at DESC",
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// Crea el usuario y su perfil en una misma transacción
    pub async fn create(&self, user: NewUser, profile: NewProfile) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, phone, full_name, password_hash, role)
            VALUES ($1, LOWER($2), $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "A user with this email already exists"))?;

        match profile {
            NewProfile::None => {}
            NewProfile::Driver {
                license_number,
                license_expiry,
                nationality,
            } => {
                sqlx::query(
                    "INSERT INTO driver_profiles (user_id, license_number, license_expiry, nationality) VALUES ($1, $2, $3, $4)",
                )
                .bind(created.id)
                .bind(license_number)
                .bind(license_expiry)
                .bind(nationality)
                .execute(&mut *tx)
                .await?;
            }
            NewProfile::Customer {
                company_name,
                address,
                tax_number,
            } => {
                sqlx::query(
                    "INSERT INTO customer_profiles (user_id, company_name, address, tax_number) VALUES ($1, $2, $3, $4)",
                )
                .bind(created.id)
                .bind(company_name)
                .bind(address)
                .bind(tax_number)
                .execute(&mut *tx)
                .await?;
            }
            NewProfile::Accountant { employee_number } => {
                sqlx::query("INSERT INTO accountant_profiles (user_id, employee_number) VALUES ($1, $2)")
                    .bind(created.id)
                    .bind(employee_number)
                    .execute(&mut *tx)
                    .await?;
            }
            NewProfile::CustomsBroker {
                license_number,
                company_name,
            } => {
                sqlx::query(
                    "INSERT INTO customs_broker_profiles (user_id, license_number, company_name) VALUES ($1, $2, $3)",
                )
                .bind(created.id)
                .bind(license_number)
                .bind(company_name)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(created)
    }

    pub async fn find_profile(&self, user: &User) -> Result<Option<Profile>, AppError> {
        let profile = match user.role {
            Role::Admin => Some(Profile::Admin),
            Role::Driver => sqlx::query_as::<_, DriverProfile>("SELECT * FROM driver_profiles WHERE user_id = $1")
                .bind(user.id)
                .fetch_optional(&self.pool)
                .await?
                .map(Profile::Driver),
            Role::Customer => {
                sqlx::query_as::<_, CustomerProfile>("SELECT * FROM customer_profiles WHERE user_id = $1")
                    .bind(user.id)
                    .fetch_optional(&self.pool)
                    .await?
                    .map(Profile::Customer)
            }
            Role::Accountant => {
                sqlx::query_as::<_, AccountantProfile>("SELECT * FROM accountant_profiles WHERE user_id = $1")
                    .bind(user.id)
                    .fetch_optional(&self.pool)
                    .await?
                    .map(Profile::Accountant)
            }
            Role::CustomsBroker => {
                sqlx::query_as::<_, CustomsBrokerProfile>("SELECT * FROM customs_broker_profiles WHERE user_id = $1")
                    .bind(user.id)
                    .fetch_optional(&self.pool)
                    .await?
                    .map(Profile::CustomsBroker)
            }
        };
        Ok(profile)
    }

    pub async fn set_active(&self, id: Uuid, is_active: bool) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn available_drivers(&self) -> Result<Vec<AvailableDriver>, AppError> {
        let drivers = sqlx::query_as::<_, AvailableDriver>(
            r#"
            SELECT u.id, u.full_name, u.email, u.phone, d.license_number, d.license_expiry
            FROM users u
            JOIN driver_profiles d ON d.user_id = u.id
            WHERE u.role = 'DRIVER' AND u.is_active AND d.is_available
            ORDER BY u.full_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(drivers)
    }

    /// Conductores activos y, de ellos, cuántos están libres
    pub async fn driver_counts(&self) -> Result<(i64, i64), AppError> {
        let counts: (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE d.is_available)
            FROM users u
            JOIN driver_profiles d ON d.user_id = u.id
            WHERE u.role = 'DRIVER' AND u.is_active
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }
}
