use rust_decimal::Decimal;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::models::catalog::TemperatureSetting;
use crate::utils::validation::{validate_non_negative_amount, validate_not_blank, PLATE_RE};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCityRequest {
    #[validate(length(min = 2, max = 120), custom = "validate_not_blank")]
    pub name: String,

    #[validate(length(max = 120))]
    pub name_ar: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCityRequest {
    #[validate(length(min = 2, max = 120), custom = "validate_not_blank")]
    pub name: Option<String>,

    #[validate(length(max = 120))]
    pub name_ar: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(regex(path = "PLATE_RE", message = "Invalid plate number"))]
    pub plate_number: String,

    #[validate(length(min = 2, max = 64))]
    pub vehicle_type: String,

    #[validate(custom = "validate_non_negative_amount")]
    pub capacity_kg: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 2, max = 64))]
    pub vehicle_type: Option<String>,

    #[validate(custom = "validate_non_negative_amount")]
    pub capacity_kg: Option<Decimal>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_temperature_range"))]
pub struct CreateTemperatureSettingRequest {
    #[validate(length(min = 1, max = 64))]
    pub label: String,
    pub min_celsius: Decimal,
    pub max_celsius: Decimal,
}

fn validate_temperature_range(request: &CreateTemperatureSettingRequest) -> Result<(), ValidationError> {
    if !TemperatureSetting::is_valid_range(request.min_celsius, request.max_celsius) {
        let mut error = ValidationError::new("temperature_range");
        error.message = Some("min_celsius must not exceed max_celsius".into());
        return Err(error);
    }
    Ok(())
}
