use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::services::pricing_import::RowError;
use crate::utils::validation::validate_positive_amount;

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_distinct_cities"))]
pub struct CreatePricingRequest {
    pub from_city_id: Uuid,
    pub to_city_id: Uuid,
    pub vehicle_id: Uuid,

    #[validate(custom = "validate_positive_amount")]
    pub price: Decimal,
}

fn validate_distinct_cities(request: &CreatePricingRequest) -> Result<(), ValidationError> {
    if request.from_city_id == request.to_city_id {
        let mut error = ValidationError::new("same_city");
        error.message = Some("origin and destination must differ".into());
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePricingRequest {
    #[validate(custom = "validate_positive_amount")]
    pub price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub from_city_id: Uuid,
    pub to_city_id: Uuid,
    pub vehicle_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub from_city_id: Uuid,
    pub to_city_id: Uuid,
    pub vehicle_id: Uuid,
    pub price: Decimal,
}

/// Resultado de una importación CSV
#[derive(Debug, Default, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub updated: usize,
    pub errors: Vec<RowError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_city_rejected() {
        let city = Uuid::new_v4();
        let request = CreatePricingRequest {
            from_city_id: city,
            to_city_id: city,
            vehicle_id: Uuid::new_v4(),
            price: Decimal::from(100),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_price_must_be_positive() {
        let request = UpdatePricingRequest { price: Decimal::ZERO };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_price_limited_to_cents() {
        let request = UpdatePricingRequest { price: Decimal::new(1, 3) };
        assert!(request.validate().is_err());
        let request = UpdatePricingRequest { price: Decimal::new(150050, 2) };
        assert!(request.validate().is_ok());
    }
}
