//! Generación de números de documento legibles
//!
//! Formato `PREFIJO-AAAAMMDD-XXXXXX`. La unicidad final la garantiza la
//! restricción UNIQUE de la tabla; aquí sólo se reduce la probabilidad de choque.

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;

pub const TRIP_PREFIX: &str = "TRP";
pub const INVOICE_PREFIX: &str = "INV";
pub const CLEARANCE_PREFIX: &str = "CLR";
pub const CUSTOMS_INVOICE_PREFIX: &str = "CIN";

pub fn document_number(prefix: &str, at: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect();
    format!("{}-{}-{}", prefix, at.format("%Y%m%d"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_document_number_format() {
        let at = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();
        let number = document_number(TRIP_PREFIX, at);
        assert!(number.starts_with("TRP-20260309-"));
        let suffix = number.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
