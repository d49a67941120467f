//! Importación de tarifas desde CSV
//!
//! Cabecera obligatoria con las columnas `from_city`, `to_city`, `vehicle`
//! y `price` (sin importar mayúsculas ni orden). Cada fila válida se
//! devuelve con su número de línea; las inválidas se reportan sin abortar
//! el resto del archivo. Los precios admiten como mucho dos decimales.

use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

use crate::utils::csv;
use crate::utils::validation::has_money_scale;

const REQUIRED_COLUMNS: [&str; 4] = ["from_city", "to_city", "vehicle", "price"];

#[derive(Debug, Clone, PartialEq)]
pub struct PricingImportRow {
    pub line: usize,
    pub from_city: String,
    pub to_city: String,
    pub vehicle: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    pub line: usize,
    pub reason: String,
}

impl RowError {
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        Self { line, reason: reason.into() }
    }
}

#[derive(Debug, Default)]
pub struct ParsedImport {
    pub rows: Vec<PricingImportRow>,
    pub errors: Vec<RowError>,
}

/// Errores que invalidan el archivo completo
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ImportError {
    #[error("the file is empty")]
    Empty,
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
}

pub fn parse(content: &str) -> Result<ParsedImport, ImportError> {
    let content = content.trim_start_matches('\u{feff}');
    let mut records = csv::parse_records(content).into_iter().filter(|r| !r.is_blank());

    let header_record = records.next().ok_or(ImportError::Empty)?;
    let header: Vec<String> = header_record
        .fields
        .into_iter()
        .map(|h| h.to_ascii_lowercase())
        .collect();

    let mut indexes = [0usize; 4];
    for (slot, column) in indexes.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = header
            .iter()
            .position(|h| h == column)
            .ok_or(ImportError::MissingColumn(column))?;
    }
    let [from_idx, to_idx, vehicle_idx, price_idx] = indexes;

    let mut parsed = ParsedImport::default();
    for record in records {
        let line_number = record.line;
        let fields = record.fields;
        let field = |i: usize| fields.get(i).map(String::as_str).unwrap_or("").trim();

        let (from_city, to_city, vehicle, price) =
            (field(from_idx), field(to_idx), field(vehicle_idx), field(price_idx));

        if from_city.is_empty() || to_city.is_empty() || vehicle.is_empty() {
            parsed.errors.push(RowError::new(line_number, "from_city, to_city and vehicle are required"));
            continue;
        }
        if from_city.eq_ignore_ascii_case(to_city) {
            parsed.errors.push(RowError::new(line_number, "origin and destination must differ"));
            continue;
        }
        let price = match Decimal::from_str(price) {
            Ok(p) if p > Decimal::ZERO && has_money_scale(&p) => p,
            _ => {
                parsed.errors.push(RowError::new(line_number, format!("invalid price '{}'", price)));
                continue;
            }
        };

        parsed.rows.push(PricingImportRow {
            line: line_number,
            from_city: from_city.to_string(),
            to_city: to_city.to_string(),
            vehicle: vehicle.to_string(),
            price,
        });
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_file() {
        let parsed = parse("from_city,to_city,vehicle,price\nRiyadh,Jeddah,ABC-123,1500\nDammam,Riyadh,Reefer,950.50\n").unwrap();
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[1].line, 3);
        assert_eq!(parsed.rows[1].price, Decimal::from_str("950.50").unwrap());
    }

    #[test]
    fn test_header_case_and_order_free() {
        let parsed = parse("Price,Vehicle,TO_CITY,From_City\r\n1200,XYZ-9,Mecca,Medina\r\n").unwrap();
        assert_eq!(parsed.rows[0].from_city, "Medina");
        assert_eq!(parsed.rows[0].to_city, "Mecca");
        assert_eq!(parsed.rows[0].vehicle, "XYZ-9");
    }

    #[test]
    fn test_row_errors_do_not_abort() {
        let parsed = parse(
            "from_city,to_city,vehicle,price\n\
             Riyadh,Riyadh,ABC,100\n\
             Riyadh,Jeddah,ABC,-5\n\
             ,Jeddah,ABC,10\n\
             \n\
             Riyadh,Jeddah,ABC,abc\n\
             \"Al Khobar, East\",Jeddah,ABC,700\n",
        )
        .unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].from_city, "Al Khobar, East");
        let lines: Vec<usize> = parsed.errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![2, 3, 4, 6]);
    }

    #[test]
    fn test_sub_cent_price_is_a_row_error() {
        let parsed = parse("from_city,to_city,vehicle,price\nRiyadh,Jeddah,ABC,0.001\nRiyadh,Dammam,ABC,12.50\n").unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].line, 3);
        assert_eq!(parsed.errors, vec![RowError::new(2, "invalid price '0.001'")]);
    }

    #[test]
    fn test_quoted_newline_keeps_line_numbers() {
        let parsed = parse("from_city,to_city,vehicle,price\n\"Jeddah\nPort\",Riyadh,ABC,100\nMecca,Riyadh,ABC,-1\n").unwrap();
        assert_eq!(parsed.rows[0].from_city, "Jeddah\nPort");
        assert_eq!(parsed.rows[0].line, 2);
        assert_eq!(parsed.errors[0].line, 4);
    }

    #[test]
    fn test_missing_column_and_empty() {
        assert_eq!(parse("from_city,to_city,price\n").unwrap_err(), ImportError::MissingColumn("vehicle"));
        assert_eq!(parse("\n  \n").unwrap_err(), ImportError::Empty);
    }
}
