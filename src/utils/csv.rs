//! Lectura y escritura CSV mínima
//!
//! Cubre lo que necesitan la importación de tarifas y las exportaciones:
//! campos entre comillas (que pueden contener comas y saltos de línea),
//! comillas escapadas (`""`) y finales de línea CRLF.

/// Registro leído de un documento, con la línea donde empieza (1-based)
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub line: usize,
    pub fields: Vec<String>,
}

impl Record {
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|f| f.is_empty())
    }
}

/// Divide un documento completo en registros. Un salto de línea dentro de
/// comillas forma parte del campo.
pub fn parse_records(content: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut start_line = 1;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            '\n' if in_quotes => {
                current.push('\n');
                line += 1;
            }
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {}
            '\n' | '\r' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
                records.push(Record {
                    line: start_line,
                    fields: std::mem::take(&mut fields),
                });
                line += 1;
                start_line = line;
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() || !fields.is_empty() {
        fields.push(current.trim().to_string());
        records.push(Record { line: start_line, fields });
    }
    records
}

/// Escapa un campo para escritura
pub fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Construye un documento CSV a partir de cabecera y filas
pub fn write_document(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = header.iter().map(|h| escape_field(h)).collect::<Vec<_>>().join(",");
    out.push_str("\r\n");
    for row in rows {
        out.push_str(&row.iter().map(|f| escape_field(f)).collect::<Vec<_>>().join(","));
        out.push_str("\r\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(line: &str) -> Vec<String> {
        parse_records(line).remove(0).fields
    }

    #[test]
    fn test_parse_simple_line() {
        assert_eq!(fields("Riyadh,Jeddah,ABC-123,1500"), vec!["Riyadh", "Jeddah", "ABC-123", "1500"]);
    }

    #[test]
    fn test_parse_quoted_fields() {
        let parsed = fields("\"Al Khobar, East\",\"He said \"\"hi\"\"\",x\r\n");
        assert_eq!(parsed, vec!["Al Khobar, East", "He said \"hi\"", "x"]);
    }

    #[test]
    fn test_parse_empty_trailing_field() {
        assert_eq!(fields("a,b,"), vec!["a", "b", ""]);
    }

    #[test]
    fn test_records_keep_quoted_newlines() {
        let records = parse_records("a,b\r\n\"line one\nline two\",x\r\n\r\nlast,y");
        assert_eq!(records.len(), 4);
        assert_eq!(records[1].fields, vec!["line one\nline two", "x"]);
        assert_eq!(records[1].line, 2);
        assert!(records[2].is_blank());
        assert_eq!(records[3].line, 5);
        assert_eq!(records[3].fields, vec!["last", "y"]);
    }

    #[test]
    fn test_written_document_reads_back() {
        let rows = vec![vec!["Dammam\nPort".to_string(), "He said \"hi\", twice".to_string()]];
        let doc = write_document(&["name", "note"], &rows);
        let records = parse_records(&doc);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].fields, rows[0]);
    }

    #[test]
    fn test_write_document_escapes() {
        let doc = write_document(&["name", "note"], &[vec!["Dammam".into(), "a,b".into()]]);
        assert_eq!(doc, "name,note\r\nDammam,\"a,b\"\r\n");
    }
}
