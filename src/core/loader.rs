use crate::domain::model::{RawRow, SourceTable};
use crate::utils::error::Result;

const UTF8_BOM: char = '\u{feff}';

/// Parse one delimited spreadsheet export.
///
/// The first record is the header row. Cells are trimmed and empty cells
/// become `None`; rows with no content at all are skipped. Ragged rows are
/// accepted, missing trailing cells read as empty.
pub fn parse_table(name: &str, data: &[u8], delimiter: u8) -> Result<SourceTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            // Excel 匯出的 UTF-8 CSV 會帶 BOM
            let h = if i == 0 { h.trim_start_matches(UTF8_BOM) } else { h };
            h.trim().to_string()
        })
        .collect();

    let mut rows = Vec::new();
    let mut blank = 0usize;
    for record in reader.records() {
        let row = RawRow::from_strings(record?.iter());
        if row.is_blank() {
            blank += 1;
            continue;
        }
        rows.push(row);
    }

    tracing::debug!(
        "Parsed '{}': {} columns, {} rows ({} blank rows skipped)",
        name,
        headers.len(),
        rows.len(),
        blank
    );

    Ok(SourceTable::new(name, headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::EtlError;

    #[test]
    fn test_parse_comma_separated_export() {
        let data = "\u{feff}Profissional,Celular,Cliente\nHiago Lopes Marques,(11) 98765-4321, João \n";
        let table = parse_table("primary", data.as_bytes(), b',').unwrap();

        assert_eq!(table.headers, vec!["Profissional", "Celular", "Cliente"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].get(2), Some("João"));
        assert_eq!(table.column("Profissional"), Some(0));
    }

    #[test]
    fn test_parse_semicolon_export_with_quotes_and_blank_rows() {
        let data = "Celular;Email;Obs;ComoSoube;Nome\n\
                    11987654321;a@b.com;\"gosta de; café\";Instagram;Maria\n\
                    ;;;;\n\
                    1133334444;;;;Ana\n";
        let table = parse_table("secondary", data.as_bytes(), b';').unwrap();

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].get(2), Some("gosta de; café"));
        assert_eq!(table.rows[1].get(1), None);
        assert_eq!(table.rows[1].get(4), Some("Ana"));
    }

    #[test]
    fn test_ragged_rows_are_accepted() {
        let data = "Celular,Email,Obs\n11987654321\n";
        let table = parse_table("secondary", data.as_bytes(), b',').unwrap();
        assert_eq!(table.rows[0].get(0), Some("11987654321"));
        assert_eq!(table.rows[0].get(2), None);
    }

    #[test]
    fn test_invalid_utf8_is_an_input_error() {
        let data = b"Nome\n\xe7\xe3o\n";
        let err = parse_table("secondary", data, b',').unwrap_err();
        assert!(matches!(err, EtlError::CsvError(_)));
    }
}
