//! CSV decoding for link table files

use crate::encoding::{decode_first, describe_attempts};
use crate::error::{Error, Result};
use crate::table::{Column, Row, Table};
use std::fs;
use std::path::Path;

/// Decode a CSV file into a Table, trying each candidate encoding
pub fn parse_csv<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_csv_bytes(&bytes, path)
}

/// Decode raw CSV bytes (e.g. an uploaded file) bound to `source`
pub fn parse_csv_bytes<P: AsRef<Path>>(bytes: &[u8], source: P) -> Result<Table> {
    let source = source.as_ref();

    match decode_first(bytes, |text| parse_csv_str(text, source)) {
        Ok(decoded) => {
            let mut table = decoded.value;
            table.encoding = Some(decoded.encoding.name().to_string());
            tracing::debug!(
                path = %source.display(),
                encoding = decoded.encoding.name(),
                rows = table.row_count(),
                "decoded table"
            );
            Ok(table)
        }
        Err(attempts) => Err(Error::Decode {
            path: source.to_path_buf(),
            tried: describe_attempts(&attempts),
        }),
    }
}

/// Parse already-decoded CSV text
pub fn parse_csv_str<P: AsRef<Path>>(content: &str, source: P) -> Result<Table> {
    let path = source.as_ref().to_path_buf();

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // short rows are padded below
        .from_reader(content.as_bytes());

    let headers = csv_reader.headers().map_err(|e| Error::Csv {
        path: path.clone(),
        source: e,
    })?;

    let columns: Vec<Column> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| Column::new(name.to_string(), i))
        .collect();

    if columns.is_empty() {
        return Err(Error::CsvParse {
            path,
            message: "no columns found in CSV".to_string(),
        });
    }

    let mut rows = Vec::new();
    for (row_idx, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| Error::Csv {
            path: path.clone(),
            source: e,
        })?;

        if record.len() > columns.len() {
            return Err(Error::CsvParse {
                path,
                message: format!(
                    "row {} has {} fields, header has {}",
                    row_idx + 1,
                    record.len(),
                    columns.len()
                ),
            });
        }

        let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
        cells.resize(columns.len(), String::new());
        rows.push(Row::new(cells));
    }

    Ok(Table {
        columns,
        rows,
        source_path: path,
        encoding: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{EUC_JP, GBK, SHIFT_JIS};

    #[test]
    fn test_parse_simple_csv() {
        let csv = "NAME,URL\nExample,https://example.com\nNoLink,\n";
        let table = parse_csv_str(csv, "sites.csv").unwrap();

        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.columns[0].name, "NAME");
        assert_eq!(table.columns[1].name, "URL");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.cell(0, "url"), Some("https://example.com"));
        assert_eq!(table.cell(1, "url"), Some(""));
    }

    #[test]
    fn test_parse_keeps_cell_text_verbatim() {
        let csv = "name,url,rank\n  padded  ,https://a,3.10\n";
        let table = parse_csv_str(csv, "t.csv").unwrap();

        assert_eq!(table.rows[0].cells, vec!["  padded  ", "https://a", "3.10"]);
    }

    #[test]
    fn test_parse_pads_short_rows() {
        let csv = "name,url,note\nonly-name\n";
        let table = parse_csv_str(csv, "t.csv").unwrap();

        assert_eq!(table.rows[0].cells, vec!["only-name", "", ""]);
    }

    #[test]
    fn test_parse_rejects_long_rows() {
        let csv = "name,url\na,b,c\n";
        let err = parse_csv_str(csv, "t.csv").unwrap_err();

        assert!(matches!(err, Error::CsvParse { .. }));
    }

    #[test]
    fn test_parse_empty_input_has_no_columns() {
        let err = parse_csv_str("", "t.csv").unwrap_err();
        assert!(matches!(err, Error::CsvParse { .. }));
    }

    #[test]
    fn test_parse_quoted_fields() {
        let csv = "name,url\n\"Hello, World\",\"https://example.com/?q=\"\"x\"\"\"\n";
        let table = parse_csv_str(csv, "t.csv").unwrap();

        assert_eq!(table.rows[0].cells[0], "Hello, World");
        assert_eq!(table.rows[0].cells[1], "https://example.com/?q=\"x\"");
    }

    #[test]
    fn test_bytes_decode_same_rows_in_every_encoding() {
        let japanese = "名前,URL\nグーグル,https://google.com\nｶﾅ,\n";
        let expected = parse_csv_bytes(japanese.as_bytes(), "a.csv").unwrap();
        assert_eq!(expected.encoding.as_deref(), Some("UTF-8"));

        let (sjis, _, _) = SHIFT_JIS.encode(japanese);
        let sjis = parse_csv_bytes(&sjis, "a.csv").unwrap();
        assert_eq!(sjis.encoding.as_deref(), Some("Shift_JIS"));
        assert_eq!(sjis.columns, expected.columns);
        assert_eq!(sjis.rows, expected.rows);

        let mut utf16 = Vec::new();
        for unit in japanese.encode_utf16() {
            utf16.extend_from_slice(&unit.to_le_bytes());
        }
        let utf16 = parse_csv_bytes(&utf16, "a.csv").unwrap();
        assert_eq!(utf16.encoding.as_deref(), Some("UTF-16LE"));
        assert_eq!(utf16.rows, expected.rows);

        // Without half-width katakana, Shift_JIS rejects the EUC-JP bytes
        let plain = "名前,URL\nグーグル,https://google.com\n";
        let (euc, _, _) = EUC_JP.encode(plain);
        let euc = parse_csv_bytes(&euc, "b.csv").unwrap();
        assert_eq!(euc.encoding.as_deref(), Some("EUC-JP"));
        assert_eq!(euc.rows, parse_csv_str(plain, "b.csv").unwrap().rows);

        let chinese = "名字,URL\n個人,https://example.cn\n";
        let (gbk, _, _) = GBK.encode(chinese);
        let gbk = parse_csv_bytes(&gbk, "c.csv").unwrap();
        assert_eq!(gbk.encoding.as_deref(), Some("GBK"));
        assert_eq!(gbk.rows, parse_csv_str(chinese, "c.csv").unwrap().rows);
    }

    #[test]
    fn test_bytes_decode_error_names_file() {
        let err = parse_csv_bytes(b"", "empty.csv").unwrap_err();
        match err {
            Error::Decode { path, tried } => {
                assert_eq!(path, std::path::PathBuf::from("empty.csv"));
                assert!(tried.contains("UTF-8"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_csv_missing_file() {
        let err = parse_csv("definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }
}
