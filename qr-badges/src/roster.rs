//! CSV roster parsing.

use csv::{ReaderBuilder, StringRecord};
use std::path::Path;

use crate::error::{BadgeError, Result};

pub const PREFERRED_COLUMN: &str = "Preferred";
pub const LAST_COLUMN: &str = "Last";
pub const CODE_COLUMN: &str = "Code";

const REQUIRED_COLUMNS: [&str; 3] = [PREFERRED_COLUMN, LAST_COLUMN, CODE_COLUMN];

/// One attendee, taken from one CSV row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeRecord {
    /// 1-based data row number (the header is not counted)
    pub row: usize,
    pub preferred_name: String,
    pub last_name: String,
    /// QR payload, usually a URL
    pub code: String,
}

/// Positions of the required columns within the header.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    preferred: usize,
    last: usize,
    code: usize,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h == name);

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|name| position(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(BadgeError::config(format!(
                "Missing required CSV columns: {}",
                missing.join(", ")
            )));
        }

        // All three are present past this point.
        Ok(ColumnMap {
            preferred: position(PREFERRED_COLUMN).unwrap_or_default(),
            last: position(LAST_COLUMN).unwrap_or_default(),
            code: position(CODE_COLUMN).unwrap_or_default(),
        })
    }
}

/// Read the roster at `path`. The file must have a `.csv` extension.
pub fn load_roster(path: &Path) -> Result<Vec<BadgeRecord>> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if !is_csv {
        return Err(BadgeError::config(format!(
            "Only CSV input is supported: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path).map_err(|e| BadgeError::io(path, e))?;
    let records = parse_roster(&content)?;
    log::info!("Read {} badge records from {}", records.len(), path.display());
    Ok(records)
}

/// Parse roster text. Rows keep their file order.
pub fn parse_roster(content: &str) -> Result<Vec<BadgeRecord>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| BadgeError::config(format!("Unreadable CSV header: {}", e)))?
        .clone();
    let columns = ColumnMap::from_headers(&headers)?;
    log::debug!("CSV columns: {:?}", headers.iter().collect::<Vec<_>>());

    let mut records = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let row = index + 1;
        let record = result.map_err(|e| BadgeError::data(row, e.to_string(), ""))?;
        records.push(normalize_row(row, &record, headers.len(), columns)?);
    }

    if records.is_empty() {
        log::warn!("CSV contains a header but no badge records");
    }

    Ok(records)
}

fn normalize_row(
    row: usize,
    record: &StringRecord,
    expected_fields: usize,
    columns: ColumnMap,
) -> Result<BadgeRecord> {
    if record.len() != expected_fields {
        return Err(BadgeError::data(
            row,
            format!("expected {} fields, found {}", expected_fields, record.len()),
            raw_row(record),
        ));
    }

    let field = |index: usize, name: &str| -> Result<String> {
        let value = record.get(index).unwrap_or("").trim();
        if value.is_empty() {
            return Err(BadgeError::data(
                row,
                format!("empty `{}` field", name),
                raw_row(record),
            ));
        }
        Ok(value.to_string())
    };

    Ok(BadgeRecord {
        row,
        preferred_name: field(columns.preferred, PREFERRED_COLUMN)?,
        last_name: field(columns.last, LAST_COLUMN)?,
        code: field(columns.code, CODE_COLUMN)?,
    })
}

fn raw_row(record: &StringRecord) -> String {
    record.iter().collect::<Vec<_>>().join(",")
}
