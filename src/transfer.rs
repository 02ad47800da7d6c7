//! JSON and CSV serialization for export and import.
//!
//! JSON export is a pretty-printed array of full records. CSV export takes its
//! header row from the keys of the first record (minus `id`), writes nested
//! objects and arrays as inline JSON, and produces nothing at all for an empty
//! collection.
//!
//! The CSV dialect has no quoting: import splits lines on `,` verbatim. A value
//! containing a comma, including any inline JSON with more than one member,
//! shifts the remaining columns of its row.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::civic_model::ExportFormat;
use crate::error::StoreError;

pub fn export<T: Serialize>(records: &[T], format: ExportFormat) -> Result<String, StoreError> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(records)?),
        ExportFormat::Csv => export_csv(records),
    }
}

pub fn export_csv<T: Serialize>(records: &[T]) -> Result<String, StoreError> {
    let rows = records
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;

    let Some(Value::Object(first)) = rows.first() else {
        return Ok(String::new());
    };
    let headers: Vec<&str> = first
        .keys()
        .map(String::as_str)
        .filter(|key| *key != "id")
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(headers.join(","));
    for row in &rows {
        let cells: Vec<String> = headers.iter().map(|header| csv_cell(row.get(*header))).collect();
        lines.push(cells.join(","));
    }
    Ok(lines.join("\n"))
}

fn csv_cell(value: Option<&Value>) -> String {
    match value {
        None => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Turns import input into one JSON value per row, ready to be deserialized
/// into drafts.
pub fn parse_rows(data: &str, format: ExportFormat) -> Result<Vec<Value>, StoreError> {
    match format {
        ExportFormat::Json => Ok(serde_json::from_str::<Vec<Value>>(data)?),
        ExportFormat::Csv => Ok(parse_csv_rows(data)),
    }
}

/// First line is the header; every other non-blank line becomes an object.
/// Inline JSON objects and arrays are parsed back; every other cell stays a
/// string, and the draft types read numbers and booleans out of strings.
/// Missing trailing cells are left out of the row.
pub fn parse_csv_rows(data: &str) -> Vec<Value> {
    let mut lines = data.lines();
    let Some(header_line) = lines.next() else {
        return Vec::new();
    };
    let headers: Vec<&str> = header_line.split(',').collect();

    lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut row = Map::new();
            for (header, cell) in headers.iter().zip(line.split(',')) {
                row.insert((*header).to_string(), csv_value(cell));
            }
            Value::Object(row)
        })
        .collect()
}

fn csv_value(cell: &str) -> Value {
    let trimmed = cell.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(nested @ (Value::Object(_) | Value::Array(_))) = serde_json::from_str(cell) {
            return nested;
        }
    }
    Value::String(cell.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn csv_export_skips_id_and_inlines_nested_values() {
        let records = vec![
            json!({"id": "a1", "title": "Flood", "isActive": true, "actions": ["Stay home"]}),
            json!({"id": "a2", "title": "Heat", "isActive": false, "actions": []}),
        ];
        let csv = export_csv(&records).unwrap();
        assert_eq!(
            csv,
            "title,isActive,actions\nFlood,true,[\"Stay home\"]\nHeat,false,[]"
        );
    }

    #[test]
    fn csv_export_of_nothing_is_empty() {
        let records: Vec<Value> = Vec::new();
        assert_eq!(export_csv(&records).unwrap(), "");
    }

    #[test]
    fn csv_headers_come_from_first_record_only() {
        let records = vec![json!({"id": "1", "a": 1}), json!({"id": "2", "a": 2, "b": 3})];
        assert_eq!(export_csv(&records).unwrap(), "a\n1\n2");
    }

    #[test]
    fn csv_rows_keep_scalars_as_text() {
        let rows = parse_csv_rows("title,attendees,isPublic\r\nPicnic,40,true\n\n1040,12,false\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], json!({"title": "Picnic", "attendees": "40", "isPublic": "true"}));
        assert_eq!(rows[1]["title"], "1040");
    }

    #[test]
    fn csv_rows_parse_inline_json() {
        let rows = parse_csv_rows("tags,location,note\n[\"tax\"],{\"city\":\"Springfield\"},[draft] notes");
        assert_eq!(rows[0]["tags"], json!(["tax"]));
        assert_eq!(rows[0]["location"], json!({"city": "Springfield"}));
        assert_eq!(rows[0]["note"], "[draft] notes");
    }

    #[test]
    fn csv_commas_shift_columns() {
        let rows = parse_csv_rows("title,source\nRoad closed, detour,County");
        assert_eq!(rows[0]["title"], "Road closed");
        assert_eq!(rows[0]["source"], " detour");
    }

    #[test]
    fn json_rows_must_be_an_array() {
        assert!(parse_rows("{\"title\":\"x\"}", ExportFormat::Json).is_err());
        assert_eq!(parse_rows("[]", ExportFormat::Json).unwrap().len(), 0);
    }
}
