//! Spreadsheet export: one row per canonical record, one column per field.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rust_xlsxwriter::{Format, Workbook};
use thiserror::Error;
use tracing::info;

use placescout_common::{CanonicalRecord, FieldValue};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Write the canonical record set to an xlsx file under `out_dir`.
///
/// Column order: Name, Sources, then every field name in first-seen order
/// across the records. List fields are joined with ", "; structured fields are
/// serialized as compact JSON. Returns the written path.
pub fn export_xlsx(
    records: &[CanonicalRecord],
    requirement: &str,
    out_dir: &Path,
) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(filename(requirement));

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let header_format = Format::new().set_bold();

    let columns = field_columns(records);

    worksheet.write_with_format(0, 0, "Name", &header_format)?;
    worksheet.write_with_format(0, 1, "Sources", &header_format)?;
    for (index, column) in columns.iter().enumerate() {
        worksheet.write_with_format(0, (index + 2) as u16, header_label(column), &header_format)?;
    }

    for (row_index, record) in records.iter().enumerate() {
        let row = (row_index + 1) as u32;
        worksheet.write(row, 0, &record.name)?;
        worksheet.write(row, 1, record.source_count as u32)?;
        for (index, column) in columns.iter().enumerate() {
            let col = (index + 2) as u16;
            match record.fields.get(column) {
                Some(FieldValue::Number(n)) => {
                    worksheet.write(row, col, *n)?;
                }
                Some(value) => {
                    worksheet.write(row, col, render_text(value))?;
                }
                None => {}
            }
        }
    }

    worksheet.autofit();
    workbook.save(&path)?;

    info!(path = %path.display(), rows = records.len(), "Exported canonical records");
    Ok(path)
}

/// Field names in first-seen order across the record set.
fn field_columns(records: &[CanonicalRecord]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for field in record.fields.keys() {
            if seen.insert(field) {
                columns.push(field.clone());
            }
        }
    }
    columns
}

/// "price_level" → "Price Level".
fn header_label(field: &str) -> String {
    field
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_text(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(s) => s.clone(),
        FieldValue::Number(n) => n.to_string(),
        FieldValue::List(items) => items.join(", "),
        FieldValue::Structured(v) => serde_json::to_string(v).unwrap_or_default(),
    }
}

/// `data_<requirement slug>_<timestamp>.xlsx`
fn filename(requirement: &str) -> String {
    let slug: String = requirement
        .chars()
        .take(40)
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c.to_ascii_lowercase())
            } else if c.is_whitespace() || c == '-' || c == '_' {
                Some('_')
            } else {
                None
            }
        })
        .collect();
    let slug = slug.trim_matches('_');
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    if slug.is_empty() {
        format!("data_{timestamp}.xlsx")
    } else {
        format!("data_{slug}_{timestamp}.xlsx")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, fields: &[(&str, FieldValue)]) -> CanonicalRecord {
        CanonicalRecord {
            name: name.to_string(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            source_count: 1,
        }
    }

    #[test]
    fn header_labels_read_like_titles() {
        assert_eq!(header_label("price_level"), "Price Level");
        assert_eq!(header_label("rating"), "Rating");
        assert_eq!(header_label("reviews_count"), "Reviews Count");
    }

    #[test]
    fn list_and_structured_values_render_as_text() {
        let list = FieldValue::List(vec!["wifi".into(), "Parking".into()]);
        assert_eq!(render_text(&list), "wifi, Parking");

        let structured = FieldValue::Structured(serde_json::json!({"monday": "9-5"}));
        assert_eq!(render_text(&structured), "{\"monday\":\"9-5\"}");
    }

    #[test]
    fn filename_slugs_the_requirement() {
        let name = filename("All spas in Hyderabad!");
        assert!(name.starts_with("data_all_spas_in_hyderabad_"));
        assert!(name.ends_with(".xlsx"));
    }

    #[test]
    fn columns_follow_first_seen_order() {
        let records = vec![
            record("A", &[("rating", FieldValue::Number(4.0))]),
            record(
                "B",
                &[
                    ("address", FieldValue::Text("12 MG Road".into())),
                    ("rating", FieldValue::Number(4.5)),
                ],
            ),
        ];
        assert_eq!(field_columns(&records), vec!["rating", "address"]);
    }

    #[test]
    fn export_writes_a_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![record(
            "Tattva Spa",
            &[("rating", FieldValue::Number(4.5))],
        )];
        let path = export_xlsx(&records, "spas in hyderabad", dir.path()).unwrap();
        assert!(path.exists());
        assert!(path.extension().is_some_and(|e| e == "xlsx"));
    }

    #[test]
    fn empty_record_set_still_exports() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_xlsx(&[], "nothing found", dir.path()).unwrap();
        assert!(path.exists());
    }
}
