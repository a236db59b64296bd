use std::path::Path;

use std::io::BufReader;

use calamine::{open_workbook_auto, DataType, Reader, Sheets};

use super::model::{CellValue, MetadataRecord, RawOrganTable};
use crate::error::{PipelineError, Result};

/// Reserved sheet holding per-organ plating metadata.
pub const METADATA_SHEET: &str = "metadata";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the workbook: one [`RawOrganTable`] per organ sheet plus the parsed
/// metadata records.
///
/// `sheets` selects specific organ sheets; `None` takes every sheet in the
/// workbook, in workbook order. The `metadata` sheet is never an organ table.
/// A requested sheet that does not exist is an error; so is a workbook
/// without a `metadata` sheet. The file handle lives only for this call.
pub fn load_workbook(
    path: &Path,
    sheets: Option<&[String]>,
) -> Result<(Vec<RawOrganTable>, Vec<MetadataRecord>)> {
    let mut workbook = open_workbook_auto(path)?;

    let organ_sheets: Vec<String> = match sheets {
        Some(names) => names
            .iter()
            .filter(|n| n.as_str() != METADATA_SHEET)
            .cloned()
            .collect(),
        None => workbook
            .sheet_names()
            .iter()
            .filter(|n| n.as_str() != METADATA_SHEET)
            .cloned()
            .collect(),
    };

    let metadata = {
        let table = read_sheet(&mut workbook, METADATA_SHEET)?;
        parse_metadata(&table)?
    };

    let mut organs = Vec::with_capacity(organ_sheets.len());
    for name in &organ_sheets {
        let table = read_sheet(&mut workbook, name)?;
        log::info!("sheet '{}': {} data rows", name, table.rows.len());
        organs.push(table);
    }

    Ok((organs, metadata))
}

// ---------------------------------------------------------------------------
// Sheet → RawOrganTable
// ---------------------------------------------------------------------------

fn read_sheet(
    workbook: &mut Sheets<BufReader<std::fs::File>>,
    name: &str,
) -> Result<RawOrganTable> {
    let range = workbook
        .worksheet_range(name)
        .ok_or_else(|| PipelineError::SheetMissing(name.to_string()))??;

    let mut rows_iter = range.rows();
    let headers: Vec<String> = rows_iter
        .next()
        .ok_or_else(|| PipelineError::Schema {
            sheet: name.to_string(),
            message: "sheet is empty".to_string(),
        })?
        .iter()
        .map(|c| cell_to_value(c).label())
        .collect();

    // Blank padding rows at the bottom of hand-edited sheets are not data.
    let rows: Vec<Vec<CellValue>> = rows_iter
        .map(|r| r.iter().map(cell_to_value).collect::<Vec<_>>())
        .filter(|cells: &Vec<CellValue>| cells.iter().any(|c| !c.is_null()))
        .collect();

    Ok(RawOrganTable {
        organ: name.to_string(),
        headers,
        rows,
    })
}

/// Total conversion from a workbook cell to a [`CellValue`].
///
/// Applied exactly once per cell; whitespace-only text collapses to null so
/// "looks empty" and "is empty" behave the same downstream.
fn cell_to_value(cell: &DataType) -> CellValue {
    match cell {
        DataType::Empty => CellValue::Null,
        DataType::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                CellValue::Null
            } else {
                CellValue::String(trimmed.to_string())
            }
        }
        DataType::Int(i) => CellValue::Integer(*i),
        DataType::Float(f) => CellValue::Float(*f),
        DataType::Bool(b) => CellValue::Bool(*b),
        DataType::DateTime(_) => match cell.as_date() {
            Some(d) => CellValue::Date(d.to_string()),
            None => CellValue::Null,
        },
        DataType::Duration(f) => CellValue::Float(*f),
        DataType::DateTimeIso(s) | DataType::DurationIso(s) => CellValue::Date(s.clone()),
        DataType::Error(e) => CellValue::String(format!("#ERR {e:?}")),
    }
}

// ---------------------------------------------------------------------------
// Metadata sheet
// ---------------------------------------------------------------------------

const METADATA_NUMERIC_COLUMNS: [&str; 5] = [
    "percent_organ_plated",
    "aliquot",
    "dilution_factor",
    "total_resuspension_mL",
    "volume_plated_uL",
];

fn parse_metadata(table: &RawOrganTable) -> Result<Vec<MetadataRecord>> {
    let column = |name: &str| -> Result<usize> {
        table
            .headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| PipelineError::Schema {
                sheet: METADATA_SHEET.to_string(),
                message: format!("missing required column '{name}'"),
            })
    };

    let organ_idx = column("organ")?;
    let mut numeric_idx = [0usize; METADATA_NUMERIC_COLUMNS.len()];
    for (slot, name) in numeric_idx.iter_mut().zip(METADATA_NUMERIC_COLUMNS) {
        *slot = column(name)?;
    }

    let mut records = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let organ = match row.get(organ_idx) {
            Some(v) if !v.is_null() => v.label(),
            _ => continue, // padding row without an organ key
        };

        let mut values = [0.0f64; METADATA_NUMERIC_COLUMNS.len()];
        for (value, (&idx, name)) in values
            .iter_mut()
            .zip(numeric_idx.iter().zip(METADATA_NUMERIC_COLUMNS))
        {
            let cell = row.get(idx).cloned().unwrap_or(CellValue::Null);
            *value = cell.as_f64().ok_or_else(|| PipelineError::Schema {
                sheet: METADATA_SHEET.to_string(),
                message: format!("organ '{organ}': column '{name}' is not numeric"),
            })?;
        }

        let [percent_organ_plated, aliquot, dilution_factor, total_resuspension_ml, volume_plated_ul] =
            values;
        records.push(MetadataRecord {
            organ,
            percent_organ_plated,
            aliquot,
            dilution_factor,
            total_resuspension_ml,
            volume_plated_ul,
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_workbook_is_a_load_error() {
        let err = load_workbook(Path::new("/no/such/workbook.xlsx"), None).unwrap_err();
        assert!(matches!(err, PipelineError::Load(_)));
    }

    #[test]
    fn garbage_file_is_a_load_error() {
        let mut file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        file.write_all(b"not a zip archive").unwrap();
        let err = load_workbook(file.path(), None).unwrap_err();
        assert!(matches!(err, PipelineError::Load(_)));
    }

    #[test]
    fn cells_convert_totally() {
        assert_eq!(cell_to_value(&DataType::Empty), CellValue::Null);
        assert_eq!(
            cell_to_value(&DataType::String("  ".into())),
            CellValue::Null
        );
        assert_eq!(
            cell_to_value(&DataType::String(" 12 ".into())),
            CellValue::String("12".into())
        );
        assert_eq!(cell_to_value(&DataType::Int(3)), CellValue::Integer(3));
        assert_eq!(cell_to_value(&DataType::Float(2.5)), CellValue::Float(2.5));
    }

    fn metadata_table(headers: &[&str], rows: Vec<Vec<CellValue>>) -> RawOrganTable {
        RawOrganTable {
            organ: METADATA_SHEET.to_string(),
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn metadata_rows_parse_with_textual_numbers() {
        let table = metadata_table(
            &[
                "organ",
                "percent_organ_plated",
                "aliquot",
                "dilution_factor",
                "total_resuspension_mL",
                "volume_plated_uL",
            ],
            vec![vec![
                CellValue::String("lung".into()),
                CellValue::Float(50.0),
                CellValue::String("0.1".into()),
                CellValue::Integer(10),
                CellValue::Float(1.0),
                CellValue::Integer(100),
            ]],
        );
        let records = parse_metadata(&table).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].organ, "lung");
        assert_eq!(records[0].aliquot, 0.1);
        assert_eq!(records[0].dilution_factor, 10.0);
        assert_eq!(records[0].volume_plated_ul, 100.0);
    }

    #[test]
    fn metadata_missing_column_is_a_schema_error() {
        let table = metadata_table(&["organ", "aliquot"], Vec::new());
        let err = parse_metadata(&table).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { .. }));
    }

    #[test]
    fn metadata_non_numeric_cell_is_a_schema_error() {
        let table = metadata_table(
            &[
                "organ",
                "percent_organ_plated",
                "aliquot",
                "dilution_factor",
                "total_resuspension_mL",
                "volume_plated_uL",
            ],
            vec![vec![
                CellValue::String("spleen".into()),
                CellValue::Float(50.0),
                CellValue::String("lots".into()),
                CellValue::Integer(10),
                CellValue::Float(1.0),
                CellValue::Integer(100),
            ]],
        );
        let err = parse_metadata(&table).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { .. }));
    }
}
