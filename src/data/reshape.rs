use once_cell::sync::Lazy;
use regex::Regex;

use super::model::{columns, CellValue, LongTable, RawOrganTable, Row};
use crate::error::{PipelineError, Result};

/// Dilution columns carry the serial-dilution exponent in their name,
/// e.g. `dil_1`, `dil2`, `DIL_10`.
static DILUTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^dil_?(\d+)$").expect("dilution pattern is valid"));

// ---------------------------------------------------------------------------
// Wide → long
// ---------------------------------------------------------------------------

/// Melt one organ sheet into long-format replicate records.
///
/// Every (data row, dilution column) pair with a present cell becomes one
/// record carrying the row's non-dilution columns unchanged, the parsed
/// `dilution` level and the cell as `CFUs`. An absent cell drops only that
/// pair; other dilution levels from the same row still emit.
pub fn reshape(table: RawOrganTable) -> Result<LongTable> {
    let RawOrganTable {
        organ,
        headers,
        mut rows,
    } = table;

    let dilution_cols: Vec<(usize, u32)> = headers
        .iter()
        .enumerate()
        .filter_map(|(idx, header)| {
            DILUTION_PATTERN
                .captures(header)
                .and_then(|cap| cap[1].parse::<u32>().ok())
                .map(|level| (idx, level))
        })
        .collect();

    if dilution_cols.is_empty() {
        return Err(PipelineError::Schema {
            sheet: organ,
            message: "no dilution columns (expected names like 'dil_1')".to_string(),
        });
    }

    for &(idx, _) in &dilution_cols {
        canonicalize_column(&mut rows, idx);
    }

    let id_cols: Vec<usize> = (0..headers.len())
        .filter(|i| dilution_cols.iter().all(|&(d, _)| d != *i))
        .collect();

    let mut column_names = vec![columns::ORGAN.to_string()];
    column_names.extend(id_cols.iter().map(|&i| headers[i].clone()));
    column_names.push(columns::DILUTION.to_string());
    column_names.push(columns::CFUS.to_string());

    let mut out = LongTable::new(column_names);
    for row in &rows {
        for &(idx, level) in &dilution_cols {
            let cell = match row.get(idx) {
                Some(c) if !c.is_null() => c.clone(),
                _ => continue, // this dilution was not measured for this row
            };

            let mut record = Row::new();
            record.insert(
                columns::ORGAN.to_string(),
                CellValue::String(organ.clone()),
            );
            for &i in &id_cols {
                if let Some(c) = row.get(i) {
                    if !c.is_null() {
                        record.insert(headers[i].clone(), c.clone());
                    }
                }
            }
            record.insert(
                columns::DILUTION.to_string(),
                CellValue::Integer(i64::from(level)),
            );
            record.insert(columns::CFUS.to_string(), cell);
            out.rows.push(record);
        }
    }

    Ok(out)
}

/// Canonicalize one dilution column before melting: if every present cell
/// parses as a number the column becomes `Float`, otherwise every present
/// cell becomes `String`. One pass, one rule, no chained re-coercion.
fn canonicalize_column(rows: &mut [Vec<CellValue>], idx: usize) {
    let numeric = rows
        .iter()
        .filter_map(|r| r.get(idx))
        .filter(|c| !c.is_null())
        .all(|c| c.as_f64().is_some());

    for row in rows.iter_mut() {
        if let Some(cell) = row.get_mut(idx) {
            if cell.is_null() {
                continue;
            }
            *cell = if numeric {
                match cell.as_f64() {
                    Some(v) => CellValue::Float(v),
                    None => continue,
                }
            } else {
                CellValue::String(cell.label())
            };
        }
    }
}
