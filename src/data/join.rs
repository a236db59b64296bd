use std::collections::BTreeMap;

use super::model::{columns, CellValue, LongTable, MetadataRecord, Row, TidyReplicate};
use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// Metadata join + load calculation
// ---------------------------------------------------------------------------

/// Inner-join the filtered table to the per-organ metadata and compute the
/// bacterial load per mL:
///
/// `CFUs_per_mL = CFUs × dilution_factor^dilution ×
///                (total_resuspension_mL / volume_plated_uL) × 1000`
///
/// A replicate whose organ has no metadata record is excluded without any
/// diagnostic. That is the documented contract of this stage, not an
/// accident: organs are sometimes plated before their metadata row is
/// filled in, and those counts are unusable for concentration estimates.
/// Output records carry exactly the tidy output columns; anything else a
/// sheet happened to contain is dropped here.
pub fn join_and_compute(
    table: LongTable,
    metadata: &[MetadataRecord],
) -> Result<Vec<TidyReplicate>> {
    let by_organ: BTreeMap<&str, &MetadataRecord> = metadata
        .iter()
        .map(|m| (m.organ.as_str(), m))
        .collect();

    let mut replicates = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let organ = match text(row, columns::ORGAN) {
            Some(o) => o,
            None => continue,
        };
        let meta = match by_organ.get(organ.as_str()) {
            Some(m) => m,
            None => continue, // no metadata for this organ: silently excluded
        };

        let cfus = numeric(row, columns::CFUS)?;
        let dilution = dilution_level(row)?;

        let per_ml = cfus
            * meta.dilution_factor.powi(dilution as i32)
            * (meta.total_resuspension_ml / meta.volume_plated_ul)
            * 1000.0;

        replicates.push(TidyReplicate {
            organ,
            count_date: text(row, columns::COUNT_DATE),
            who_plated: text(row, columns::WHO_PLATED),
            who_counted: text(row, columns::WHO_COUNTED),
            group: text(row, columns::GROUP).unwrap_or_default(),
            mouse: text(row, columns::MOUSE),
            dilution,
            cfus,
            cfus_per_ml: per_ml,
        });
    }

    Ok(replicates)
}

fn text(row: &Row, column: &str) -> Option<String> {
    row.get(column).filter(|c| !c.is_null()).map(CellValue::label)
}

fn numeric(row: &Row, column: &str) -> Result<f64> {
    let cell = row.get(column).cloned().unwrap_or(CellValue::Null);
    cell.as_f64().ok_or_else(|| PipelineError::NonNumeric {
        column: column.to_string(),
        value: cell.label(),
    })
}

fn dilution_level(row: &Row) -> Result<u32> {
    match row.get(columns::DILUTION) {
        Some(CellValue::Integer(i)) if *i >= 0 => Ok(*i as u32),
        other => Err(PipelineError::NonNumeric {
            column: columns::DILUTION.to_string(),
            value: other.cloned().unwrap_or(CellValue::Null).label(),
        }),
    }
}
