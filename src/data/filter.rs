use super::model::{columns, CellValue, LongTable, Row};
use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// Countability window
// ---------------------------------------------------------------------------

/// Plate counts below this are statistically unreliable.
pub const COUNTABLE_MIN: f64 = 5.0;
/// Plate counts above this are too crowded to count reliably.
pub const COUNTABLE_MAX: f64 = 95.0;
/// Reserved group whose replicates bypass the countability window; control
/// plates establish baseline and contamination checks whatever their count.
pub const CONTROL_GROUP: &str = "control";

/// Keep replicates whose raw count is inside the countable window, plus
/// every control-group replicate regardless of count.
///
/// `CFUs` must be numeric for every record by this stage (the reshaper has
/// already canonicalized each column); a textual count is an error, not a
/// silent drop. No deduplication happens here: a mouse with two countable
/// dilution levels keeps both records.
pub fn countable(table: LongTable) -> Result<LongTable> {
    let LongTable { column_names, rows } = table;

    let mut kept = Vec::with_capacity(rows.len());
    for row in rows {
        let cell = row.get(columns::CFUS).cloned().unwrap_or(CellValue::Null);
        let cfus = cell.as_f64().ok_or_else(|| PipelineError::NonNumeric {
            column: columns::CFUS.to_string(),
            value: cell.label(),
        })?;

        if is_control(&row) || (COUNTABLE_MIN..=COUNTABLE_MAX).contains(&cfus) {
            kept.push(row);
        }
    }

    Ok(LongTable {
        column_names,
        rows: kept,
    })
}

fn is_control(row: &Row) -> bool {
    row.get(columns::GROUP)
        .map(|g| g.label() == CONTROL_GROUP)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(group: &str, cfus: CellValue) -> Row {
        let mut r = Row::new();
        r.insert(columns::GROUP.to_string(), CellValue::String(group.into()));
        r.insert(columns::CFUS.to_string(), cfus);
        r
    }

    fn run(rows: Vec<Row>) -> Result<Vec<f64>> {
        let table = LongTable {
            column_names: vec![columns::GROUP.to_string(), columns::CFUS.to_string()],
            rows,
        };
        Ok(countable(table)?
            .rows
            .iter()
            .map(|r| r[columns::CFUS].as_f64().unwrap())
            .collect())
    }

    #[test]
    fn window_boundaries_are_inclusive() {
        let kept = run(vec![
            row("group_1", CellValue::Float(4.0)),
            row("group_1", CellValue::Float(5.0)),
            row("group_1", CellValue::Float(95.0)),
            row("group_1", CellValue::Float(96.0)),
        ])
        .unwrap();
        assert_eq!(kept, vec![5.0, 95.0]);
    }

    #[test]
    fn control_rows_always_survive() {
        let kept = run(vec![
            row(CONTROL_GROUP, CellValue::Float(0.0)),
            row(CONTROL_GROUP, CellValue::Float(400.0)),
            row("group_2", CellValue::Float(400.0)),
        ])
        .unwrap();
        assert_eq!(kept, vec![0.0, 400.0]);
    }

    #[test]
    fn textual_count_is_an_error() {
        let err = run(vec![row("group_1", CellValue::String("TNTC".into()))]).unwrap_err();
        assert!(matches!(err, PipelineError::NonNumeric { .. }));
    }

    #[test]
    fn multiple_countable_dilutions_per_mouse_all_survive() {
        let kept = run(vec![
            row("group_1", CellValue::Float(50.0)),
            row("group_1", CellValue::Float(7.0)),
        ])
        .unwrap();
        assert_eq!(kept.len(), 2);
    }
}
