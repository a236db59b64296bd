use super::model::LongTable;

/// Concatenate the per-organ long tables into one.
///
/// Rows keep their input order (sheet order end-to-end, for reproducible
/// report ordering). The column index is the first-seen union of all
/// inputs' columns; a row from a sheet that never had a column simply has
/// no entry for it, which downstream stages read as null.
pub fn union(tables: Vec<LongTable>) -> LongTable {
    let mut out = LongTable::default();
    for table in tables {
        for name in table.column_names {
            if !out.column_names.contains(&name) {
                out.column_names.push(name);
            }
        }
        out.rows.extend(table.rows);
    }
    out
}
