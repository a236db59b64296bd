use std::path::Path;

use crate::data::model::TidyReplicate;
use crate::error::Result;
use crate::stats::StatResult;

// ---------------------------------------------------------------------------
// CSV writers
// ---------------------------------------------------------------------------

/// Write the tidy replicate table. Column names come from the record's
/// serde attributes and match the downstream report's expectations:
/// `organ, count_date, who_plated, who_counted, group, mouse, dilution,
/// CFUs, CFUs_per_ml`.
pub fn write_tidy_csv(path: &Path, replicates: &[TidyReplicate]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for replicate in replicates {
        writer.serialize(replicate)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the per-organ pairwise contrast table.
pub fn write_contrasts_csv(path: &Path, contrasts: &[StatResult]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for contrast in contrasts {
        writer.serialize(contrast)?;
    }
    writer.flush()?;
    Ok(())
}
