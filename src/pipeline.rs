use std::path::PathBuf;

use crate::data::model::TidyReplicate;
use crate::data::{filter, join, loader, reshape, union};
use crate::error::Result;
use crate::stats::{self, OrganAnalysis};

// ---------------------------------------------------------------------------
// End-to-end pipeline
// ---------------------------------------------------------------------------

/// Run configuration: the workbook plus an optional explicit sheet list.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub workbook: PathBuf,
    /// Organ sheets to process; `None` means every sheet in workbook order.
    pub sheets: Option<Vec<String>>,
}

/// Everything the report layer consumes: the joined replicate table and the
/// per-organ analysis outcomes.
#[derive(Debug)]
pub struct PipelineOutput {
    pub replicates: Vec<TidyReplicate>,
    pub analyses: Vec<OrganAnalysis>,
}

/// Load, reshape, union, filter, join, analyze. Each stage consumes the
/// previous stage's table by value; loading and reshaping errors abort the
/// run, per-organ statistical failures are logged and carried as outcomes.
pub fn run(config: &PipelineConfig) -> Result<PipelineOutput> {
    let (organs, metadata) =
        loader::load_workbook(&config.workbook, config.sheets.as_deref())?;
    log::info!(
        "loaded {} organ sheets and {} metadata records",
        organs.len(),
        metadata.len()
    );

    let mut reshaped = Vec::with_capacity(organs.len());
    for table in organs {
        reshaped.push(reshape::reshape(table)?);
    }

    let unioned = union::union(reshaped);
    log::info!("{} replicate records after reshape", unioned.len());

    let filtered = filter::countable(unioned)?;
    log::info!("{} records in the countable window (controls kept)", filtered.len());

    let replicates = join::join_and_compute(filtered, &metadata)?;
    log::info!("{} replicates joined to organ metadata", replicates.len());

    let analyses = stats::analyze(&replicates);
    for analysis in &analyses {
        if let Err(err) = &analysis.result {
            log::warn!("statistics skipped: {err}");
        }
    }

    Ok(PipelineOutput {
        replicates,
        analyses,
    })
}
