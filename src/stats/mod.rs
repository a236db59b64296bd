//! Per-organ group comparison: one-way ANOVA on log10 concentration,
//! followed by Tukey HSD pairwise contrasts.
//!
//! Each organ is fit independently; an organ without enough group structure
//! yields an `InsufficientData` outcome without disturbing the others.

pub mod anova;
pub mod tukey;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::model::TidyReplicate;
use crate::error::{PipelineError, Result};
use self::anova::one_way;
use self::tukey::{studentized_range_cdf, studentized_range_quantile};

/// Confidence level of the Tukey intervals.
const CONFIDENCE: f64 = 0.95;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// One pairwise contrast: difference of group means on the log10 scale with
/// a multiplicity-adjusted p-value and confidence interval.
#[derive(Debug, Clone, Serialize)]
pub struct StatResult {
    pub organ: String,
    pub group_a: String,
    pub group_b: String,
    /// mean(group_b) − mean(group_a) on the log10 scale.
    pub estimate: f64,
    pub conf_low: f64,
    pub conf_high: f64,
    pub p_adj: f64,
}

/// Per-organ outcome: either the contrast rows or the organ-scoped error.
#[derive(Debug)]
pub struct OrganAnalysis {
    pub organ: String,
    pub result: Result<Vec<StatResult>>,
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Analyze every organ present in the joined table, in first-appearance
/// order. One organ failing its precondition does not abort the others.
pub fn analyze(replicates: &[TidyReplicate]) -> Vec<OrganAnalysis> {
    let mut order: Vec<String> = Vec::new();
    let mut by_organ: BTreeMap<String, BTreeMap<String, Vec<f64>>> = BTreeMap::new();

    for r in replicates {
        if !by_organ.contains_key(&r.organ) {
            order.push(r.organ.clone());
        }
        by_organ
            .entry(r.organ.clone())
            .or_default()
            .entry(r.group.clone())
            .or_default()
            .push(r.cfus_per_ml.log10());
    }

    order
        .into_iter()
        .map(|organ| {
            let result = analyze_organ(&organ, &by_organ[&organ]);
            OrganAnalysis { organ, result }
        })
        .collect()
}

/// Fit one organ. Groups with fewer than two observations cannot
/// contribute a variance estimate and are left out of the fit entirely
/// (a lone control plate does not generate contrasts). Group labels are
/// iterated in sorted order so contrast enumeration is reproducible run
/// to run.
fn analyze_organ(organ: &str, groups: &BTreeMap<String, Vec<f64>>) -> Result<Vec<StatResult>> {
    let fit_groups: Vec<(&String, &Vec<f64>)> = groups
        .iter()
        .filter(|(_, obs)| obs.len() >= 2)
        .collect();
    if fit_groups.len() < 2 {
        return Err(PipelineError::InsufficientData {
            organ: organ.to_string(),
        });
    }

    let slices: Vec<&[f64]> = fit_groups.iter().map(|(_, obs)| obs.as_slice()).collect();
    let fit = one_way(&slices).ok_or_else(|| PipelineError::InsufficientData {
        organ: organ.to_string(),
    })?;

    log::info!(
        "organ '{}': F = {:.4}, p = {:.4} ({} groups, {} residual df)",
        organ,
        fit.f_statistic,
        fit.p_value,
        fit.k,
        fit.df_within
    );

    let q_crit = studentized_range_quantile(CONFIDENCE, fit.k, fit.df_within);
    let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;

    let mut contrasts = Vec::new();
    for i in 0..fit_groups.len() {
        for j in (i + 1)..fit_groups.len() {
            let (a, obs_a) = fit_groups[i];
            let (b, obs_b) = fit_groups[j];

            let estimate = mean(obs_b) - mean(obs_a);
            // Tukey–Kramer standard error, valid for unequal group sizes
            let se = (fit.ms_within / 2.0
                * (1.0 / obs_a.len() as f64 + 1.0 / obs_b.len() as f64))
                .sqrt();
            let q = if se == 0.0 {
                if estimate == 0.0 {
                    0.0
                } else {
                    f64::INFINITY
                }
            } else {
                (estimate / se).abs()
            };

            contrasts.push(StatResult {
                organ: organ.to_string(),
                group_a: a.clone(),
                group_b: b.clone(),
                estimate,
                conf_low: estimate - q_crit * se,
                conf_high: estimate + q_crit * se,
                p_adj: 1.0 - studentized_range_cdf(q, fit.k, fit.df_within),
            });
        }
    }
    Ok(contrasts)
}
