use statrs::distribution::{ContinuousCDF, FisherSnedecor};

// ---------------------------------------------------------------------------
// One-way analysis of variance
// ---------------------------------------------------------------------------

/// Summary of a one-way ANOVA fit; the within-group mean square and degrees
/// of freedom feed the Tukey post-hoc contrasts.
#[derive(Debug, Clone)]
pub struct AnovaFit {
    /// Number of groups in the fit.
    pub k: usize,
    pub df_within: f64,
    pub ms_within: f64,
    pub f_statistic: f64,
    pub p_value: f64,
}

/// Fit `value ~ group` over the given groups of observations.
///
/// Returns `None` when the design is degenerate: fewer than two groups, or
/// no residual degrees of freedom.
pub fn one_way(groups: &[&[f64]]) -> Option<AnovaFit> {
    let k = groups.len();
    let n: usize = groups.iter().map(|g| g.len()).sum();
    if k < 2 || n <= k {
        return None;
    }

    let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;
    let grand = groups.iter().flat_map(|g| g.iter()).sum::<f64>() / n as f64;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for g in groups {
        let m = mean(g);
        ss_between += g.len() as f64 * (m - grand) * (m - grand);
        ss_within += g.iter().map(|x| (x - m) * (x - m)).sum::<f64>();
    }

    let df_between = (k - 1) as f64;
    let df_within = (n - k) as f64;
    let ms_between = ss_between / df_between;
    let ms_within = ss_within / df_within;

    let (f_statistic, p_value) = if ms_within == 0.0 {
        // all residuals zero: the group effect explains everything
        (f64::INFINITY, 0.0)
    } else {
        let f = ms_between / ms_within;
        let p = FisherSnedecor::new(df_between, df_within)
            .map(|dist| 1.0 - dist.cdf(f))
            .ok()?;
        (f, p)
    };

    Some(AnovaFit {
        k,
        df_within,
        ms_within,
        f_statistic,
        p_value,
    })
}
