//! CFU plate-count tidying and per-organ group comparison.
//!
//! Takes a workbook with one sheet of raw colony counts per organ plus a
//! `metadata` sheet of plating parameters, normalizes everything into one
//! tidy replicate table with bacterial load per mL, and compares
//! experimental groups within each organ (one-way ANOVA + Tukey HSD on the
//! log10 scale).

pub mod data;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod stats;
