use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use cfu_tidy::output;
use cfu_tidy::pipeline::{self, PipelineConfig};
use cfu_tidy::stats::StatResult;

#[derive(Parser)]
#[command(name = "cfu-tidy", version)]
#[command(about = "Tidy a multi-organ CFU workbook and compare groups per organ")]
struct Cli {
    /// Workbook with one sheet per organ plus the reserved 'metadata' sheet
    workbook: PathBuf,

    /// Destination for the tidy replicate table
    #[arg(long, default_value = "cfu_tidy.csv")]
    output: PathBuf,

    /// Destination for the per-organ pairwise contrast table
    #[arg(long, default_value = "cfu_contrasts.csv")]
    contrasts: PathBuf,

    /// Organ sheets to process, comma-separated (default: every sheet)
    #[arg(long, value_delimiter = ',')]
    sheets: Option<Vec<String>>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = PipelineConfig {
        workbook: cli.workbook,
        sheets: cli.sheets,
    };
    let run = pipeline::run(&config).context("processing CFU workbook")?;

    output::write_tidy_csv(&cli.output, &run.replicates).context("writing tidy table")?;

    let contrasts: Vec<StatResult> = run
        .analyses
        .iter()
        .filter_map(|a| a.result.as_ref().ok())
        .flatten()
        .cloned()
        .collect();
    output::write_contrasts_csv(&cli.contrasts, &contrasts).context("writing contrast table")?;

    let analyzed = run.analyses.iter().filter(|a| a.result.is_ok()).count();
    println!(
        "{} tidy replicates -> {}",
        run.replicates.len(),
        cli.output.display()
    );
    println!(
        "{} contrasts across {} analyzed organs -> {}",
        contrasts.len(),
        analyzed,
        cli.contrasts.display()
    );

    Ok(())
}
