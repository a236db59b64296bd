use thiserror::Error;

/// Everything that can go wrong between opening the workbook and writing
/// the contrast table.
///
/// `InsufficientData` is the one recoverable variant: the statistics driver
/// catches it per organ and keeps going. All other variants abort the run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to open workbook: {0}")]
    Load(#[from] calamine::Error),

    #[error("sheet '{0}' not found in workbook")]
    SheetMissing(String),

    #[error("sheet '{sheet}': {message}")]
    Schema { sheet: String, message: String },

    #[error("column '{column}': expected a number, found '{value}'")]
    NonNumeric { column: String, value: String },

    #[error("organ '{organ}': fewer than two groups with two or more observations")]
    InsufficientData { organ: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
