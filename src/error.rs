use polars::prelude::PolarsError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataframe error: {0}")]
    DataFrame(#[from] PolarsError),

    #[error("pdf error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("could not read calendar file: {0}")]
    CalendarParse(String),

    #[error("could not fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ToolError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ToolError::InvalidInput(message.into())
    }
}

pub type ToolResult<T> = Result<T, ToolError>;
