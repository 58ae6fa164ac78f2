use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenError {
    #[error("CSV Error")]
    CsvError(#[from] csv::Error),
    #[error("I/O Error")]
    IoError(#[from] io::Error),
    #[error("Arrow Error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),
    #[error("Parquet Error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),
    #[error("Malformed config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("Invalid weights: {0}")]
    WeightsError(#[from] rand::distributions::WeightedError),
    #[error("No {kind} is labelled {label:?}")]
    UnknownLabel { kind: &'static str, label: String },
    #[error("Merchant {0:?} is not in the merchant table")]
    UnknownMerchant(String),
    #[error("Reference list of {0} is empty")]
    EmptyReference(&'static str),
    #[error("Invalid amount distribution: {0}")]
    InvalidDistribution(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Amount {0} cannot be represented as a decimal")]
    InvalidAmount(f64),
}
