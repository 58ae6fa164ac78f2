use std::path::PathBuf;

use chrono::{DateTime, Utc};
use log::info;

use crate::config::GeneratorConfig;
use crate::error::GenError;
use crate::record::{assemble, TransactionRecord};
use crate::sampler::Sampler;
use crate::writer::write_partitions;

/// Samples and assembles `config.batch_size` records with timestamps trailing `now`.
///
/// # Errors
/// Errors when `config` is invalid or a sample cannot be assembled
pub fn generate(
    config: &GeneratorConfig,
    now: DateTime<Utc>,
) -> Result<Vec<TransactionRecord>, GenError> {
    config.validate()?;
    let mut sampler = Sampler::new(config, now)?;
    let samples = sampler.sample_batch(config.batch_size)?;
    assemble(&samples)
}

/// Generates a batch ending at `now` and writes it to `config.output_dir`.
///
/// # Errors
/// See [`generate`] and [`write_partitions`]
pub fn run_at(config: &GeneratorConfig, now: DateTime<Utc>) -> Result<Vec<PathBuf>, GenError> {
    let records = generate(config, now)?;
    let count = records.len();
    let files = write_partitions(records, &config.output_dir, config.format)?;
    info!(
        "Generated {} transactions across {} files in {}",
        count,
        files.len(),
        config.output_dir.display()
    );
    Ok(files)
}

/// # Errors
/// See [`run_at`]
pub fn run(config: &GeneratorConfig) -> Result<Vec<PathBuf>, GenError> {
    run_at(config, Utc::now())
}
