use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::distribution::AmountDistribution;
use crate::error::GenError;
use crate::reference::Currency;

pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_OUTPUT_DIR: &str = "/home/iceberg/data";
/// Trailing window the timestamps are spread over, roughly two years.
pub const DEFAULT_WINDOW_DAYS: u32 = 730;
pub const DEFAULT_REVERSAL_PROBABILITY: f64 = 0.01;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Parquet,
    Csv,
}

impl OutputFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Parquet => "parquet",
            OutputFormat::Csv => "csv",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub batch_size: usize,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    pub amount: AmountDistribution,
    /// Relative weights, they do not need to sum to one.
    pub currency_weights: Vec<(Currency, f64)>,
    pub reversal_probability: f64,
    pub window_days: u32,
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            format: OutputFormat::default(),
            amount: AmountDistribution::default(),
            currency_weights: default_currency_weights(),
            reversal_probability: DEFAULT_REVERSAL_PROBABILITY,
            window_days: DEFAULT_WINDOW_DAYS,
            seed: None,
        }
    }
}

#[must_use]
pub fn default_currency_weights() -> Vec<(Currency, f64)> {
    vec![
        (Currency::Isk, 90.0),
        (Currency::Usd, 3.33),
        (Currency::Eur, 3.33),
        (Currency::Gbp, 2.33),
        (Currency::Jpy, 1.34),
    ]
}

impl GeneratorConfig {
    /// Reads a TOML file, any key left out keeps its default.
    ///
    /// # Errors
    /// Errors when the file cannot be read, is not valid TOML, or fails [`GeneratorConfig::validate`]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, GenError> {
        let contents = fs::read_to_string(path)?;
        let config: GeneratorConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Errors when
    /// 1. `batch_size` or `window_days` is zero
    /// 2. `reversal_probability` is outside of `[0, 1]`
    /// 3. `currency_weights` is empty or holds a negative or non-finite weight
    pub fn validate(&self) -> Result<(), GenError> {
        if self.batch_size == 0 {
            return Err(GenError::InvalidConfig("batch_size must be positive".into()));
        }
        if self.window_days == 0 {
            return Err(GenError::InvalidConfig("window_days must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.reversal_probability) {
            return Err(GenError::InvalidConfig(format!(
                "reversal_probability must be within [0, 1], got {}",
                self.reversal_probability
            )));
        }
        if self.currency_weights.is_empty() {
            return Err(GenError::InvalidConfig("currency_weights is empty".into()));
        }
        if let Some((currency, weight)) = self
            .currency_weights
            .iter()
            .find(|(_, w)| !w.is_finite() || *w < 0.0)
        {
            return Err(GenError::InvalidConfig(format!(
                "weight {weight} for {currency} must be a non-negative number"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GeneratorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.format, OutputFormat::Parquet);
        let total: f64 = config.currency_weights.iter().map(|(_, w)| w).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_validate() {
        let mut config = GeneratorConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.batch_size = 10;
        config.reversal_probability = 1.5;
        assert!(config.validate().is_err());

        config.reversal_probability = 0.0;
        config.currency_weights = vec![(Currency::Isk, -1.0)];
        assert!(config.validate().is_err());

        config.currency_weights.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
batch_size = 50
output_dir = "out"
seed = 9
currency_weights = [["EUR", 1.0], ["USD", 1.0]]

[amount]
kind = "exponential"
lambda = 2.0
"#
        )
        .unwrap();

        let config = GeneratorConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.seed, Some(9));
        assert_eq!(
            config.amount,
            AmountDistribution::Exponential { lambda: 2.0 }
        );
        assert_eq!(config.currency_weights.len(), 2);
        assert_eq!(config.window_days, DEFAULT_WINDOW_DAYS);
        assert_eq!(config.format, OutputFormat::Parquet);
    }

    #[test]
    fn test_bad_toml_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "batch_size = \"many\"").unwrap();
        assert!(matches!(
            GeneratorConfig::from_toml_file(file.path()),
            Err(GenError::ConfigParseError(_))
        ));
    }
}
