use std::error::Error;
use std::path::PathBuf;

use clap::{ArgEnum, Parser};
use log::info;

use payments_gen::config::{GeneratorConfig, OutputFormat};
use payments_gen::distribution::AmountDistribution;
use payments_gen::generator;

#[derive(Debug, Clone, Copy, ArgEnum)]
enum Format {
    Parquet,
    Csv,
}

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// TOML file with generator settings, flags below take precedence
    #[clap(long)]
    pub(crate) config: Option<PathBuf>,
    /// Number of transactions to generate
    #[clap(long)]
    pub(crate) batch_size: Option<usize>,
    /// Directory the monthly files are written to
    #[clap(long)]
    pub(crate) output_dir: Option<PathBuf>,
    /// Amount distribution, with its default parameters
    #[clap(long, possible_values = ["normal", "uniform", "exponential"])]
    pub(crate) distribution: Option<String>,
    #[clap(long, arg_enum)]
    pub(crate) format: Option<Format>,
    /// Seed for reproducible output
    #[clap(long)]
    pub(crate) seed: Option<u64>,
}

impl Cli {
    fn into_config(self) -> Result<GeneratorConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::from_toml_file(path)?,
            None => GeneratorConfig::default(),
        };
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(kind) = &self.distribution {
            config.amount = AmountDistribution::from_kind(kind)?;
        }
        if let Some(format) = self.format {
            config.format = match format {
                Format::Parquet => OutputFormat::Parquet,
                Format::Csv => OutputFormat::Csv,
            };
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = Cli::parse().into_config()?;
    info!("Generating with {:?}", config);

    for path in generator::run(&config)? {
        println!("{}", path.display());
    }

    Ok(())
}
