use std::path::PathBuf;

use anyhow::Error;

use clap::{Parser, ValueEnum};

use panelcall_core::output;

mod runner;
use runner::Runner;

/// Extract genotype calls for a variant catalog from VCF.
#[derive(Debug, Parser)]
pub struct Extract {
    /// Input VCF file.
    ///
    /// The VCF may be uncompressed, gzipped, or bgzipped. If no file is provided, stdin will be
    /// used. Only the first sample is considered.
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Variant catalog.
    ///
    /// Each line should contain the tab-separated category, gene, identifier, and description of
    /// a variant of interest. The category column may be left out, in which case the default
    /// category is used.
    #[arg(short = 'c', long, value_name = "FILE")]
    catalog: PathBuf,

    /// Resolution cache.
    ///
    /// JSON file mapping identifiers to genomic coordinates. Identifiers fetched from the refSNP
    /// directory are added to the file. If the file does not exist, it will be created.
    #[arg(short = 'r', long, value_name = "FILE")]
    resolutions: PathBuf,

    /// Directory of refSNP JSON records.
    ///
    /// Identifiers not found in the resolution cache are looked up in this directory, in files
    /// named by the rsID number, e.g. '113993960.json'.
    #[arg(long, value_name = "DIR", conflicts_with = "ncbi")]
    refsnp_dir: Option<PathBuf>,

    /// Fetch unresolved identifiers from the NCBI Variation Services.
    ///
    /// Identifiers not found in the resolution cache are requested from the dbSNP refSNP
    /// endpoint, and the results are added to the resolution cache.
    #[arg(long)]
    ncbi: bool,

    /// Minimum delay between requests to the NCBI Variation Services, in milliseconds.
    #[arg(long, default_value_t = 350, value_name = "MS", requires = "ncbi")]
    request_delay: u64,

    /// Category of catalog rows without a category column.
    #[arg(long, default_value = "Uncategorized", value_name = "STR")]
    default_category: String,

    /// Output format.
    #[arg(short = 'f', long, value_enum, default_value_t = Format::Tsv, value_name = "FORMAT")]
    format: Format,

    /// Output path.
    ///
    /// If no path is given, calls will be output to stdout.
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, Eq, PartialEq)]
pub enum Format {
    /// Tab-separated values with a header line.
    Tsv,
    /// JSON object keyed by identifier.
    Json,
}

impl From<Format> for output::Format {
    fn from(format: Format) -> Self {
        match format {
            Format::Tsv => output::Format::Tsv,
            Format::Json => output::Format::Json,
        }
    }
}

impl Extract {
    pub fn run(self) -> Result<(), Error> {
        let runner = Runner::try_from(&self)?;

        let extraction = runner.run()?;

        output::Builder::default()
            .set_format(self.format.into())
            .write_to_path_or_stdout(self.output, &extraction.calls)?;

        Ok(())
    }
}
