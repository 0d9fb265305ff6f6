use std::io::{self, Write as _};

use anyhow::{Context, Error};

use clap::Parser;

use panelcall_core::genotype;

/// Decode a single genotype.
///
/// Prints the decoded genotype and its zygosity, separated by a tab.
#[derive(Debug, Parser)]
pub struct Decode {
    /// Raw genotype, e.g. '0/1' or '1|2'.
    #[arg(value_name = "GT", allow_hyphen_values = true)]
    genotype: String,

    /// Reference allele.
    #[arg(short = 'r', long, value_name = "ALLELE")]
    reference: String,

    /// Alternate alleles.
    ///
    /// Use comma to separate multiple alternate alleles, in the order they are indexed by the
    /// genotype.
    #[arg(
        short = 'a',
        long,
        use_value_delimiter = true,
        value_delimiter = ',',
        value_name = "ALLELE,..."
    )]
    alternates: Vec<String>,
}

impl Decode {
    pub fn run(self) -> Result<(), Error> {
        let decoded = genotype::decode(&self.genotype, &self.reference, &self.alternates)
            .with_context(|| format!("Failed to decode genotype '{}'", self.genotype))?;

        writeln!(
            io::stdout().lock(),
            "{}\t{}",
            decoded.genotype,
            decoded.zygosity
        )?;

        Ok(())
    }
}
