use std::fmt;

/// The column layout declared by a VCF header line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Header {
    pub(super) chromosome: usize,
    pub(super) position: usize,
    pub(super) reference: usize,
    pub(super) alternates: usize,
    pub(super) quality: Option<usize>,
    pub(super) filter: Option<usize>,
    pub(super) format: Option<usize>,
    pub(super) sample: Option<usize>,
    pub(super) min_columns: usize,
}

impl Header {
    /// Parses a header line, e.g. `#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA12878`.
    ///
    /// The sample is taken to be the first column after the `FORMAT` column.
    pub fn from_line(line: &str) -> Result<Self, ParseHeaderError> {
        let names = line
            .strip_prefix('#')
            .ok_or(ParseHeaderError::MissingPrefix)?
            .split('\t')
            .collect::<Vec<_>>();

        let find = |name: &'static str| names.iter().position(|&column| column == name);
        let require = |name: &'static str| find(name).ok_or(ParseHeaderError::MissingColumn(name));

        let chromosome = require("CHROM")?;
        let position = require("POS")?;
        let reference = require("REF")?;
        let alternates = require("ALT")?;
        let quality = find("QUAL");
        let filter = find("FILTER");
        let format = find("FORMAT");
        let sample = format.map(|i| i + 1).filter(|&i| i < names.len());

        let min_columns = [chromosome, position, reference, alternates]
            .into_iter()
            .chain([quality, filter, format].into_iter().flatten())
            .max()
            .map(|i| i + 1)
            .unwrap_or_default();

        Ok(Self {
            chromosome,
            position,
            reference,
            alternates,
            quality,
            filter,
            format,
            sample,
            min_columns,
        })
    }

    /// Returns true if the header declares a sample column.
    pub fn has_sample(&self) -> bool {
        self.sample.is_some()
    }
}

/// An error associated with parsing a header line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseHeaderError {
    /// The line does not start with `#`.
    MissingPrefix,
    /// A required column is not declared.
    MissingColumn(&'static str),
}

impl fmt::Display for ParseHeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseHeaderError::MissingPrefix => f.write_str("header line does not start with '#'"),
            ParseHeaderError::MissingColumn(name) => {
                write!(f, "required column '{name}' missing from header")
            }
        }
    }
}

impl std::error::Error for ParseHeaderError {}
