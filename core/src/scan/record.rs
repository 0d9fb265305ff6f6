use super::{Header, Skip};

/// A VCF data line, located by chromosome and position.
///
/// Only the chromosome and position are parsed up front; other fields are parsed on demand.
#[derive(Clone, Copy, Debug)]
pub(super) struct Record<'a> {
    header: &'a Header,
    line: &'a str,
    pub chromosome: &'a str,
    pub position: u64,
}

impl<'a> Record<'a> {
    pub fn locate(line: &'a str, header: &'a Header) -> Result<Self, Skip> {
        let last = header.min_columns.saturating_sub(1);

        if line.split('\t').nth(last).is_none() {
            return Err(Skip::TooFewColumns);
        }

        let column = |i| line.split('\t').nth(i);

        let chromosome = column(header.chromosome).ok_or(Skip::TooFewColumns)?;
        let position = column(header.position)
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|&position| position > 0)
            .ok_or(Skip::InvalidPosition)?;

        Ok(Self {
            header,
            line,
            chromosome,
            position,
        })
    }

    fn column(&self, i: usize) -> Option<&'a str> {
        self.line.split('\t').nth(i)
    }

    fn optional_column(&self, i: Option<usize>) -> Option<&'a str> {
        i.and_then(|i| self.column(i))
            .filter(|s| !s.is_empty() && *s != ".")
    }

    /// Returns the alternate alleles; empty if the column is missing.
    pub fn alternates(&self) -> Vec<&'a str> {
        self.optional_column(Some(self.header.alternates))
            .map(|s| s.split(',').map(str::trim).collect())
            .unwrap_or_default()
    }

    pub fn filter(&self) -> Option<&'a str> {
        self.optional_column(self.header.filter)
    }

    /// Returns the `GT` value of the sample, or `.` if not present.
    pub fn genotype(&self) -> &'a str {
        let format = self.header.format.and_then(|i| self.column(i));
        let sample = self.header.sample.and_then(|i| self.column(i));

        let (Some(format), Some(sample)) = (format, sample) else {
            return ".";
        };

        format
            .split(':')
            .position(|key| key == "GT")
            .and_then(|i| sample.split(':').nth(i))
            .unwrap_or(".")
    }

    pub fn quality(&self) -> Option<f64> {
        let s = self.optional_column(self.header.quality)?;

        match s.parse() {
            Ok(quality) => Some(quality),
            Err(_) => {
                log::trace!("Ignoring invalid quality '{s}'.");
                None
            }
        }
    }

    pub fn reference(&self) -> &'a str {
        self.column(self.header.reference).unwrap_or_default()
    }

    /// Returns true if any column used for a call contains a replacement character.
    ///
    /// Lines are decoded lossily, so invalid UTF-8 shows up as replacement characters.
    pub fn has_replacement_character(&self) -> bool {
        let header = self.header;

        [
            Some(header.chromosome),
            Some(header.reference),
            Some(header.alternates),
            header.quality,
            header.filter,
            header.format,
            header.sample,
        ]
        .into_iter()
        .flatten()
        .filter_map(|i| self.column(i))
        .any(|s| s.contains(char::REPLACEMENT_CHARACTER))
    }
}
