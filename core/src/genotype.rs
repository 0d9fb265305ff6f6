//! Genotype decoding.
//!
//! A raw genotype is the `GT` value of a VCF sample, e.g. `0/1` or `1|1`. Decoding maps the allele
//! indices onto the reference and alternate alleles of the record, and classifies the call by
//! zygosity. Phasing is ignored.

use std::{fmt, num::ParseIntError};

use serde::Serialize;

/// The genotype used when a call is not available.
pub const NOT_AVAILABLE: &str = "N/A";

/// The nucleotide placeholder for an uncalled allele.
pub const UNCALLED: &str = "N";

/// The nucleotide placeholder for an allele index beyond the alternate alleles.
pub const UNKNOWN: &str = "?";

/// A zygosity classification.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Zygosity {
    /// Both alleles are the reference allele.
    HomozygousReference,
    /// Both alleles are the same alternate allele.
    HomozygousAlternate,
    /// The alleles differ.
    Heterozygous,
    /// At least one allele was not called.
    Missing,
    /// Only a single allele is present.
    Hemizygous,
}

impl Zygosity {
    /// Returns a string representation of the zygosity.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HomozygousReference => "homozygous_reference",
            Self::HomozygousAlternate => "homozygous_alternate",
            Self::Heterozygous => "heterozygous",
            Self::Missing => "missing",
            Self::Hemizygous => "hemizygous",
        }
    }

    /// Classifies allele indices by zygosity, where `None` is an uncalled allele.
    ///
    /// Only the first two alleles are considered.
    fn from_indices(indices: &[Option<usize>]) -> Self {
        match indices {
            [] | [_] => Self::Hemizygous,
            [a, b, ..] => match (a, b) {
                (None, _) | (_, None) => Self::Missing,
                (Some(0), Some(0)) => Self::HomozygousReference,
                (Some(a), Some(b)) if a == b => Self::HomozygousAlternate,
                (Some(_), Some(_)) => Self::Heterozygous,
            },
        }
    }
}

impl fmt::Display for Zygosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded genotype.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Decoded {
    /// The genotype as nucleotides, e.g. `AG`, or `A/ATG` when any allele is longer than one base.
    pub genotype: String,
    /// The zygosity of the genotype.
    pub zygosity: Zygosity,
}

impl Decoded {
    fn not_available() -> Self {
        Self {
            genotype: NOT_AVAILABLE.to_string(),
            zygosity: Zygosity::Missing,
        }
    }
}

/// Decodes a raw genotype given the reference and alternate alleles of the record.
///
/// # Examples
///
/// ```
/// use panelcall_core::genotype::{decode, Zygosity};
///
/// let decoded = decode("1/0", "C", &["T"])?;
/// assert_eq!(decoded.genotype, "TC");
/// assert_eq!(decoded.zygosity, Zygosity::Heterozygous);
/// # Ok::<(), panelcall_core::genotype::DecodeError>(())
/// ```
pub fn decode<S>(raw: &str, reference: &str, alternates: &[S]) -> Result<Decoded, DecodeError>
where
    S: AsRef<str>,
{
    if matches!(raw, "" | "." | "./." | ".|.") {
        return Ok(Decoded::not_available());
    }

    let separator = if raw.contains('|') { '|' } else { '/' };

    let indices = raw
        .split(separator)
        .map(parse_allele_index)
        .collect::<Result<Vec<_>, _>>()?;

    let alleles = indices
        .iter()
        .map(|index| match index {
            None => UNCALLED,
            Some(0) => reference,
            Some(i) => alternates.get(i - 1).map(AsRef::as_ref).unwrap_or(UNKNOWN),
        })
        .collect::<Vec<_>>();

    let genotype = if alleles.iter().any(|allele| allele.len() > 1) {
        alleles.join("/")
    } else {
        alleles.concat()
    };

    Ok(Decoded {
        genotype,
        zygosity: Zygosity::from_indices(&indices),
    })
}

fn parse_allele_index(s: &str) -> Result<Option<usize>, DecodeError> {
    if s == "." {
        return Ok(None);
    }

    // usize::from_str would accept a leading '+'
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecodeError::invalid_index(s, None));
    }

    s.parse()
        .map(Some)
        .map_err(|e| DecodeError::invalid_index(s, Some(e)))
}

/// An error associated with decoding a genotype.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DecodeError {
    /// An allele index was neither missing nor a non-negative integer.
    InvalidIndex {
        /// The offending token.
        token: String,
        /// The underlying integer parsing error, if any.
        source: Option<ParseIntError>,
    },
}

impl DecodeError {
    fn invalid_index(token: &str, source: Option<ParseIntError>) -> Self {
        Self::InvalidIndex {
            token: token.to_string(),
            source,
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InvalidIndex { token, .. } => {
                write!(f, "invalid allele index '{token}' in genotype")
            }
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::InvalidIndex { source, .. } => source
                .as_ref()
                .map(|e| e as &(dyn std::error::Error + 'static)),
        }
    }
}
