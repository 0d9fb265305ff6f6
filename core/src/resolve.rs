//! Resolution of variant identifiers to genomic coordinates.
//!
//! Coordinates are looked up in a [`Cache`] before falling back to a [`Fetch`] source. Newly
//! fetched coordinates are written back to the cache, so that a subsequent run can avoid the
//! fetch. The extractor itself only ever sees the resulting [`Resolutions`].

use std::{io, path::PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::Locus;

pub mod cache;
pub use cache::{Cache, JsonCache};

pub mod ncbi;
pub use ncbi::VariationServices;

pub mod refsnp;
pub use refsnp::ParseResolutionError;

/// Identifiers known never to resolve to a single VCF position, with the reason why.
pub const UNRESOLVABLE: [(&str, &str); 2] = [
    (
        "Null",
        "GSTM1 gene deletion: no rsID exists, requires CNV/deletion genotyping",
    ),
    (
        "rs28363170",
        "DAT1 VNTR: insertion/deletion repeat, not a point variant, absent from standard VCF",
    ),
];

/// The coordinates of a variant identifier, if resolved.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Resolution {
    /// The variant identifier.
    pub identifier: String,
    /// The chromosome, e.g. `chr7`.
    pub chromosome: Option<String>,
    /// The 1-based position.
    pub position: Option<u64>,
    /// The reference allele.
    pub reference: Option<String>,
    /// The alternate alleles. Empty if none are known.
    #[serde(default)]
    pub alternates: Vec<String>,
    /// The sequence accession of the placement, e.g. `NC_000007.14`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accession: Option<String>,
    /// Whether the identifier was resolved.
    pub resolved: bool,
    /// A note on why resolution failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Resolution {
    /// Returns the locus of the resolution, if resolved with both chromosome and position.
    pub fn locus(&self) -> Option<Locus> {
        match (self.resolved, &self.chromosome, self.position) {
            (true, Some(chromosome), Some(position)) => {
                Some(Locus::new(chromosome.clone(), position))
            }
            _ => None,
        }
    }

    /// Creates a resolved resolution.
    pub fn resolved<S>(identifier: S, locus: Locus, reference: S, alternates: Vec<String>) -> Self
    where
        S: ToString,
    {
        Self {
            identifier: identifier.to_string(),
            chromosome: Some(locus.chromosome),
            position: Some(locus.position),
            reference: Some(reference.to_string()),
            alternates,
            accession: None,
            resolved: true,
            note: None,
        }
    }

    /// Creates an unresolved resolution with a note on why it failed.
    pub fn unresolved<S, T>(identifier: S, note: T) -> Self
    where
        S: ToString,
        T: ToString,
    {
        Self {
            identifier: identifier.to_string(),
            chromosome: None,
            position: None,
            reference: None,
            alternates: Vec::new(),
            accession: None,
            resolved: false,
            note: Some(note.to_string()),
        }
    }
}

/// A table of resolutions keyed by identifier.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Resolutions(IndexMap<String, Resolution>);

impl Resolutions {
    /// Returns the resolution of an identifier, if any.
    pub fn get(&self, identifier: &str) -> Option<&Resolution> {
        self.0.get(identifier)
    }

    /// Inserts a resolution, replacing any existing resolution of the same identifier.
    pub fn insert(&mut self, resolution: Resolution) {
        self.0.insert(resolution.identifier.clone(), resolution);
    }

    /// Returns true if the table contains no resolutions.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the resolutions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Resolution> {
        self.0.values()
    }

    /// Returns the number of resolutions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the number of resolved identifiers.
    pub fn resolved_count(&self) -> usize {
        self.iter().filter(|resolution| resolution.locus().is_some()).count()
    }
}

impl FromIterator<Resolution> for Resolutions {
    fn from_iter<I>(resolutions: I) -> Self
    where
        I: IntoIterator<Item = Resolution>,
    {
        let mut table = Self::default();
        resolutions.into_iter().for_each(|r| table.insert(r));
        table
    }
}

/// A source of resolutions.
pub trait Fetch {
    /// Fetches the resolution of an identifier.
    ///
    /// Returns `Ok(None)` if the source has no record of the identifier.
    fn fetch(&mut self, identifier: &str) -> io::Result<Option<Resolution>>;
}

/// A directory of refSNP JSON records as served by the NCBI Variation Services.
///
/// The record of `rs123` is read from either `123.json` or `rs123.json`.
#[derive(Clone, Debug)]
pub struct RefSnpDir {
    dir: PathBuf,
}

impl RefSnpDir {
    /// Creates a new source reading from the provided directory.
    pub fn new<P>(dir: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self { dir: dir.into() }
    }
}

impl Fetch for RefSnpDir {
    fn fetch(&mut self, identifier: &str) -> io::Result<Option<Resolution>> {
        let number = identifier.strip_prefix("rs").unwrap_or(identifier);

        let Some(path) = [format!("{number}.json"), format!("{identifier}.json")]
            .into_iter()
            .map(|name| self.dir.join(name))
            .find(|path| path.is_file())
        else {
            return Ok(None);
        };

        let s = std::fs::read_to_string(&path)?;

        refsnp::parse(identifier, &s)
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// A resolver of variant identifiers.
pub struct Resolver<C> {
    cache: C,
    fetcher: Option<Box<dyn Fetch>>,
}

impl<C> Resolver<C>
where
    C: Cache,
{
    /// Consumes the resolver, returning the cache.
    pub fn into_cache(self) -> C {
        self.cache
    }

    /// Creates a new resolver backed only by a cache.
    pub fn new(cache: C) -> Self {
        Self {
            cache,
            fetcher: None,
        }
    }

    /// Resolves identifiers.
    ///
    /// Identifiers in [`UNRESOLVABLE`] and identifiers not of the form `rs<digits>` cannot be
    /// resolved. Otherwise, the cache is
    /// consulted first, and identifiers not in the cache are fetched, if a fetcher is set. Fetch
    /// failures are logged and result in an unresolved identifier.
    pub fn resolve<'a, I>(&mut self, identifiers: I) -> Resolutions
    where
        I: IntoIterator<Item = &'a str>,
    {
        let resolutions = identifiers
            .into_iter()
            .map(|identifier| self.resolve_one(identifier.trim()))
            .collect::<Resolutions>();

        log::info!(
            "Resolved {}/{} identifiers to genomic positions.",
            resolutions.resolved_count(),
            resolutions.len()
        );

        resolutions
    }

    fn resolve_one(&mut self, identifier: &str) -> Resolution {
        if let Some((_, note)) = UNRESOLVABLE.iter().find(|(known, _)| *known == identifier) {
            log::debug!("Identifier '{identifier}' is known to be unresolvable: {note}.");

            return Resolution::unresolved(identifier, note);
        }

        if !is_rsid(identifier) {
            log::warn!("Cannot resolve non-standard identifier '{identifier}'.");

            return Resolution::unresolved(identifier, "not a dbSNP rsID");
        }

        if let Some(resolution) = self.cache.get(identifier) {
            log::trace!("Found '{identifier}' in cache.");

            return resolution.clone();
        }

        let Some(fetcher) = self.fetcher.as_mut() else {
            log::warn!("Identifier '{identifier}' not in cache and no source to fetch from.");

            return Resolution::unresolved(identifier, "not in cache");
        };

        match fetcher.fetch(identifier) {
            Ok(Some(resolution)) => {
                log::debug!("Fetched '{identifier}'.");

                self.cache.insert(resolution.clone());
                resolution
            }
            Ok(None) => {
                log::warn!("Identifier '{identifier}' not found.");

                Resolution::unresolved(identifier, "not found")
            }
            Err(e) => {
                log::warn!("Failed to fetch '{identifier}': {e}");

                Resolution::unresolved(identifier, e)
            }
        }
    }

    /// Sets a source to fetch identifiers not found in the cache.
    pub fn set_fetcher<F>(mut self, fetcher: F) -> Self
    where
        F: 'static + Fetch,
    {
        self.fetcher = Some(Box::new(fetcher));
        self
    }
}

fn is_rsid(identifier: &str) -> bool {
    identifier
        .strip_prefix("rs")
        .map(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}
