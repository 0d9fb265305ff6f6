//! Position index of target variants.

use std::{collections::HashSet, fmt};

use indexmap::IndexMap;
use serde::Serialize;

use crate::{catalog, resolve::Resolutions};

/// A genomic position.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Locus {
    /// The chromosome name.
    pub chromosome: String,
    /// The 1-based position on the chromosome.
    pub position: u64,
}

impl Locus {
    /// Creates a new locus.
    pub fn new<S>(chromosome: S, position: u64) -> Self
    where
        S: Into<String>,
    {
        Self {
            chromosome: chromosome.into(),
            position,
        }
    }

    /// Overwrites the locus in place, reusing the allocation of the chromosome name.
    pub(crate) fn set(&mut self, chromosome: &str, position: u64) {
        self.chromosome.clear();
        self.chromosome.push_str(chromosome);
        self.position = position;
    }
}

impl fmt::Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chromosome, self.position)
    }
}

/// A variant to search for.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Target {
    /// The variant identifier.
    pub identifier: String,
    /// The resolved reference allele, if known.
    pub reference: Option<String>,
    /// The gene the variant is annotated to.
    pub gene: String,
    /// The catalog category of the variant.
    pub category: String,
}

/// A mapping from loci to the targets located there.
///
/// Loci are kept in order of first insertion, as are targets within each locus.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PositionIndex {
    buckets: IndexMap<Locus, Vec<Target>>,
}

impl PositionIndex {
    /// Builds an index from catalog rows and their resolutions.
    ///
    /// Each identifier contributes at most one target: the first row with a given identifier is
    /// used, and later rows are skipped. Identifiers without a resolved locus are skipped.
    pub fn build<'a, I>(rows: I, resolutions: &Resolutions) -> Self
    where
        I: IntoIterator<Item = &'a catalog::Row>,
    {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut index = Self::default();

        for row in rows {
            if !seen.insert(row.identifier.as_str()) {
                continue;
            }

            let Some(resolution) = resolutions.get(&row.identifier) else {
                log::debug!("Skipping '{}' without resolution.", row.identifier);
                continue;
            };

            let Some(locus) = resolution.locus() else {
                log::debug!("Skipping unresolved '{}'.", row.identifier);
                continue;
            };

            index.insert(
                locus,
                Target {
                    identifier: row.identifier.clone(),
                    reference: resolution.reference.clone().filter(|r| !r.is_empty()),
                    gene: row.gene.clone(),
                    category: row.category.clone(),
                },
            );
        }

        log::info!(
            "Built position index with {} targets at {} unique loci.",
            index.number_of_targets(),
            index.len()
        );

        index
    }

    /// Returns the targets at a locus, if any.
    pub fn get(&self, locus: &Locus) -> Option<&[Target]> {
        self.buckets.get(locus).map(Vec::as_slice)
    }

    /// Inserts a target at a locus.
    pub fn insert(&mut self, locus: Locus, target: Target) {
        self.buckets.entry(locus).or_default().push(target);
    }

    /// Returns true if the index contains no loci.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Returns an iterator over the loci and their targets in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&Locus, &[Target])> {
        self.buckets
            .iter()
            .map(|(locus, targets)| (locus, targets.as_slice()))
    }

    /// Returns the number of unique loci in the index.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns an iterator over the loci in index order.
    pub fn loci(&self) -> impl Iterator<Item = &Locus> {
        self.buckets.keys()
    }

    /// Returns the total number of targets in the index.
    pub fn number_of_targets(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}
