//! Extraction of calls for every target in an index.

use std::io;

use indexmap::IndexMap;

use crate::{
    call::Call,
    reconcile::reconcile,
    scan::{ScanError, Scanner},
    PositionIndex,
};

/// The calls for all targets of an index, with summary counts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Extraction {
    /// Calls keyed by identifier, in index order.
    pub calls: IndexMap<String, Call>,
    /// The number of lines read.
    pub lines: u64,
    /// The number of data lines skipped as malformed.
    pub skipped: u64,
    /// The number of target loci observed in the input.
    pub observed_loci: usize,
    /// The total number of target loci.
    pub total_loci: usize,
}

impl Extraction {
    /// Returns the number of calls found in the input.
    pub fn number_found(&self) -> usize {
        self.calls
            .values()
            .filter(|call| call.provenance.is_found())
            .count()
    }

    /// Returns the number of calls inferred from absence.
    pub fn number_inferred(&self) -> usize {
        self.calls
            .values()
            .filter(|call| call.provenance.is_inferred())
            .count()
    }
}

/// Extracts a call for every target in the index from a VCF.
///
/// Targets at loci observed in the input get the call decoded from the first record at the
/// locus, and all other targets get an inferred homozygous reference call. The resulting calls are
/// ordered as the targets in the index, so that the output does not depend on the input order.
pub fn extract<R>(reader: &mut R, index: &PositionIndex) -> Result<Extraction, ScanError>
where
    R: io::BufRead,
{
    let mut scan = Scanner::new(index).scan(reader)?;

    let unobserved = index.loci().filter(|locus| !scan.observed.contains(*locus));
    let mut inferred = reconcile(index, unobserved)
        .into_iter()
        .map(|call| (call.identifier.clone(), call))
        .collect::<IndexMap<_, _>>();

    let mut calls = IndexMap::with_capacity(index.number_of_targets());
    for (_, targets) in index.iter() {
        for target in targets {
            let identifier = target.identifier.as_str();

            let call = scan
                .calls
                .swap_remove(identifier)
                .or_else(|| inferred.swap_remove(identifier));

            if let Some(call) = call {
                calls.insert(call.identifier.clone(), call);
            }
        }
    }

    let extraction = Extraction {
        calls,
        lines: scan.lines,
        skipped: scan.skipped,
        observed_loci: scan.observed.len(),
        total_loci: index.len(),
    };

    log::info!(
        "Extracted {} calls: {} found, {} inferred.",
        extraction.calls.len(),
        extraction.number_found(),
        extraction.number_inferred()
    );

    Ok(extraction)
}
