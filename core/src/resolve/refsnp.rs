//! Parsing of refSNP JSON records.
//!
//! The NCBI Variation Services serve each rsID as a JSON record, with the placements of the
//! variant on RefSeq sequences under `primary_snapshot_data.placements_with_allele`. Each
//! placement lists its alleles in SPDI notation, the first allele being the reference.

use std::fmt;

use serde::Deserialize;

use crate::Locus;

use super::Resolution;

/// RefSeq accessions of the GRCh38 primary assembly chromosomes.
const GRCH38: [(&str, &str); 24] = [
    ("NC_000001.11", "1"),
    ("NC_000002.12", "2"),
    ("NC_000003.12", "3"),
    ("NC_000004.12", "4"),
    ("NC_000005.10", "5"),
    ("NC_000006.12", "6"),
    ("NC_000007.14", "7"),
    ("NC_000008.11", "8"),
    ("NC_000009.12", "9"),
    ("NC_000010.11", "10"),
    ("NC_000011.10", "11"),
    ("NC_000012.12", "12"),
    ("NC_000013.11", "13"),
    ("NC_000014.9", "14"),
    ("NC_000015.10", "15"),
    ("NC_000016.10", "16"),
    ("NC_000017.11", "17"),
    ("NC_000018.10", "18"),
    ("NC_000019.10", "19"),
    ("NC_000020.11", "20"),
    ("NC_000021.9", "21"),
    ("NC_000022.11", "22"),
    ("NC_000023.11", "X"),
    ("NC_000024.10", "Y"),
];

/// RefSeq accessions of the GRCh37 primary assembly chromosomes.
const GRCH37: [(&str, &str); 24] = [
    ("NC_000001.10", "1"),
    ("NC_000002.11", "2"),
    ("NC_000003.11", "3"),
    ("NC_000004.11", "4"),
    ("NC_000005.9", "5"),
    ("NC_000006.11", "6"),
    ("NC_000007.13", "7"),
    ("NC_000008.10", "8"),
    ("NC_000009.11", "9"),
    ("NC_000010.10", "10"),
    ("NC_000011.9", "11"),
    ("NC_000012.11", "12"),
    ("NC_000013.10", "13"),
    ("NC_000014.8", "14"),
    ("NC_000015.9", "15"),
    ("NC_000016.9", "16"),
    ("NC_000017.10", "17"),
    ("NC_000018.9", "18"),
    ("NC_000019.9", "19"),
    ("NC_000020.10", "20"),
    ("NC_000021.8", "21"),
    ("NC_000022.10", "22"),
    ("NC_000023.10", "X"),
    ("NC_000024.9", "Y"),
];

fn lookup(table: &[(&str, &'static str)], accession: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(candidate, _)| *candidate == accession)
        .map(|(_, chromosome)| *chromosome)
}

/// Returns the chromosome name of a RefSeq accession, e.g. `chr7` for `NC_000007.14`.
///
/// Both GRCh38 and GRCh37 accessions are recognised.
pub fn chromosome_of(accession: &str) -> Option<String> {
    lookup(&GRCH38, accession)
        .or_else(|| lookup(&GRCH37, accession))
        .map(|name| format!("chr{name}"))
}

#[derive(Debug, Deserialize)]
struct Record {
    primary_snapshot_data: Option<Snapshot>,
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default)]
    placements_with_allele: Vec<Placement>,
}

#[derive(Debug, Deserialize)]
struct Placement {
    seq_id: String,
    #[serde(default)]
    is_ptlp: bool,
    #[serde(default)]
    alleles: Vec<PlacementAllele>,
}

#[derive(Debug, Deserialize)]
struct PlacementAllele {
    allele: Allele,
}

#[derive(Debug, Deserialize)]
struct Allele {
    spdi: Option<Spdi>,
}

#[derive(Debug, Deserialize)]
struct Spdi {
    position: u64,
    deleted_sequence: String,
    inserted_sequence: String,
}

impl Snapshot {
    /// Returns the placement to use for coordinates, preferring the GRCh38 primary top-level
    /// placement, then any GRCh38 chromosome, then any GRCh37 chromosome.
    fn placement(&self) -> Option<&Placement> {
        let on_grch38 = |p: &&Placement| lookup(&GRCH38, &p.seq_id).is_some();
        let on_grch37 = |p: &&Placement| lookup(&GRCH37, &p.seq_id).is_some();

        let placements = &self.placements_with_allele;

        placements
            .iter()
            .filter(on_grch38)
            .find(|p| p.is_ptlp)
            .or_else(|| placements.iter().find(on_grch38))
            .or_else(|| placements.iter().find(on_grch37))
    }
}

/// Parses a refSNP JSON record into a resolution.
///
/// The position is converted from the 0-based SPDI position to a 1-based position. Alternate
/// alleles are the inserted sequences that differ from the reference, and may be empty.
pub fn parse(identifier: &str, s: &str) -> Result<Resolution, ParseResolutionError> {
    let record: Record = serde_json::from_str(s).map_err(ParseResolutionError::Json)?;

    let placement = record
        .primary_snapshot_data
        .as_ref()
        .and_then(Snapshot::placement)
        .ok_or(ParseResolutionError::NoPlacement)?;

    let chromosome =
        chromosome_of(&placement.seq_id).ok_or(ParseResolutionError::NoPlacement)?;

    let mut spdis = placement
        .alleles
        .iter()
        .map(|allele| allele.allele.spdi.as_ref());

    let reference = spdis
        .next()
        .flatten()
        .ok_or(ParseResolutionError::MissingReference)?;

    let mut alternates: Vec<String> = Vec::new();
    for spdi in spdis.flatten() {
        let inserted = &spdi.inserted_sequence;

        if !inserted.is_empty()
            && *inserted != reference.deleted_sequence
            && !alternates.contains(inserted)
        {
            alternates.push(inserted.clone());
        }
    }

    if alternates.is_empty() {
        log::debug!("No alternate alleles differing from reference for '{identifier}'.");
    }

    let locus = Locus::new(chromosome, reference.position + 1);

    let mut resolution = Resolution::resolved(
        identifier,
        locus,
        reference.deleted_sequence.as_str(),
        alternates,
    );
    resolution.accession = Some(placement.seq_id.clone());

    Ok(resolution)
}

/// An error associated with parsing a refSNP record.
#[derive(Debug)]
pub enum ParseResolutionError {
    /// The record is not valid JSON, or does not have the expected structure.
    Json(serde_json::Error),
    /// The record has no placement on a known chromosome.
    NoPlacement,
    /// The placement has no reference allele.
    MissingReference,
}

impl fmt::Display for ParseResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseResolutionError::Json(_) => f.write_str("malformed refSNP record"),
            ParseResolutionError::NoPlacement => {
                f.write_str("no placement on a known chromosome in refSNP record")
            }
            ParseResolutionError::MissingReference => {
                f.write_str("no reference allele in refSNP placement")
            }
        }
    }
}

impl std::error::Error for ParseResolutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseResolutionError::Json(e) => Some(e),
            ParseResolutionError::NoPlacement | ParseResolutionError::MissingReference => None,
        }
    }
}
