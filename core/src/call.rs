//! Extracted genotype calls.

use serde::{ser::SerializeStruct, Serialize, Serializer};

use crate::{genotype::Zygosity, index::Target, Locus};

/// The genotype used for an inferred call when the reference allele is unknown.
pub const REFERENCE_PAIR: &str = "Ref/Ref";

/// The raw genotype of an inferred call.
pub const INFERRED_RAW: &str = "0/0";

/// How a call was obtained.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Provenance {
    /// The call was read from a record in the input.
    Observed,
    /// No record was found for the locus, and the call was inferred to be homozygous reference.
    Inferred,
}

impl Provenance {
    /// Returns true if the call was found in the input.
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Observed)
    }

    /// Returns true if the call was inferred.
    pub fn is_inferred(&self) -> bool {
        matches!(self, Self::Inferred)
    }
}

impl Serialize for Provenance {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Provenance", 2)?;
        state.serialize_field("found", &self.is_found())?;
        state.serialize_field("inferred", &self.is_inferred())?;
        state.end()
    }
}

/// A genotype call for a single variant identifier.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Call {
    /// The variant identifier.
    pub identifier: String,
    /// The gene the variant is annotated to.
    pub gene: String,
    /// The catalog category of the variant.
    pub category: String,
    /// The chromosome of the call.
    pub chromosome: String,
    /// The 1-based position of the call.
    pub position: u64,
    /// The reference allele, if known.
    pub reference: Option<String>,
    /// The alternate alleles.
    pub alternates: Vec<String>,
    /// The raw genotype, e.g. `0/1`.
    pub raw: String,
    /// The decoded genotype, e.g. `AG`.
    pub genotype: String,
    /// The zygosity of the genotype.
    pub zygosity: Zygosity,
    /// The call quality, if available.
    pub quality: Option<f64>,
    /// The filter status, if available.
    pub filter: Option<String>,
    /// How the call was obtained.
    #[serde(flatten)]
    pub provenance: Provenance,
}

impl Call {
    /// Creates a homozygous reference call for a target at a locus without any record.
    pub fn inferred(locus: &Locus, target: &Target) -> Self {
        let genotype = match target.reference.as_deref() {
            Some(reference) => reference.repeat(2),
            None => REFERENCE_PAIR.to_string(),
        };

        Self {
            identifier: target.identifier.clone(),
            gene: target.gene.clone(),
            category: target.category.clone(),
            chromosome: locus.chromosome.clone(),
            position: locus.position,
            reference: target.reference.clone(),
            alternates: Vec::new(),
            raw: INFERRED_RAW.to_string(),
            genotype,
            zygosity: Zygosity::HomozygousReference,
            quality: None,
            filter: None,
            provenance: Provenance::Inferred,
        }
    }
}
