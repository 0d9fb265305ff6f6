//! Reconciliation of unobserved target loci.
//!
//! A VCF from discrete-sites calling (as opposed to a gVCF) contains no line at all for a site
//! where the sample is homozygous for the reference allele. For such input, the absence of a target
//! locus is therefore evidence of a homozygous reference genotype, and every target at an
//! unobserved locus is assigned an inferred homozygous reference call.

use crate::{call::Call, Locus, PositionIndex};

/// Creates inferred homozygous reference calls for all targets at the unobserved loci.
///
/// Loci not in the index are ignored. Calls are returned in the order of the unobserved loci, and
/// in index order within each locus.
pub fn reconcile<'a, I>(index: &PositionIndex, unobserved: I) -> Vec<Call>
where
    I: IntoIterator<Item = &'a Locus>,
{
    let calls = unobserved
        .into_iter()
        .filter_map(|locus| index.get(locus).map(|targets| (locus, targets)))
        .flat_map(|(locus, targets)| targets.iter().map(move |target| Call::inferred(locus, target)))
        .collect::<Vec<_>>();

    log::debug!("Inferred {} homozygous reference calls.", calls.len());

    calls
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{genotype::Zygosity, index::Target};

    fn target(identifier: &str, reference: Option<&str>) -> Target {
        Target {
            identifier: identifier.to_string(),
            reference: reference.map(String::from),
            gene: String::from("GENE"),
            category: String::from("Category"),
        }
    }

    #[test]
    fn test_reconcile_unobserved() {
        let mut index = PositionIndex::default();
        index.insert(Locus::new("chr7", 117548628), target("rs1", Some("G")));
        index.insert(Locus::new("chr7", 117548628), target("rs2", None));
        index.insert(Locus::new("chr1", 10), target("rs3", Some("AT")));

        let unobserved = Locus::new("chr7", 117548628);
        let calls = reconcile(&index, [&unobserved]);

        assert_eq!(calls.len(), 2);

        assert_eq!(calls[0].identifier, "rs1");
        assert_eq!(calls[0].genotype, "GG");
        assert_eq!(calls[1].identifier, "rs2");
        assert_eq!(calls[1].genotype, "Ref/Ref");

        for call in calls {
            assert_eq!(call.zygosity, Zygosity::HomozygousReference);
            assert!(call.provenance.is_inferred());
            assert!(!call.provenance.is_found());
            assert_eq!(call.chromosome, "chr7");
            assert_eq!(call.position, 117548628);
        }
    }

    #[test]
    fn test_reconcile_multibase_reference() {
        let mut index = PositionIndex::default();
        index.insert(Locus::new("chr1", 10), target("rs3", Some("AT")));

        let calls = reconcile(&index, index.loci());

        assert_eq!(calls[0].genotype, "ATAT");
    }

    #[test]
    fn test_reconcile_ignores_unknown_loci() {
        let index = PositionIndex::default();

        assert!(reconcile(&index, [&Locus::new("chr1", 1)]).is_empty());
    }
}
