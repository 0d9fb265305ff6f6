#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Tools for extracting genotypes at a panel of known variants from a single-sample VCF.
//!
//! This serves as the core library implementation for the `panelcall` CLI, but can also be used
//! as a free-standing library.
//!
//! # Overview
//!
//! A [`Catalog`] lists the variant identifiers of interest. Identifiers are resolved to genomic
//! coordinates by a [`Resolver`], and the resolved targets are grouped by locus in a
//! [`PositionIndex`]. A single streaming pass over the VCF then decodes a [`Call`] for every target
//! at an observed locus, and every target at an unobserved locus is inferred to be homozygous for
//! the reference allele.
//!
//! # Example
//!
//! ```
//! use panelcall_core::{
//!     catalog::Row, extract, genotype::Zygosity, resolve::Resolution, Locus, PositionIndex,
//! };
//!
//! let rows = [
//!     Row::new("Metabolism", "MTHFR", "rs1801133", "C677T"),
//!     Row::new("Carrier", "CFTR", "rs113993960", "F508del"),
//! ];
//! let resolutions = [
//!     Resolution::resolved("rs1801133", Locus::new("chr1", 11796321), "G", vec!["A".into()]),
//!     Resolution::resolved("rs113993960", Locus::new("chr7", 117559590), "ATCT", vec!["A".into()]),
//! ];
//!
//! let index = PositionIndex::build(&rows, &resolutions.into_iter().collect());
//!
//! let vcf = "##fileformat=VCFv4.2
//! #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE
//! chr1\t11796321\t.\tG\tA\t50\tPASS\t.\tGT\t0/1
//! ";
//!
//! let extraction = extract(&mut vcf.as_bytes(), &index)?;
//!
//! assert_eq!(extraction.calls["rs1801133"].genotype, "GA");
//! assert_eq!(extraction.calls["rs1801133"].zygosity, Zygosity::Heterozygous);
//! assert!(extraction.calls["rs113993960"].provenance.is_inferred());
//! # Ok::<(), panelcall_core::scan::ScanError>(())
//! ```

pub mod call;
pub use call::Call;

pub mod catalog;
pub use catalog::Catalog;

pub mod extract;
pub use extract::{extract, Extraction};

pub mod genotype;

pub mod index;
pub use index::{Locus, PositionIndex};

pub mod input;
pub use input::Input;

pub mod output;

pub mod reconcile;
pub use reconcile::reconcile;

pub mod resolve;
pub use resolve::{Resolution, Resolutions, Resolver};

pub mod scan;
pub use scan::{ScanError, Scanner};
