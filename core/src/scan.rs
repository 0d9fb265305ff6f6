//! Streaming scan of VCF records against a position index.
//!
//! The scan reads the input one line at a time, so that memory usage is bounded by the size of
//! the index, not the size of the input. Each data line is first tested for membership of its
//! locus in the set of loci not yet observed, and only lines at a target locus are parsed further.

use std::{borrow::Cow, collections::HashSet, fmt, io};

use indexmap::IndexMap;

use crate::{
    call::{Call, Provenance},
    genotype::{self, DecodeError},
    Locus, PositionIndex,
};

mod header;
pub use header::{Header, ParseHeaderError};

mod record;
use record::Record;

/// Number of lines between progress messages.
const PROGRESS_INTERVAL: u64 = 1_000_000;

/// The outcome of a scan.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scan {
    /// Calls for targets at observed loci, keyed by identifier, in order of observation.
    pub calls: IndexMap<String, Call>,
    /// The loci that were observed.
    pub observed: HashSet<Locus>,
    /// The number of lines read.
    pub lines: u64,
    /// The number of data lines skipped as malformed.
    pub skipped: u64,
}

/// A scanner of VCF records.
#[derive(Debug)]
pub struct Scanner<'a> {
    index: &'a PositionIndex,
    live: HashSet<&'a Locus>,
    key: Locus,
    header: Option<Header>,
    warnings: Warnings,
    stop_early: bool,
}

impl<'a> Scanner<'a> {
    /// Creates a new scanner over the loci of an index.
    pub fn new(index: &'a PositionIndex) -> Self {
        Self {
            index,
            live: index.loci().collect(),
            key: Locus::default(),
            header: None,
            warnings: Warnings::default(),
            stop_early: true,
        }
    }

    /// Scans a VCF from a reader.
    ///
    /// The first line at a target locus decides the call for all targets at that locus; later
    /// lines at the same locus are ignored. Unless disabled, scanning stops once all target loci
    /// have been observed.
    pub fn scan<R>(mut self, reader: &mut R) -> Result<Scan, ScanError>
    where
        R: io::BufRead,
    {
        log::info!("Scanning for {} target loci.", self.live.len());

        let mut scan = Scan::default();
        let mut buf = Vec::new();

        loop {
            if self.live.is_empty() && self.stop_early && self.header.is_some() {
                log::debug!("All target loci observed after {} lines.", scan.lines);
                break;
            }

            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }

            scan.lines += 1;
            let mut line = buf.as_slice();
            while let [rest @ .., b'\n' | b'\r'] = line {
                line = rest;
            }

            self.read_line(line, scan.lines, &mut scan)?;

            if scan.lines % PROGRESS_INTERVAL == 0 {
                log::info!(
                    "Scanned {} lines, observed {} target loci.",
                    scan.lines,
                    scan.observed.len()
                );
            }
        }

        self.warnings.summarize();
        scan.skipped = self.warnings.total();

        log::info!(
            "Scan complete: observed {}/{} target loci in {} lines.",
            scan.observed.len(),
            scan.observed.len() + self.live.len(),
            scan.lines
        );

        Ok(scan)
    }

    fn read_line(&mut self, bytes: &[u8], number: u64, scan: &mut Scan) -> Result<(), ScanError> {
        if bytes.starts_with(b"##") {
            return Ok(());
        }

        let line = String::from_utf8_lossy(bytes);
        let lossy = matches!(line, Cow::Owned(_));

        if line.starts_with('#') {
            return match self.header {
                Some(_) => Err(ScanError::DuplicateHeader { line: number }),
                None => {
                    let header = Header::from_line(&line)
                        .map_err(|e| ScanError::InvalidHeader { line: number, source: e })?;

                    log::debug!("Parsed header on line {number}: {header:?}");

                    if !header.has_sample() {
                        log::warn!("No sample column in header, genotypes will be missing.");
                    }

                    self.header = Some(header);
                    Ok(())
                }
            };
        }

        if line.is_empty() {
            return Ok(());
        }

        let Some(header) = self.header.as_ref() else {
            return Err(ScanError::MissingHeader { line: number });
        };

        let record = match Record::locate(&line, header) {
            Ok(record) => record,
            Err(skip) => {
                self.warnings.warn_once(skip, number);
                return Ok(());
            }
        };

        self.key.set(record.chromosome, record.position);

        if !self.live.contains(&self.key) {
            return Ok(());
        }

        if lossy && record.has_replacement_character() {
            self.warnings.warn_once(Skip::InvalidUtf8, number);
            return Ok(());
        }

        self.live.remove(&self.key);

        let Some(targets) = self.index.get(&self.key) else {
            return Ok(());
        };

        let reference = record.reference();
        let alternates = record.alternates();
        let raw = record.genotype();

        let decoded = genotype::decode(raw, reference, alternates.as_slice()).map_err(|e| {
            ScanError::Decode {
                line: number,
                locus: self.key.clone(),
                source: e,
            }
        })?;

        log::debug!(
            "Found target locus {} on line {number} with genotype '{raw}' ({}).",
            self.key,
            decoded.zygosity
        );

        let quality = record.quality();
        let filter = record.filter().map(String::from);

        for target in targets {
            let call = Call {
                identifier: target.identifier.clone(),
                gene: target.gene.clone(),
                category: target.category.clone(),
                chromosome: self.key.chromosome.clone(),
                position: self.key.position,
                reference: Some(reference.to_string()),
                alternates: alternates.iter().map(|s| s.to_string()).collect(),
                raw: raw.to_string(),
                genotype: decoded.genotype.clone(),
                zygosity: decoded.zygosity,
                quality,
                filter: filter.clone(),
                provenance: Provenance::Observed,
            };

            scan.calls.insert(call.identifier.clone(), call);
        }

        scan.observed.insert(self.key.clone());

        Ok(())
    }

    /// Sets whether to stop scanning once all target loci have been observed.
    ///
    /// Enabled by default.
    pub fn set_stop_early(mut self, stop_early: bool) -> Self {
        self.stop_early = stop_early;
        self
    }
}

/// A reason for skipping a data line.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum Skip {
    /// The line has fewer columns than required by the header.
    TooFewColumns = 0,
    /// The position could not be parsed as a positive integer.
    InvalidPosition = 1,
    /// A column used for a call at a target locus is not valid UTF-8.
    InvalidUtf8 = 2,
}

impl Skip {
    const N: usize = 3;
    const VARIANTS: [Skip; Self::N] = [
        Self::TooFewColumns,
        Self::InvalidPosition,
        Self::InvalidUtf8,
    ];

    /// Returns a description of the reason for skipping.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::TooFewColumns => "too few columns",
            Self::InvalidPosition => "invalid position",
            Self::InvalidUtf8 => "invalid UTF-8",
        }
    }
}

#[derive(Clone, Debug, Default)]
struct Warnings {
    counts: [u64; Skip::N],
}

impl Warnings {
    fn count(&self, skip: Skip) -> u64 {
        self.counts[skip as u8 as usize]
    }

    fn summarize(&self) {
        for skip in Skip::VARIANTS {
            let count = self.count(skip);

            if count > 0 {
                let reason = skip.reason();

                log::warn!("Skipped {count} lines due to {reason}.");
            }
        }
    }

    fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    fn warn_once(&mut self, skip: Skip, line: u64) {
        if self.count(skip) == 0 {
            let reason = skip.reason();

            log::warn!(
                "Skipping line {line} due to {reason}. \
                This warning will be shown only once, with a summary at the end."
            );
        }

        self.counts[skip as u8 as usize] += 1;
    }
}

/// An error associated with scanning.
#[derive(Debug)]
pub enum ScanError {
    /// The input could not be read.
    Io(io::Error),
    /// A data line was encountered before the header line.
    MissingHeader {
        /// The line number.
        line: u64,
    },
    /// A second header line was encountered.
    DuplicateHeader {
        /// The line number.
        line: u64,
    },
    /// The header line could not be parsed.
    InvalidHeader {
        /// The line number.
        line: u64,
        /// The underlying error.
        source: ParseHeaderError,
    },
    /// A genotype at a target locus could not be decoded.
    Decode {
        /// The line number.
        line: u64,
        /// The locus of the record.
        locus: Locus,
        /// The underlying error.
        source: DecodeError,
    },
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::Io(_) => f.write_str("failed to read input"),
            ScanError::MissingHeader { line } => {
                write!(f, "data line {line} encountered before header line")
            }
            ScanError::DuplicateHeader { line } => {
                write!(f, "unexpected second header line on line {line}")
            }
            ScanError::InvalidHeader { line, .. } => {
                write!(f, "invalid header on line {line}")
            }
            ScanError::Decode { line, locus, .. } => {
                write!(f, "failed to decode genotype at {locus} on line {line}")
            }
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScanError::Io(e) => Some(e),
            ScanError::InvalidHeader { source, .. } => Some(source),
            ScanError::Decode { source, .. } => Some(source),
            ScanError::MissingHeader { .. } | ScanError::DuplicateHeader { .. } => None,
        }
    }
}

impl From<io::Error> for ScanError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{genotype::Zygosity, index::Target};

    const HEADER: &str = "##fileformat=VCFv4.2
##contig=<ID=chr1>
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE
";

    fn target(identifier: &str, reference: &str) -> Target {
        Target {
            identifier: identifier.to_string(),
            reference: Some(reference.to_string()),
            gene: String::from("GENE"),
            category: String::from("Category"),
        }
    }

    fn index(targets: &[(&str, u64, &str)]) -> PositionIndex {
        let mut index = PositionIndex::default();

        for (chromosome, position, identifier) in targets {
            index.insert(
                Locus::new(*chromosome, *position),
                target(identifier, "A"),
            );
        }

        index
    }

    fn scan(vcf: &str, index: &PositionIndex) -> Result<Scan, ScanError> {
        Scanner::new(index).scan(&mut vcf.as_bytes())
    }

    #[test]
    fn test_scan_finds_targets() -> Result<(), Box<dyn std::error::Error>> {
        let vcf = format!(
            "{HEADER}chr1\t100\t.\tA\tG\t50\tPASS\t.\tGT:DP\t0/1:30
chr1\t150\t.\tC\tT\t.\t.\t.\tGT\t1/1
chr2\t200\t.\tG\tA,T\t12.5\tLowQual\t.\tDP:GT\t10:1|2
"
        );

        let index = index(&[("chr1", 100, "rs1"), ("chr2", 200, "rs2"), ("chr3", 1, "rs3")]);
        let scan = scan(&vcf, &index)?;

        assert_eq!(scan.calls.len(), 2);
        assert_eq!(scan.lines, 6);

        let rs1 = &scan.calls["rs1"];
        assert_eq!(rs1.genotype, "AG");
        assert_eq!(rs1.zygosity, Zygosity::Heterozygous);
        assert_eq!(rs1.raw, "0/1");
        assert_eq!(rs1.quality, Some(50.0));
        assert_eq!(rs1.filter.as_deref(), Some("PASS"));
        assert!(rs1.provenance.is_found());

        let rs2 = &scan.calls["rs2"];
        assert_eq!(rs2.genotype, "AT");
        assert_eq!(rs2.alternates, vec!["A", "T"]);
        assert_eq!(rs2.reference.as_deref(), Some("G"));
        assert_eq!(rs2.quality, Some(12.5));
        assert_eq!(rs2.filter.as_deref(), Some("LowQual"));

        assert!(scan.observed.contains(&Locus::new("chr1", 100)));
        assert!(!scan.observed.contains(&Locus::new("chr3", 1)));

        Ok(())
    }

    #[test]
    fn test_scan_fans_out_shared_locus() -> Result<(), Box<dyn std::error::Error>> {
        let vcf = format!("{HEADER}chr1\t100\t.\tA\tG\t50\tPASS\t.\tGT\t1/1\n");

        let index = index(&[("chr1", 100, "rs1"), ("chr1", 100, "rs1b")]);
        let scan = scan(&vcf, &index)?;

        let (a, b) = (&scan.calls["rs1"], &scan.calls["rs1b"]);
        assert_eq!(a.identifier, "rs1");
        assert_eq!(b.identifier, "rs1b");
        assert_eq!(a.genotype, b.genotype);
        assert_eq!(a.zygosity, b.zygosity);
        assert_eq!(a.reference, b.reference);
        assert_eq!(a.alternates, b.alternates);
        assert_eq!(scan.observed.len(), 1);

        Ok(())
    }

    #[test]
    fn test_scan_first_line_at_locus_wins() -> Result<(), Box<dyn std::error::Error>> {
        let vcf = format!(
            "{HEADER}chr1\t100\t.\tA\tG\t50\tPASS\t.\tGT\t0/1
chr1\t100\t.\tA\tT\t50\tPASS\t.\tGT\t1/1
"
        );

        let index = index(&[("chr1", 100, "rs1")]);
        let scan = Scanner::new(&index)
            .set_stop_early(false)
            .scan(&mut vcf.as_bytes())?;

        assert_eq!(scan.calls["rs1"].genotype, "AG");
        assert_eq!(scan.lines, 5);

        Ok(())
    }

    #[test]
    fn test_scan_stops_early() -> Result<(), Box<dyn std::error::Error>> {
        let vcf = format!(
            "{HEADER}chr1\t100\t.\tA\tG\t50\tPASS\t.\tGT\t0/1
chr1\t200\t.\tA\tG\t50\tPASS\t.\tGT\t0/1
chr1\t300\t.\tA\tG\t50\tPASS\t.\tGT\t0/1
"
        );

        let index = index(&[("chr1", 100, "rs1")]);

        assert_eq!(scan(&vcf, &index)?.lines, 4);

        let scan = Scanner::new(&index)
            .set_stop_early(false)
            .scan(&mut vcf.as_bytes())?;
        assert_eq!(scan.lines, 6);

        Ok(())
    }

    #[test]
    fn test_scan_skips_malformed_lines() -> Result<(), Box<dyn std::error::Error>> {
        let vcf = format!(
            "{HEADER}chr1\tabc\t.\tA\tG\t50\tPASS\t.\tGT\t0/1
chr1\t100
chr1\t-5\t.\tA\tG\t50\tPASS\t.\tGT\t0/1

chr1\t100\t.\tA\tG\t50\tPASS\t.\tGT\t0/0
"
        );

        let index = index(&[("chr1", 100, "rs1")]);
        let scan = scan(&vcf, &index)?;

        assert_eq!(scan.skipped, 3);
        assert_eq!(scan.calls["rs1"].zygosity, Zygosity::HomozygousReference);
        assert_eq!(scan.calls["rs1"].genotype, "AA");

        Ok(())
    }

    #[test]
    fn test_scan_invalid_utf8_outside_call_columns() -> Result<(), Box<dyn std::error::Error>> {
        let mut vcf = HEADER.as_bytes().to_vec();
        vcf.extend_from_slice(b"chr1\t50\t.\tA\tG\t50\tPASS\tNOTE=caf\xe9\tGT\t0/1\n");
        vcf.extend_from_slice(b"chr1\t100\t.\tA\tG\t50\tPASS\tNOTE=caf\xe9\tGT\t0/0\n");

        let index = index(&[("chr1", 100, "rs1")]);
        let scan = Scanner::new(&index).scan(&mut vcf.as_slice())?;

        assert_eq!(scan.skipped, 0);
        assert_eq!(scan.calls["rs1"].genotype, "AA");
        assert_eq!(scan.calls["rs1"].zygosity, Zygosity::HomozygousReference);

        Ok(())
    }

    #[test]
    fn test_scan_skips_invalid_utf8_at_target() -> Result<(), Box<dyn std::error::Error>> {
        let mut vcf = HEADER.as_bytes().to_vec();
        vcf.extend_from_slice(b"chr1\t100\t.\tA\t\xff\t50\tPASS\t.\tGT\t0/1\n");
        vcf.extend_from_slice(b"chr1\t200\t.\tA\tG\t50\tPASS\t.\tGT\t1/1\n");

        let index = index(&[("chr1", 100, "rs1"), ("chr1", 200, "rs2")]);
        let scan = Scanner::new(&index).scan(&mut vcf.as_slice())?;

        assert_eq!(scan.skipped, 1);
        assert!(!scan.calls.contains_key("rs1"));
        assert!(!scan.observed.contains(&Locus::new("chr1", 100)));
        assert_eq!(scan.calls["rs2"].genotype, "GG");

        Ok(())
    }

    #[test]
    fn test_scan_missing_alternate_is_unknown() -> Result<(), Box<dyn std::error::Error>> {
        let vcf = format!("{HEADER}chr1\t100\t.\tA\t.\t50\tPASS\t.\tGT\t0/1\n");

        let index = index(&[("chr1", 100, "rs1")]);
        let scan = scan(&vcf, &index)?;

        let rs1 = &scan.calls["rs1"];
        assert!(rs1.alternates.is_empty());
        assert_eq!(rs1.genotype, "A?");
        assert_eq!(rs1.zygosity, Zygosity::Heterozygous);

        Ok(())
    }

    #[test]
    fn test_scan_missing_genotype() -> Result<(), Box<dyn std::error::Error>> {
        let vcf = format!(
            "{HEADER}chr1\t100\t.\tA\tG\t50\tPASS\t.\tDP\t30
chr1\t200\t.\tA\tG\t50\tPASS\t.\tGT:DP\t./.:0
chr1\t300\t.\tA\tG\t50\tPASS\t.\tGT
"
        );

        let index = index(&[("chr1", 100, "rs1"), ("chr1", 200, "rs2"), ("chr1", 300, "rs3")]);
        let scan = scan(&vcf, &index)?;

        for identifier in ["rs1", "rs2", "rs3"] {
            let call = &scan.calls[identifier];
            assert_eq!(call.genotype, genotype::NOT_AVAILABLE);
            assert_eq!(call.zygosity, Zygosity::Missing);
            assert!(call.provenance.is_found());
        }

        Ok(())
    }

    #[test]
    fn test_scan_sites_only() -> Result<(), Box<dyn std::error::Error>> {
        let vcf = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO
chr1\t100\t.\tA\tG\t.\t.\t.
";

        let index = index(&[("chr1", 100, "rs1")]);
        let scan = scan(vcf, &index)?;

        assert_eq!(scan.calls["rs1"].zygosity, Zygosity::Missing);
        assert_eq!(scan.calls["rs1"].quality, None);
        assert_eq!(scan.calls["rs1"].filter, None);

        Ok(())
    }

    #[test]
    fn test_scan_decode_error_is_fatal() {
        let vcf = format!("{HEADER}chr1\t100\t.\tA\tG\t50\tPASS\t.\tGT\t0/x\n");

        let index = index(&[("chr1", 100, "rs1")]);
        let result = scan(&vcf, &index);

        assert!(matches!(
            result,
            Err(ScanError::Decode { line: 4, .. })
        ));
    }

    #[test]
    fn test_scan_decode_error_outside_targets_is_ignored() -> Result<(), ScanError> {
        let vcf = format!("{HEADER}chr1\t100\t.\tA\tG\t50\tPASS\t.\tGT\t0/x\n");

        let index = index(&[("chr1", 200, "rs1")]);

        assert!(scan(&vcf, &index)?.calls.is_empty());

        Ok(())
    }

    #[test]
    fn test_scan_header_errors() {
        let index = index(&[("chr1", 100, "rs1")]);

        assert!(matches!(
            scan("chr1\t100\t.\tA\tG\t50\tPASS\t.\tGT\t0/1\n", &index),
            Err(ScanError::MissingHeader { line: 1 })
        ));

        let vcf = format!("{HEADER}{HEADER}");
        assert!(matches!(
            scan(&vcf, &index),
            Err(ScanError::DuplicateHeader { line: 6 })
        ));

        assert!(matches!(
            scan("#CHROM\tID\tREF\tALT\n", &index),
            Err(ScanError::InvalidHeader { line: 1, .. })
        ));
    }

    #[test]
    fn test_scan_empty_index() -> Result<(), ScanError> {
        let vcf = format!("{HEADER}chr1\t100\t.\tA\tG\t50\tPASS\t.\tGT\t0/1\n");

        let scan = scan(&vcf, &PositionIndex::default())?;

        assert!(scan.calls.is_empty());
        assert_eq!(scan.lines, 3);

        Ok(())
    }
}
