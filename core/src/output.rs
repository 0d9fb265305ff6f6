//! Writing extracted calls.

use std::{fs, io, path::Path};

use indexmap::IndexMap;

use crate::call::Call;

/// The placeholder written for absent values in the tab-separated format.
pub const ABSENT: &str = ".";

/// The columns of the tab-separated format.
pub const COLUMNS: [&str; 14] = [
    "identifier",
    "gene",
    "category",
    "chromosome",
    "position",
    "reference",
    "alternates",
    "raw",
    "genotype",
    "zygosity",
    "quality",
    "filter",
    "found",
    "inferred",
];

/// Supported output formats.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Format {
    /// Tab-separated text with a header line and one line per call.
    #[default]
    Tsv,
    /// A pretty-printed JSON object keyed by identifier.
    Json,
}

/// A builder to write calls.
#[derive(Debug, Default)]
pub struct Builder {
    format: Format,
}

impl Builder {
    /// Set format to write.
    ///
    /// If unset, the tab-separated format will be used.
    pub fn set_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Write calls to writer.
    pub fn write<W>(self, writer: &mut W, calls: &IndexMap<String, Call>) -> io::Result<()>
    where
        W: io::Write,
    {
        match self.format {
            Format::Tsv => write_tsv(writer, calls.values()),
            Format::Json => write_json(writer, calls),
        }
    }

    /// Write calls to stdout.
    pub fn write_to_stdout(self, calls: &IndexMap<String, Call>) -> io::Result<()> {
        self.write(&mut io::stdout().lock(), calls)
    }

    /// Write calls to path.
    ///
    /// If path already exists, it will be overwritten.
    pub fn write_to_path<P>(self, path: P, calls: &IndexMap<String, Call>) -> io::Result<()>
    where
        P: AsRef<Path>,
    {
        let mut writer = io::BufWriter::new(fs::File::create(path)?);
        self.write(&mut writer, calls)?;
        io::Write::flush(&mut writer)
    }

    /// Write calls to path or stdout.
    ///
    /// If the provided path is `None`, write to stdout.
    /// If path already exists, it will be overwritten.
    pub fn write_to_path_or_stdout<P>(
        self,
        path: Option<P>,
        calls: &IndexMap<String, Call>,
    ) -> io::Result<()>
    where
        P: AsRef<Path>,
    {
        match path {
            Some(path) => self.write_to_path(path, calls),
            None => self.write_to_stdout(calls),
        }
    }
}

/// Writes calls in the tab-separated format, including the header line.
pub fn write_tsv<'a, W, I>(writer: &mut W, calls: I) -> io::Result<()>
where
    W: io::Write,
    I: IntoIterator<Item = &'a Call>,
{
    writeln!(writer, "{}", COLUMNS.join("\t"))?;

    for call in calls {
        writeln!(writer, "{}", format_call(call))?;
    }

    Ok(())
}

/// Writes calls as a pretty-printed JSON object keyed by identifier.
pub fn write_json<W>(writer: &mut W, calls: &IndexMap<String, Call>) -> io::Result<()>
where
    W: io::Write,
{
    serde_json::to_writer_pretty(&mut *writer, calls)?;
    writeln!(writer)
}

fn format_call(call: &Call) -> String {
    fn or_absent(value: Option<&str>) -> &str {
        value.filter(|s| !s.is_empty()).unwrap_or(ABSENT)
    }

    let position = call.position.to_string();
    let alternates = call.alternates.join(",");
    let quality = call.quality.map(|q| q.to_string());

    [
        call.identifier.as_str(),
        call.gene.as_str(),
        call.category.as_str(),
        call.chromosome.as_str(),
        position.as_str(),
        or_absent(call.reference.as_deref()),
        or_absent(Some(alternates.as_str())),
        call.raw.as_str(),
        call.genotype.as_str(),
        call.zygosity.as_str(),
        or_absent(quality.as_deref()),
        or_absent(call.filter.as_deref()),
        bool_str(call.provenance.is_found()),
        bool_str(call.provenance.is_inferred()),
    ]
    .join("\t")
}

fn bool_str(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{call::Provenance, genotype::Zygosity, index::Target, Locus};

    fn calls() -> IndexMap<String, Call> {
        let observed = Call {
            identifier: String::from("rs1"),
            gene: String::from("MTHFR"),
            category: String::from("Methylation"),
            chromosome: String::from("chr1"),
            position: 11796321,
            reference: Some(String::from("G")),
            alternates: vec![String::from("A"), String::from("T")],
            raw: String::from("0/1"),
            genotype: String::from("GA"),
            zygosity: Zygosity::Heterozygous,
            quality: Some(48.5),
            filter: Some(String::from("PASS")),
            provenance: Provenance::Observed,
        };

        let inferred = Call::inferred(
            &Locus::new("chr7", 117548628),
            &Target {
                identifier: String::from("rs2"),
                reference: None,
                gene: String::from("CFTR"),
                category: String::from("Carrier"),
            },
        );

        [observed, inferred]
            .into_iter()
            .map(|call| (call.identifier.clone(), call))
            .collect()
    }

    #[test]
    fn test_write_tsv() -> io::Result<()> {
        let mut buf = Vec::new();
        Builder::default().write(&mut buf, &calls())?;

        let expected = "\
identifier\tgene\tcategory\tchromosome\tposition\treference\talternates\traw\tgenotype\tzygosity\tquality\tfilter\tfound\tinferred
rs1\tMTHFR\tMethylation\tchr1\t11796321\tG\tA,T\t0/1\tGA\theterozygous\t48.5\tPASS\ttrue\tfalse
rs2\tCFTR\tCarrier\tchr7\t117548628\t.\t.\t0/0\tRef/Ref\thomozygous_reference\t.\t.\tfalse\ttrue
";
        assert_eq!(String::from_utf8_lossy(&buf), expected);

        Ok(())
    }

    #[test]
    fn test_write_tsv_empty() -> io::Result<()> {
        let mut buf = Vec::new();
        write_tsv(&mut buf, &Vec::<Call>::new())?;

        assert_eq!(String::from_utf8_lossy(&buf), format!("{}\n", COLUMNS.join("\t")));

        Ok(())
    }

    #[test]
    fn test_write_json() -> Result<(), Box<dyn std::error::Error>> {
        let mut buf = Vec::new();
        Builder::default()
            .set_format(Format::Json)
            .write(&mut buf, &calls())?;

        let value: serde_json::Value = serde_json::from_slice(&buf)?;

        assert_eq!(value["rs1"]["genotype"], "GA");
        assert_eq!(value["rs1"]["alternates"], serde_json::json!(["A", "T"]));
        assert_eq!(value["rs1"]["found"], true);
        assert_eq!(value["rs2"]["reference"], serde_json::Value::Null);
        assert_eq!(value["rs2"]["inferred"], true);
        assert_eq!(value["rs2"]["zygosity"], "homozygous_reference");

        Ok(())
    }
}
