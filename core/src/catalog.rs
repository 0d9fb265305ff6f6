//! Variant catalog.
//!
//! A catalog is a curated list of variants, given as tab-separated rows of category, gene,
//! identifier and description. The same identifier may occur under several categories.

use std::{
    fmt,
    fs::File,
    io::{self, Read},
    path::Path,
};

use indexmap::{IndexMap, IndexSet};

/// A single catalog row.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Row {
    /// Category of the variant, e.g. a clinical area.
    pub category: String,
    /// Gene the variant is annotated to.
    pub gene: String,
    /// Variant identifier, e.g. an rsID.
    pub identifier: String,
    /// Free-text description.
    pub description: String,
}

impl Row {
    /// Creates a new row.
    pub fn new<S>(category: S, gene: S, identifier: S, description: S) -> Self
    where
        S: ToString,
    {
        Self {
            category: category.to_string(),
            gene: gene.to_string(),
            identifier: identifier.to_string(),
            description: description.to_string(),
        }
    }

    fn from_fields(fields: &[&str], default_category: &str) -> Option<Self> {
        match *fields {
            [category, gene, identifier, description] => {
                Some(Self::new(category, gene, identifier, description))
            }
            [gene, identifier, description] => {
                Some(Self::new(default_category, gene, identifier, description))
            }
            _ => None,
        }
    }
}

/// A variant catalog.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Catalog {
    rows: Vec<Row>,
}

impl Catalog {
    /// Returns the identifiers occurring under more than one category, with their categories in
    /// order of first occurrence.
    pub fn duplicates(&self) -> IndexMap<&str, Vec<&str>> {
        let mut categories: IndexMap<&str, IndexSet<&str>> = IndexMap::new();

        for row in self.rows.iter() {
            categories
                .entry(row.identifier.as_str())
                .or_default()
                .insert(row.category.as_str());
        }

        categories
            .into_iter()
            .filter(|(_, categories)| categories.len() > 1)
            .map(|(identifier, categories)| (identifier, categories.into_iter().collect()))
            .collect()
    }

    /// Reads a catalog from a path.
    ///
    /// See [`Catalog::from_str`] for details on the format.
    pub fn from_path<P>(
        path: P,
        default_category: &str,
    ) -> io::Result<Result<Self, ParseCatalogError>>
    where
        P: AsRef<Path>,
    {
        File::open(path).and_then(|file| Self::from_reader(file, default_category))
    }

    /// Reads a catalog from a reader.
    ///
    /// See [`Catalog::from_str`] for details on the format.
    pub fn from_reader<R>(
        mut reader: R,
        default_category: &str,
    ) -> io::Result<Result<Self, ParseCatalogError>>
    where
        R: Read,
    {
        let mut s = String::new();
        let _ = reader.read_to_string(&mut s)?;

        Ok(Self::from_str(&s, default_category))
    }

    /// Parses a catalog from a string.
    ///
    /// Each line should contain the tab-separated category, gene, identifier, and description of a
    /// variant. Lines with only gene, identifier, and description are assigned the default
    /// category. Blank lines, lines starting with `#`, and a leading header row are skipped, as
    /// are rows with any other number of fields.
    pub fn from_str(s: &str, default_category: &str) -> Result<Self, ParseCatalogError> {
        let mut rows = Vec::new();

        for (i, line) in s.lines().enumerate() {
            let line = line.trim_start_matches('\u{feff}').trim_end_matches('\r');

            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let fields = line.split('\t').map(str::trim).collect::<Vec<_>>();

            if rows.is_empty() && is_header(&fields) {
                continue;
            }

            match Row::from_fields(&fields, default_category) {
                Some(row) if !row.identifier.is_empty() => rows.push(row),
                Some(_) => log::warn!("Skipping catalog line {} without identifier.", i + 1),
                None => log::warn!(
                    "Skipping catalog line {} with unexpected number of fields ({}).",
                    i + 1,
                    fields.len()
                ),
            }
        }

        if rows.is_empty() {
            Err(ParseCatalogError::Empty)
        } else {
            log::debug!("Parsed {} catalog rows.", rows.len());

            Ok(Self { rows })
        }
    }

    /// Returns the rows of the catalog.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Returns the distinct identifiers of the catalog in order of first occurrence.
    pub fn unique_identifiers(&self) -> IndexSet<&str> {
        self.rows.iter().map(|row| row.identifier.as_str()).collect()
    }
}

impl FromIterator<Row> for Catalog {
    fn from_iter<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = Row>,
    {
        Self {
            rows: rows.into_iter().collect(),
        }
    }
}

fn is_header(fields: &[&str]) -> bool {
    fields
        .first()
        .map(|first| first.eq_ignore_ascii_case("category"))
        .unwrap_or(false)
}

/// An error associated with parsing a catalog.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseCatalogError {
    /// No rows were found.
    Empty,
}

impl fmt::Display for ParseCatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCatalogError::Empty => f.write_str("no rows found in catalog"),
        }
    }
}

impl std::error::Error for ParseCatalogError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_from_str() -> Result<(), ParseCatalogError> {
        let s = "Category\tGene\trsID\tDescription
Cardio\tAPOE\trs429358\tAPOE e4
Metabolism\tMTHFR\trs1801133\tC677T
";

        let catalog = Catalog::from_str(s, "Default")?;

        assert_eq!(
            catalog.rows(),
            &[
                Row::new("Cardio", "APOE", "rs429358", "APOE e4"),
                Row::new("Metabolism", "MTHFR", "rs1801133", "C677T"),
            ]
        );

        Ok(())
    }

    #[test]
    fn test_catalog_from_str_default_category() -> Result<(), ParseCatalogError> {
        let s = "CYP2C19\trs4244285\t*2 allele
Pharma\tCYP2D6\trs3892097\t*4 allele";

        let catalog = Catalog::from_str(s, "Pediatric")?;

        assert_eq!(
            catalog.rows(),
            &[
                Row::new("Pediatric", "CYP2C19", "rs4244285", "*2 allele"),
                Row::new("Pharma", "CYP2D6", "rs3892097", "*4 allele"),
            ]
        );

        Ok(())
    }

    #[test]
    fn test_catalog_from_str_skips_malformed() -> Result<(), ParseCatalogError> {
        let s = "# comment

A\tGENE\trs1\tdesc\textra
A\tGENE\trs2\tdesc\r
only\ttwo
";

        let catalog = Catalog::from_str(s, "Default")?;

        assert_eq!(catalog.rows(), &[Row::new("A", "GENE", "rs2", "desc")]);

        Ok(())
    }

    #[test]
    fn test_catalog_from_str_empty() {
        assert_eq!(
            Catalog::from_str("Category\tGene\trsID\tDescription\n", "Default"),
            Err(ParseCatalogError::Empty)
        );
    }

    #[test]
    fn test_catalog_unique_identifiers_and_duplicates() {
        let catalog = Catalog::from_iter([
            Row::new("A", "G1", "rs1", ""),
            Row::new("B", "G2", "rs2", ""),
            Row::new("B", "G1", "rs1", ""),
            Row::new("A", "G1", "rs1", ""),
            Row::new("C", "G1", "rs1", ""),
        ]);

        assert_eq!(
            catalog.unique_identifiers().into_iter().collect::<Vec<_>>(),
            vec!["rs1", "rs2"]
        );

        let duplicates = catalog.duplicates();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates["rs1"], vec!["A", "B", "C"]);
    }
}
