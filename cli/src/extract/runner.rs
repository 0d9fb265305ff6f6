use std::time::Duration;

use anyhow::{Context, Error};

use panelcall_core::{
    extract,
    resolve::{Cache, JsonCache, RefSnpDir, Resolver, VariationServices},
    Catalog, Extraction, Input, PositionIndex,
};

use super::Extract;

pub struct Runner {
    input: Input,
    index: PositionIndex,
}

impl Runner {
    pub fn new(input: Input, index: PositionIndex) -> Self {
        Self { input, index }
    }

    pub fn run(self) -> Result<Extraction, Error> {
        let mut reader = self.input.open().with_context(|| match self.input.as_path() {
            Some(path) => format!("Failed to open VCF from provided path '{}'", path.display()),
            None => String::from("Failed to open VCF from stdin"),
        })?;

        let extraction = extract(&mut reader, &self.index)?;

        log::info!(
            "Read {} lines ({} skipped), observed {}/{} target loci.",
            extraction.lines,
            extraction.skipped,
            extraction.observed_loci,
            extraction.total_loci,
        );

        Ok(extraction)
    }
}

impl TryFrom<&Extract> for Runner {
    type Error = Error;

    fn try_from(args: &Extract) -> Result<Self, Self::Error> {
        let input = Input::new(args.input.clone())?;

        let catalog = Catalog::from_path(&args.catalog, &args.default_category)
            .with_context(|| {
                format!(
                    "Failed to open catalog from provided path '{}'",
                    args.catalog.display()
                )
            })?
            .with_context(|| format!("Failed to parse catalog '{}'", args.catalog.display()))?;

        for (identifier, categories) in catalog.duplicates() {
            log::debug!(
                "Identifier '{identifier}' listed under several categories ({}), using the first.",
                categories.join(", ")
            );
        }

        let cache = JsonCache::open(&args.resolutions).with_context(|| {
            format!(
                "Failed to read resolution cache from provided path '{}'",
                args.resolutions.display()
            )
        })?;

        let mut resolver = Resolver::new(cache);
        if let Some(dir) = &args.refsnp_dir {
            resolver = resolver.set_fetcher(RefSnpDir::new(dir));
        } else if args.ncbi {
            let client = VariationServices::new()
                .context("Failed to create NCBI Variation Services client")?
                .set_delay(Duration::from_millis(args.request_delay));

            resolver = resolver.set_fetcher(client);
        }

        let resolutions = resolver.resolve(catalog.unique_identifiers());

        resolver.into_cache().flush().with_context(|| {
            format!(
                "Failed to write resolution cache to provided path '{}'",
                args.resolutions.display()
            )
        })?;

        let index = PositionIndex::build(catalog.rows(), &resolutions);

        if index.is_empty() {
            log::warn!("No catalog identifiers could be resolved, no calls will be made.");
        }

        Ok(Self::new(input, index))
    }
}
