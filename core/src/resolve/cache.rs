//! Resolution caches.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use indexmap::IndexMap;

use super::Resolution;

/// A cache of resolutions.
///
/// A cache lives for a single run of the resolver: it is read before fetching, written after
/// fetching, and flushed once resolution is done.
pub trait Cache {
    /// Returns the cached resolution of an identifier, if any.
    fn get(&self, identifier: &str) -> Option<&Resolution>;

    /// Inserts a resolution into the cache.
    fn insert(&mut self, resolution: Resolution);

    /// Persists any changes to the cache.
    fn flush(&mut self) -> io::Result<()>;
}

/// A cache backed by a JSON file.
///
/// The file contains a single object mapping identifiers to resolutions.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct JsonCache {
    path: Option<PathBuf>,
    entries: IndexMap<String, Resolution>,
    dirty: bool,
}

impl JsonCache {
    /// Returns true if the cache contains no resolutions.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of cached resolutions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Opens a cache at a path.
    ///
    /// If the path does not exist, the cache starts out empty, and the file will be created on
    /// flush.
    pub fn open<P>(path: P) -> io::Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();

        let mut cache = match File::open(path) {
            Ok(file) => Self::from_reader(io::BufReader::new(file))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("No cache found at '{}', starting empty.", path.display());
                Self::default()
            }
            Err(e) => return Err(e),
        };

        log::info!(
            "Loaded {} cached resolutions from '{}'.",
            cache.len(),
            path.display()
        );

        cache.path = Some(path.to_path_buf());
        Ok(cache)
    }

    /// Reads a cache from a reader.
    ///
    /// The returned cache is not associated with a path, and flushing it is a no-op.
    pub fn from_reader<R>(reader: R) -> io::Result<Self>
    where
        R: io::Read,
    {
        let entries: IndexMap<String, Resolution> = serde_json::from_reader(reader)?;

        Ok(Self {
            path: None,
            entries,
            dirty: false,
        })
    }

    /// Writes the cache to a writer.
    pub fn write<W>(&self, writer: &mut W) -> io::Result<()>
    where
        W: io::Write,
    {
        serde_json::to_writer_pretty(&mut *writer, &self.entries)?;
        writeln!(writer)
    }
}

impl Cache for JsonCache {
    fn get(&self, identifier: &str) -> Option<&Resolution> {
        self.entries.get(identifier)
    }

    fn insert(&mut self, resolution: Resolution) {
        self.entries
            .insert(resolution.identifier.clone(), resolution);
        self.dirty = true;
    }

    fn flush(&mut self) -> io::Result<()> {
        let Some(path) = self.path.as_ref().filter(|_| self.dirty) else {
            return Ok(());
        };

        let mut writer = File::create(path).map(BufWriter::new)?;
        self.write(&mut writer)?;
        writer.flush()?;

        log::debug!(
            "Wrote {} resolutions to cache at '{}'.",
            self.len(),
            path.display()
        );

        self.dirty = false;
        Ok(())
    }
}
