//! Input sources for reading VCFs.

use std::{
    env,
    fs::File,
    io::{self, IsTerminal as _},
    path::{Path, PathBuf},
};

mod compression;
pub use compression::Compression;

/// An input source for reading.
#[derive(Debug)]
pub enum Input {
    /// A path from which to read a file.
    Path(PathBuf),
    /// Stdin.
    Stdin,
}

impl Input {
    /// By default, reading an `Input` checks that either a path is provided, or that input is
    /// available via stdin, instead of hanging.
    ///
    /// In some contexts, e.g. testing, this can cause issues, and so it may be disabled by setting
    /// this environment variable, or by using [`Input::new_unchecked`].
    pub const ENV_KEY_DISABLE_CHECK: &'static str = "PANELCALL_ALLOW_STDIN";

    /// Creates a new input source.
    pub fn new(input: Option<PathBuf>) -> io::Result<Self> {
        let check = env::var(Self::ENV_KEY_DISABLE_CHECK).is_err();

        if input.is_some() && !io::stdin().is_terminal() && check {
            Err(io::Error::new(
                io::ErrorKind::Other,
                "received input both via file and stdin",
            ))
        } else if input.is_none() && io::stdin().is_terminal() && check {
            Err(io::Error::new(
                io::ErrorKind::Other,
                "received no input via file or stdin",
            ))
        } else {
            Ok(Self::new_unchecked(input))
        }
    }

    /// Creates a new input source without checking that any data is available.
    pub fn new_unchecked(input: Option<PathBuf>) -> Self {
        if let Some(path) = input {
            Self::Path(path)
        } else {
            Self::Stdin
        }
    }

    /// Opens the input for reading.
    ///
    /// BGZF and gzip compressed input is detected and decompressed transparently.
    pub fn open(&self) -> io::Result<Box<dyn io::BufRead>> {
        match self {
            Input::Path(path) => open_reader(io::BufReader::new(File::open(path)?)),
            Input::Stdin => open_reader(io::stdin().lock()),
        }
    }

    /// Returns the provided path if provided, otherwise `None`.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Input::Path(path) => Some(path.as_ref()),
            Input::Stdin => None,
        }
    }
}

fn open_reader<R>(mut reader: R) -> io::Result<Box<dyn io::BufRead>>
where
    R: 'static + io::BufRead,
{
    let compression = Compression::detect(&mut reader)?;

    match compression {
        Some(method) => log::debug!("Detected {method:?} compressed input."),
        None => log::debug!("Detected uncompressed input."),
    }

    Ok(Compression::decode(compression, reader))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Read as _;

    #[test]
    fn test_input_new_unchecked() {
        assert!(matches!(Input::new_unchecked(None), Input::Stdin));

        let input = Input::new_unchecked(Some(PathBuf::from("sample.vcf.gz")));
        assert_eq!(input.as_path(), Some(Path::new("sample.vcf.gz")));
    }

    #[test]
    fn test_open_missing_path() {
        let input = Input::new_unchecked(Some(PathBuf::from("/nonexistent/sample.vcf")));

        assert!(input.open().is_err());
    }

    #[test]
    fn test_open_reader_plain() -> io::Result<()> {
        let mut buf = String::new();
        open_reader(&b"##fileformat=VCFv4.2\n"[..])?.read_to_string(&mut buf)?;

        assert_eq!(buf, "##fileformat=VCFv4.2\n");

        Ok(())
    }
}
