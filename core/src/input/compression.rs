use std::io;

use flate2::bufread::MultiGzDecoder;

use noodles_bgzf as bgzf;

/// A compression method of an input.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Compression {
    /// Blocked gzip, as produced by `bgzip`.
    Bgzf,
    /// Plain, possibly multi-member, gzip.
    Gzip,
}

impl Compression {
    /// Detects the compression method from the magic bytes at the start of a reader.
    ///
    /// The reader is not consumed. Returns `None` if the input is not compressed.
    pub fn detect<R>(reader: &mut R) -> io::Result<Option<Self>>
    where
        R: io::BufRead,
    {
        const GZIP_MAGIC_NUMBER: [u8; 2] = [0x1f, 0x8b];
        const FLAG_EXTRA: u8 = 0x04;
        const BGZF_SUBFIELD: [u8; 2] = *b"BC";

        let src = reader.fill_buf()?;

        match src.get(..GZIP_MAGIC_NUMBER.len()) {
            Some(magic) if magic == GZIP_MAGIC_NUMBER => (),
            _ => return Ok(None),
        }

        let has_extra = src.get(3).is_some_and(|flags| flags & FLAG_EXTRA != 0);
        let is_bgzf = has_extra && src.get(12..14) == Some(&BGZF_SUBFIELD[..]);

        if is_bgzf {
            Ok(Some(Self::Bgzf))
        } else {
            Ok(Some(Self::Gzip))
        }
    }

    /// Wraps a reader in a decoder for the compression method, if any.
    pub fn decode<R>(method: Option<Self>, reader: R) -> Box<dyn io::BufRead>
    where
        R: 'static + io::BufRead,
    {
        match method {
            Some(Self::Bgzf) => Box::new(bgzf::Reader::new(reader)),
            Some(Self::Gzip) => Box::new(io::BufReader::new(MultiGzDecoder::new(reader))),
            None => Box::new(reader),
        }
    }
}
