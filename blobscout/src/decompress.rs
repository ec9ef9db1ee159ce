use bzip2::read::MultiBzDecoder;
use flate2::read::MultiGzDecoder;
use std::io::{self, BufRead, BufReader, Cursor, Read};
use tracing::trace;

use crate::errors::{SearchError, SearchResult};

const BUFFER_CAPACITY: usize = 65536;

/// gzip magic bytes (RFC 1952).
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
/// bzip2 stream header ("BZh").
pub const BZIP2_MAGIC: [u8; 3] = *b"BZh";

/// Compression format of an object, chosen from its key's final extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Bzip2,
    None,
}

impl Compression {
    /// Picks a format purely from the key suffix; content is never sniffed.
    ///
    /// The suffix is whatever follows the last `.` of the last `/`-separated
    /// segment, so a key like `logs/.gz` is gzip.
    pub fn from_key(key: &str) -> Self {
        let name = key.rsplit('/').next().unwrap_or(key);
        match name.rsplit_once('.').map(|(_, ext)| ext) {
            Some("gz") => Compression::Gzip,
            Some("bz2") => Compression::Bzip2,
            _ => Compression::None,
        }
    }

    /// Size in bytes of an archive of this format wrapping no content.
    ///
    /// `None` for uncompressed objects, where only a zero length means empty.
    pub fn empty_archive_len(self) -> Option<u64> {
        match self {
            Compression::Gzip => Some(20),
            Compression::Bzip2 => Some(14),
            Compression::None => None,
        }
    }
}

/// Reads exactly `N` leading bytes and checks them against `magic`, handing
/// back a reader that replays those bytes ahead of the rest of the stream.
fn expect_magic<const N: usize>(
    key: &str,
    mut source: Box<dyn Read + Send>,
    magic: [u8; N],
    format: &str,
) -> SearchResult<io::Chain<Cursor<[u8; N]>, Box<dyn Read + Send>>> {
    let mut header = [0u8; N];
    source.read_exact(&mut header).map_err(|e| {
        SearchError::decompress_failed(key, format!("cannot read {} header: {}", format, e))
    })?;
    if header != magic {
        return Err(SearchError::decompress_failed(
            key,
            format!("not in {} format", format),
        ));
    }
    Ok(Cursor::new(header).chain(source))
}

/// Wraps an object's byte stream in the decompressor its key calls for.
///
/// Uncompressed objects are only buffered. A compressed object whose leading
/// bytes are not the expected magic fails here, before any line is read.
pub fn open_decompressed(
    key: &str,
    source: Box<dyn Read + Send>,
) -> SearchResult<Box<dyn BufRead + Send>> {
    let compression = Compression::from_key(key);
    trace!("Opening {} as {:?}", key, compression);

    let reader: Box<dyn BufRead + Send> = match compression {
        Compression::Gzip => {
            let stream = expect_magic(key, source, GZIP_MAGIC, "gzip")?;
            Box::new(BufReader::with_capacity(
                BUFFER_CAPACITY,
                MultiGzDecoder::new(stream),
            ))
        }
        Compression::Bzip2 => {
            let stream = expect_magic(key, source, BZIP2_MAGIC, "bzip2")?;
            Box::new(BufReader::with_capacity(
                BUFFER_CAPACITY,
                MultiBzDecoder::new(stream),
            ))
        }
        Compression::None => Box::new(BufReader::with_capacity(BUFFER_CAPACITY, source)),
    };
    Ok(reader)
}

/// Forward-only iterator over the newline-delimited lines of a stream.
///
/// The trailing `\n` (and a `\r` before it) is stripped. Invalid UTF-8 is
/// replaced rather than rejected since objects are arbitrary blobs.
pub struct ObjectLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> ObjectLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(256),
        }
    }
}

impl<R: BufRead> Iterator for ObjectLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
