//! Fixed-size file header codec.
//!
//! Every database file starts with an 8-byte header:
//!
//! ```text
//! +-------------+-----------+---------------+
//! | magic (4)   | version(1)| reserved (3)  |
//! +-------------+-----------+---------------+
//! ```
//!
//! The header is written once by [`write_header`] and never modified.
//! [`validate_header`] rejects anything that is not exactly this format
//! version; there is no upgrade path.

use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};

use log::debug;

use crate::error::{EmpDbError, Result};
use crate::storage::{FORMAT_VERSION, HEADER_SIZE, MAGIC_BYTES};

/// Decoded file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Magic bytes for file identification ("MYDB").
    pub magic: [u8; 4],
    /// Format version.
    pub version: u8,
}

impl Default for FileHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl FileHeader {
    /// Creates a header for the current format version.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            magic: *MAGIC_BYTES,
            version: FORMAT_VERSION,
        }
    }

    /// Encodes the header. Reserved bytes are always zero.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.magic);
        buf[4] = self.version;
        buf
    }

    /// Decodes a header without validating it. Reserved bytes are ignored.
    #[must_use]
    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Self {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&buf[0..4]);
        Self {
            magic,
            version: buf[4],
        }
    }

    /// Checks magic and version.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDatabaseFile` on a magic mismatch and
    /// `UnsupportedVersion` on any version other than [`FORMAT_VERSION`].
    pub fn validate(&self) -> Result<()> {
        if self.magic != *MAGIC_BYTES {
            return Err(EmpDbError::InvalidDatabaseFile(format!(
                "bad magic bytes {:02x?}",
                self.magic
            )));
        }

        if self.version != FORMAT_VERSION {
            return Err(EmpDbError::UnsupportedVersion {
                version: self.version,
                expected: FORMAT_VERSION,
            });
        }

        Ok(())
    }
}

/// Writes a fresh header as one block at the writer's current position.
///
/// The writer is expected to be a newly created or truncated file.
///
/// # Errors
///
/// Returns `IoError` if the block cannot be written in full.
pub fn write_header<W: Write>(writer: &mut W) -> Result<()> {
    writer
        .write_all(&FileHeader::new().to_bytes())
        .map_err(|e| EmpDbError::IoError(format!("Failed to write header: {e}")))
}

/// Reads and validates the header at offset 0.
///
/// On success the reader is positioned immediately past the header.
///
/// # Errors
///
/// Returns `InvalidDatabaseFile` if fewer than [`HEADER_SIZE`] bytes are
/// available or the magic is wrong, `UnsupportedVersion` on a version
/// mismatch, and `IoError` for any other read failure.
pub fn validate_header<R: Read + Seek>(reader: &mut R) -> Result<FileHeader> {
    reader
        .seek(SeekFrom::Start(0))
        .map_err(|e| EmpDbError::IoError(format!("Failed to seek to header: {e}")))?;

    let mut buf = [0u8; HEADER_SIZE];
    match reader.read_exact(&mut buf) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
            return Err(EmpDbError::InvalidDatabaseFile(format!(
                "file shorter than the {HEADER_SIZE}-byte header"
            )));
        }
        Err(e) => {
            return Err(EmpDbError::IoError(format!("Failed to read header: {e}")));
        }
    }

    let header = FileHeader::from_bytes(&buf);
    header.validate()?;
    debug!("validated header version {}", header.version);
    Ok(header)
}
