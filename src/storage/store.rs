//! File-level record store.
//!
//! A [`RecordStore`] is only a path and a [`StoreConfig`]. Every operation
//! opens the file, streams through it, and closes it again; no handle or
//! file content is kept between calls.
//!
//! The store takes no locks. Callers must ensure a single writer per path.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::error::{EmpDbError, Result};
use crate::storage::header::{validate_header, write_header, FileHeader};
use crate::storage::record::Employee;
use crate::storage::{HEADER_SIZE, RECORD_SIZE};

/// What to do with a trailing record shorter than [`RECORD_SIZE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TailPolicy {
    /// End the scan at the last complete record.
    #[default]
    Drop,
    /// Report the partial record as [`EmpDbError::TruncatedRecord`].
    Error,
}

/// Configuration for store operations.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Handling of a partial trailing record (default: drop).
    pub tail_policy: TailPolicy,
    /// Validate the header before append, list, search and delete
    /// (default: true).
    pub verify_header: bool,
    /// Call `sync_all` after create, append and delete (default: false).
    pub sync_writes: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            tail_policy: TailPolicy::Drop,
            verify_header: true,
            sync_writes: false,
        }
    }
}

impl StoreConfig {
    /// Creates a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the trailing partial record policy.
    #[must_use]
    pub fn with_tail_policy(mut self, policy: TailPolicy) -> Self {
        self.tail_policy = policy;
        self
    }

    /// Sets whether headers are validated before record operations.
    #[must_use]
    pub fn with_verify_header(mut self, verify: bool) -> Self {
        self.verify_header = verify;
        self
    }

    /// Sets whether writes are synced to disk.
    #[must_use]
    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }
}

/// Handle to a header-prefixed record file.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    config: StoreConfig,
}

impl RecordStore {
    /// Creates a store handle with default configuration. Does no I/O.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_config(path, StoreConfig::default())
    }

    /// Creates a store handle with the given configuration. Does no I/O.
    pub fn with_config(path: impl AsRef<Path>, config: StoreConfig) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            config,
        }
    }

    /// Returns the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the store configuration.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Creates the file, truncating anything already at the path, and
    /// writes a fresh header.
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the file cannot be created or written.
    pub fn create_file(&self) -> Result<()> {
        let mut file = File::create(&self.path).map_err(|e| {
            EmpDbError::IoError(format!(
                "Failed to create {}: {e}",
                self.path.display()
            ))
        })?;

        write_header(&mut file)?;
        self.sync(&file)?;
        info!("created database file {}", self.path.display());
        Ok(())
    }

    /// Opens the file read-only and validates its header.
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the file cannot be opened, or a format error if
    /// the header is invalid.
    pub fn open_and_validate(&self) -> Result<FileHeader> {
        let mut file = self.open_read()?;
        validate_header(&mut file)
    }

    /// Appends records as one contiguous block.
    ///
    /// A failed write is not rolled back; the file may end with a partial
    /// record.
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the file cannot be opened or written, or a
    /// format error if header verification is enabled and fails.
    pub fn append_records(&self, records: &[Employee]) -> Result<()> {
        if self.config.verify_header {
            self.open_and_validate()?;
        }

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                EmpDbError::IoError(format!(
                    "Failed to open {} for append: {e}",
                    self.path.display()
                ))
            })?;

        let mut block = Vec::with_capacity(records.len() * RECORD_SIZE);
        for record in records {
            block.extend_from_slice(&record.to_bytes());
        }

        file.write_all(&block)
            .map_err(|e| EmpDbError::IoError(format!("Failed to append records: {e}")))?;
        self.sync(&file)?;
        debug!(
            "appended {} records to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Returns a lazy iterator over all records in file order.
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the file cannot be opened, or a format error if
    /// header verification is enabled and fails.
    pub fn list_records(&self) -> Result<RecordIter> {
        let file = self.open_records()?;
        Ok(RecordIter::new(file, self.config.tail_policy))
    }

    /// Collects all records in file order.
    ///
    /// # Errors
    ///
    /// Same as [`RecordStore::list_records`], plus any error the scan yields.
    pub fn list_all(&self) -> Result<Vec<Employee>> {
        self.list_records()?.collect()
    }

    /// Returns the first record with the given id, or `None`.
    ///
    /// # Errors
    ///
    /// Same as [`RecordStore::list_records`].
    pub fn search_by_id(&self, id: u32) -> Result<Option<Employee>> {
        for record in self.list_records()? {
            let record = record?;
            if record.id == id {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// Deletes every record with the given id by rewriting the file.
    ///
    /// Surviving records are copied byte for byte, in order, to a uniquely
    /// named temp file next to the database, which then replaces the
    /// original. If nothing matched the temp file is discarded and the
    /// original is left untouched.
    ///
    /// Returns whether any record was deleted.
    ///
    /// # Errors
    ///
    /// Returns `IoError` if either file cannot be opened, written or
    /// renamed, or a format error from header verification or the tail
    /// policy.
    pub fn delete_by_id(&self, id: u32) -> Result<bool> {
        let mut source = self.open_read()?;
        let permissions = source
            .metadata()
            .map_err(|e| EmpDbError::IoError(format!("Failed to get file metadata: {e}")))?
            .permissions();

        let mut header = [0u8; HEADER_SIZE];
        if self.config.verify_header {
            validate_header(&mut source)?;
            source
                .seek(SeekFrom::Start(0))
                .map_err(|e| EmpDbError::IoError(format!("Failed to rewind: {e}")))?;
        }
        read_block(&mut source, &mut header)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let temp = tempfile::Builder::new()
            .prefix(".empdb-")
            .suffix(".tmp")
            .tempfile_in(&dir)
            .map_err(|e| {
                EmpDbError::IoError(format!(
                    "Failed to create temp file in {}: {e}",
                    dir.display()
                ))
            })?;

        let mut writer = BufWriter::new(temp);
        writer
            .write_all(&header)
            .map_err(|e| EmpDbError::IoError(format!("Failed to copy header: {e}")))?;

        let mut reader = BufReader::new(source);
        let mut buf = [0u8; RECORD_SIZE];
        let mut offset = HEADER_SIZE as u64;
        let mut deleted = 0usize;
        loop {
            match read_record_block(&mut reader, &mut buf)? {
                Block::Full => {
                    if Employee::from_bytes(&buf).id == id {
                        deleted += 1;
                    } else {
                        writer.write_all(&buf).map_err(|e| {
                            EmpDbError::IoError(format!("Failed to copy record: {e}"))
                        })?;
                    }
                }
                Block::Partial(len) => {
                    if self.config.tail_policy == TailPolicy::Error {
                        return Err(EmpDbError::TruncatedRecord {
                            offset,
                            len,
                            expected: RECORD_SIZE,
                        });
                    }
                    warn!(
                        "dropping {len}-byte partial record at offset {offset} in {}",
                        self.path.display()
                    );
                    break;
                }
                Block::End => break,
            }
            offset += RECORD_SIZE as u64;
        }

        if deleted == 0 {
            debug!("no record with id {id} in {}", self.path.display());
            return Ok(false);
        }

        let temp = writer
            .into_inner()
            .map_err(|e| EmpDbError::IoError(format!("Failed to flush temp file: {e}")))?;
        // The temp file is created owner-only; the replacement keeps the
        // original's mode.
        temp.as_file()
            .set_permissions(permissions)
            .map_err(|e| EmpDbError::IoError(format!("Failed to set permissions: {e}")))?;
        self.sync(temp.as_file())?;
        temp.persist(&self.path).map_err(|e| {
            EmpDbError::IoError(format!(
                "Failed to replace {}: {}",
                self.path.display(),
                e.error
            ))
        })?;

        info!(
            "deleted {deleted} record(s) with id {id} from {}",
            self.path.display()
        );
        Ok(true)
    }

    /// Returns the number of complete records, derived from the file size.
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the file metadata cannot be read.
    pub fn record_count(&self) -> Result<u64> {
        let len = std::fs::metadata(&self.path)
            .map_err(|e| EmpDbError::IoError(format!("Failed to get file metadata: {e}")))?
            .len();
        Ok(len.saturating_sub(HEADER_SIZE as u64) / RECORD_SIZE as u64)
    }

    fn open_read(&self) -> Result<File> {
        File::open(&self.path).map_err(|e| {
            EmpDbError::IoError(format!("Failed to open {}: {e}", self.path.display()))
        })
    }

    /// Opens the file positioned at the first record.
    fn open_records(&self) -> Result<File> {
        let mut file = self.open_read()?;
        if self.config.verify_header {
            validate_header(&mut file)?;
        } else {
            file.seek(SeekFrom::Start(HEADER_SIZE as u64))
                .map_err(|e| EmpDbError::IoError(format!("Failed to seek past header: {e}")))?;
        }
        Ok(file)
    }

    fn sync(&self, file: &File) -> Result<()> {
        if self.config.sync_writes {
            file.sync_all()
                .map_err(|e| EmpDbError::IoError(format!("Failed to sync file: {e}")))?;
        }
        Ok(())
    }
}

/// Lazy scan over the records of one open file.
///
/// Yields `Result<Employee>` and stops for good after the last complete
/// record, a partial record, or the first error.
pub struct RecordIter {
    reader: BufReader<File>,
    tail_policy: TailPolicy,
    offset: u64,
    done: bool,
}

impl RecordIter {
    fn new(file: File, tail_policy: TailPolicy) -> Self {
        Self {
            reader: BufReader::new(file),
            tail_policy,
            offset: HEADER_SIZE as u64,
            done: false,
        }
    }

    /// Returns the byte offset of the next record to be read.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl Iterator for RecordIter {
    type Item = Result<Employee>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut buf = [0u8; RECORD_SIZE];
        match read_record_block(&mut self.reader, &mut buf) {
            Ok(Block::Full) => {
                self.offset += RECORD_SIZE as u64;
                Some(Ok(Employee::from_bytes(&buf)))
            }
            Ok(Block::Partial(len)) => {
                self.done = true;
                match self.tail_policy {
                    TailPolicy::Drop => {
                        warn!("dropping {len}-byte partial record at offset {}", self.offset);
                        None
                    }
                    TailPolicy::Error => Some(Err(EmpDbError::TruncatedRecord {
                        offset: self.offset,
                        len,
                        expected: RECORD_SIZE,
                    })),
                }
            }
            Ok(Block::End) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Outcome of reading one fixed-size block.
enum Block {
    Full,
    Partial(usize),
    End,
}

/// Reads up to one record, distinguishing a clean end from a short tail.
fn read_record_block<R: Read>(reader: &mut R, buf: &mut [u8; RECORD_SIZE]) -> Result<Block> {
    let mut filled = 0;
    while filled < RECORD_SIZE {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => {
                return Err(EmpDbError::IoError(format!("Failed to read record: {e}")));
            }
        }
    }

    Ok(match filled {
        0 => Block::End,
        RECORD_SIZE => Block::Full,
        n => Block::Partial(n),
    })
}

fn read_block<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            EmpDbError::InvalidDatabaseFile("file shorter than header".into())
        } else {
            EmpDbError::IoError(format!("Failed to read header: {e}"))
        }
    })
}
