//! Fixed-size employee record layout.
//!
//! Each record occupies exactly [`RECORD_SIZE`] bytes with no padding:
//! `id` (u32 LE), `name` (50 bytes, zero padded), `salary` (f32 LE).

use std::fmt;

use crate::error::{EmpDbError, Result};
use crate::storage::{NAME_LEN, RECORD_SIZE};

const ID_END: usize = 4;
const NAME_END: usize = ID_END + NAME_LEN;

/// Bounded name buffer with explicit length.
///
/// On disk the name is a 50-byte field that is only NUL-terminated when
/// shorter than the field. The length is tracked here so a full-width name
/// is never read past its end.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmployeeName {
    bytes: [u8; NAME_LEN],
    len: u8,
}

impl EmployeeName {
    /// Creates a name from a string.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the name is longer than [`NAME_LEN`]
    /// bytes or contains a NUL byte.
    pub fn new(name: &str) -> Result<Self> {
        Self::from_bytes(name.as_bytes())
    }

    /// Creates a name from raw bytes.
    ///
    /// # Errors
    ///
    /// Same conditions as [`EmployeeName::new`].
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        if raw.len() > NAME_LEN {
            return Err(EmpDbError::ValidationError(format!(
                "name is {} bytes, max {NAME_LEN}",
                raw.len()
            )));
        }
        if raw.contains(&0) {
            return Err(EmpDbError::ValidationError(
                "name must not contain NUL bytes".into(),
            ));
        }

        let mut bytes = [0u8; NAME_LEN];
        bytes[..raw.len()].copy_from_slice(raw);
        Ok(Self {
            bytes,
            len: raw.len() as u8,
        })
    }

    /// Creates a name, cutting it to fit the field on a char boundary.
    /// Anything from the first NUL onward is dropped.
    #[must_use]
    pub fn truncated(name: &str) -> Self {
        let name = name.split('\0').next().unwrap_or_default();
        let mut end = name.len().min(NAME_LEN);
        while !name.is_char_boundary(end) {
            end -= 1;
        }

        let mut bytes = [0u8; NAME_LEN];
        bytes[..end].copy_from_slice(&name.as_bytes()[..end]);
        Self {
            bytes,
            len: end as u8,
        }
    }

    /// Decodes the on-disk field. Length is the first NUL or the full width.
    #[must_use]
    pub fn from_field(field: &[u8; NAME_LEN]) -> Self {
        let len = field.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
        let mut bytes = [0u8; NAME_LEN];
        bytes[..len].copy_from_slice(&field[..len]);
        Self {
            bytes,
            len: len as u8,
        }
    }

    /// Returns the meaningful bytes of the name.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// Returns the name as text, replacing invalid UTF-8.
    #[must_use]
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }

    /// Returns the length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Returns whether the name is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the zero-padded on-disk field.
    #[must_use]
    pub fn field(&self) -> &[u8; NAME_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for EmployeeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

impl fmt::Display for EmployeeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

/// One stored employee.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Employee {
    /// Lookup key. Not guaranteed unique within a file.
    pub id: u32,
    /// Employee name.
    pub name: EmployeeName,
    /// Salary.
    pub salary: f32,
}

impl Employee {
    /// Creates a record.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the name does not fit the name field.
    pub fn new(id: u32, name: &str, salary: f32) -> Result<Self> {
        Ok(Self {
            id,
            name: EmployeeName::new(name)?,
            salary,
        })
    }

    /// Encodes the record into its fixed on-disk layout.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        buf[..ID_END].copy_from_slice(&self.id.to_le_bytes());
        buf[ID_END..NAME_END].copy_from_slice(self.name.field());
        buf[NAME_END..].copy_from_slice(&self.salary.to_le_bytes());
        buf
    }

    /// Decodes a record from its fixed on-disk layout.
    #[must_use]
    pub fn from_bytes(buf: &[u8; RECORD_SIZE]) -> Self {
        let mut id = [0u8; 4];
        id.copy_from_slice(&buf[..ID_END]);

        let mut name = [0u8; NAME_LEN];
        name.copy_from_slice(&buf[ID_END..NAME_END]);

        let mut salary = [0u8; 4];
        salary.copy_from_slice(&buf[NAME_END..]);

        Self {
            id: u32::from_le_bytes(id),
            name: EmployeeName::from_field(&name),
            salary: f32::from_le_bytes(salary),
        }
    }
}

impl fmt::Display for Employee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {}, Name: {}, Salary: {:.2}",
            self.id, self.name, self.salary
        )
    }
}

/// Fixed sample set written by `empdb --new`.
#[must_use]
pub fn sample_employees() -> Vec<Employee> {
    [
        (1001, "Alice", 60000.0),
        (1002, "Bob", 55000.0),
        (1003, "Charlie", 62000.0),
    ]
    .into_iter()
    .map(|(id, name, salary)| Employee {
        id,
        name: EmployeeName::truncated(name),
        salary,
    })
    .collect()
}
