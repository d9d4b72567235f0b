//! Durable parameter storage port.
//!
//! The pipeline only needs a small key/value map of serialized parameter
//! records. Real firmware backs this with flash, EEPROM or FRAM;
//! [`InMemoryStore`] is a fixed-capacity RAM implementation for hosts and
//! tests.

use heapless::Vec;

/// Keys of the records the pipeline persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ParamKey {
    FilterConfig = 0x0001,
    DriftConfig = 0x0002,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    NotFound,
    Io,
}

impl core::fmt::Display for StoreError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "parameter not found"),
            StoreError::Io => write!(f, "parameter storage I/O error"),
        }
    }
}

impl core::error::Error for StoreError {}

pub trait ParameterStore {
    /// Copies the record for `key` into `buf`, returning its length.
    ///
    /// Records longer than `buf` are an [`StoreError::Io`] error.
    fn read(&mut self, key: ParamKey, buf: &mut [u8]) -> Result<usize, StoreError>;

    fn write(&mut self, key: ParamKey, bytes: &[u8]) -> Result<(), StoreError>;
}

impl<T: ParameterStore + ?Sized> ParameterStore for &mut T {
    fn read(&mut self, key: ParamKey, buf: &mut [u8]) -> Result<usize, StoreError> {
        (**self).read(key, buf)
    }

    fn write(&mut self, key: ParamKey, bytes: &[u8]) -> Result<(), StoreError> {
        (**self).write(key, bytes)
    }
}

/// Largest record an [`InMemoryStore`] slot can hold.
pub const MAX_RECORD_LEN: usize = 32;

#[derive(Debug, Clone)]
struct Entry {
    key: ParamKey,
    len: usize,
    data: [u8; MAX_RECORD_LEN],
}

/// RAM-backed store with room for `ENTRIES` distinct keys.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore<const ENTRIES: usize = 4> {
    entries: Vec<Entry, ENTRIES>,
}

impl<const ENTRIES: usize> InMemoryStore<ENTRIES> {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn contains(&self, key: ParamKey) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    pub fn remove(&mut self, key: ParamKey) {
        self.entries.retain(|e| e.key != key);
    }
}

impl<const ENTRIES: usize> ParameterStore for InMemoryStore<ENTRIES> {
    fn read(&mut self, key: ParamKey, buf: &mut [u8]) -> Result<usize, StoreError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.key == key)
            .ok_or(StoreError::NotFound)?;
        let out = buf.get_mut(..entry.len).ok_or(StoreError::Io)?;
        out.copy_from_slice(&entry.data[..entry.len]);
        Ok(entry.len)
    }

    fn write(&mut self, key: ParamKey, bytes: &[u8]) -> Result<(), StoreError> {
        if bytes.len() > MAX_RECORD_LEN {
            return Err(StoreError::Io);
        }
        let mut data = [0u8; MAX_RECORD_LEN];
        data[..bytes.len()].copy_from_slice(bytes);
        let entry = Entry {
            key,
            len: bytes.len(),
            data,
        };

        match self.entries.iter().position(|e| e.key == key) {
            Some(slot) => self.entries[slot] = entry,
            None => self.entries.push(entry).map_err(|_| StoreError::Io)?,
        }
        Ok(())
    }
}
