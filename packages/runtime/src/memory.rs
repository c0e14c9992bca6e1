//! The linear memory shared between an engine and its worker.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use uuid::Uuid;

use crate::error::{Result, RuntimeError};

/// A contiguous block of linear memory.
///
/// The region is not `Clone`: moving it transfers it. [`share`](Self::share)
/// creates a second handle to the *same* bytes, for the cases where both
/// sides keep access. Every access takes the region's lock, so concurrent
/// readers and writers never observe a torn slice.
pub struct SharedMemoryRegion {
    id: Uuid,
    bytes: Arc<RwLock<Box<[u8]>>>,
}

impl SharedMemoryRegion {
    /// A zero-filled region of `len` bytes.
    pub fn new(len: usize) -> Self {
        Self::from_bytes(vec![0; len])
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            bytes: Arc::new(RwLock::new(bytes.into_boxed_slice())),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn len(&self) -> usize {
        self.read_guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Another handle to the same region.
    pub fn share(&self) -> Self {
        Self {
            id: self.id,
            bytes: Arc::clone(&self.bytes),
        }
    }

    /// True if both handles refer to the same bytes.
    pub fn same_region(&self, other: &SharedMemoryRegion) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }

    /// Number of live handles to this region.
    pub fn handles(&self) -> usize {
        Arc::strong_count(&self.bytes)
    }

    pub fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<()> {
        let bytes = self.read_guard();
        let range = Self::range(offset, buf.len(), bytes.len())?;
        buf.copy_from_slice(&bytes[range]);
        Ok(())
    }

    pub fn write_at(&self, offset: usize, data: &[u8]) -> Result<()> {
        let mut bytes = self.bytes.write().unwrap_or_else(PoisonError::into_inner);
        let range = Self::range(offset, data.len(), bytes.len())?;
        bytes[range].copy_from_slice(data);
        Ok(())
    }

    /// Copy of the whole region.
    pub fn to_vec(&self) -> Vec<u8> {
        self.read_guard().to_vec()
    }

    fn read_guard(&self) -> std::sync::RwLockReadGuard<'_, Box<[u8]>> {
        // A panic mid-copy cannot leave the bytes in an invalid state.
        self.bytes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn range(offset: usize, len: usize, size: usize) -> Result<std::ops::Range<usize>> {
        match offset.checked_add(len) {
            Some(end) if end <= size => Ok(offset..end),
            _ => Err(RuntimeError::OutOfBounds { offset, len, size }),
        }
    }
}

impl fmt::Debug for SharedMemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedMemoryRegion")
            .field("id", &self.id)
            .field("len", &self.len())
            .field("handles", &self.handles())
            .finish()
    }
}
