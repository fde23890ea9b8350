use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("Batch count must be at least 1")]
    ZeroCount,
    #[error("Batch id {id} is out of range for {count} batches")]
    IdOutOfRange { count: u32, id: u32 },
}

/// One slice of a regression run. The runner walks the sorted dump directory starting at `id`
/// and stepping by `count`, so every batch of the same run sees a disjoint set of dumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Batch {
    count: u32,
    id: u32,
}

impl Batch {
    pub fn new(count: u32, id: u32) -> Result<Self, BatchError> {
        if count == 0 {
            return Err(BatchError::ZeroCount);
        }
        if id >= count {
            return Err(BatchError::IdOutOfRange { count, id });
        }
        Ok(Self { count, id })
    }

    /// The whole corpus handled by one process.
    pub fn single() -> Self {
        Self { count: 1, id: 0 }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// True when other batches run next to this one.
    pub fn is_parallel(&self) -> bool {
        self.count > 1
    }
}

impl Default for Batch {
    fn default() -> Self {
        Self::single()
    }
}

impl fmt::Display for Batch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.id, self.count)
    }
}
