// CLASSIFICATION: COMMUNITY
// Filename: mem_file.rs v0.3
// Date Modified: 2026-05-30
// Author: Lukas Bower

//! Bounded in-memory file backend.
//!
//! Volatile scratch storage for uploads: the content lives only as long as
//! the process, and the backend is write-only by construction. Reads are
//! refused outright rather than being derived from the access mode.

use crate::file::{
    absorb, AccessMode, FileError, FileIo, FileMeta, OpKind, OpenMode, Outcome, VirtualFile,
    MAX_MEMORY_FILE_SIZE,
};

/// Write-only in-memory file with a fixed capacity.
pub struct MemoryFile {
    meta: FileMeta,
    capacity: u32,
    data: Box<[u8]>,
    opened: bool,
}

impl MemoryFile {
    /// Create a memory file named `name`. The capacity is clamped to
    /// [`MAX_MEMORY_FILE_SIZE`]; the backing array is allocated up front.
    pub fn new(name: impl Into<String>, capacity: u32) -> Self {
        let capacity = capacity.min(MAX_MEMORY_FILE_SIZE);
        Self {
            meta: FileMeta::new(name, AccessMode::WriteOnly),
            capacity,
            data: vec![0u8; capacity as usize].into_boxed_slice(),
            opened: false,
        }
    }

    /// Fixed capacity of the backing array.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    fn try_write(&mut self, req_len: u32, offset: u32, io: FileIo<'_>) -> Result<u32, FileError> {
        if !self.opened {
            return Err(FileError::NotOpen);
        }
        if offset >= self.capacity {
            return Err(FileError::OffsetOutOfRange {
                offset,
                limit: self.capacity,
            });
        }

        // Clamp to the remaining capacity, then to the staging window.
        let mut adjusted = req_len;
        if u64::from(offset) + u64::from(req_len) > u64::from(self.capacity) {
            adjusted = self.capacity - offset;
        }
        let adjusted = adjusted.min(io.scratch.len() as u32) as usize;

        if adjusted > 0 {
            io.buffer.load(&mut io.scratch[..adjusted])?;
            let start = offset as usize;
            self.data[start..start + adjusted].copy_from_slice(&io.scratch[..adjusted]);

            // The recorded size grows by the requested length even when the
            // copy itself was clamped; disk files grow by the padded length.
            let size = self.meta.size();
            self.meta.set_size(size + req_len);
        }

        Ok(req_len)
    }
}

impl VirtualFile for MemoryFile {
    fn meta(&self) -> &FileMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut FileMeta {
        &mut self.meta
    }

    fn open(&mut self, _mode: OpenMode) -> Outcome {
        let result = if self.opened {
            Err(FileError::AlreadyOpen)
        } else {
            self.opened = true;
            Ok(0)
        };
        absorb(self.meta.name(), OpKind::Open, result)
    }

    fn close(&mut self) -> Outcome {
        let result = if self.opened {
            self.opened = false;
            Ok(0)
        } else {
            Err(FileError::NotOpen)
        };
        absorb(self.meta.name(), OpKind::Close, result)
    }

    fn read(&mut self, _req_len: u32, _offset: u32, _io: FileIo<'_>) -> Outcome {
        // Write-only backing store: refuse even well-formed requests.
        absorb(self.meta.name(), OpKind::Read, Err(FileError::Unsupported))
    }

    fn write(&mut self, req_len: u32, offset: u32, io: FileIo<'_>) -> Outcome {
        let result = self.try_write(req_len, offset, io);
        absorb(self.meta.name(), OpKind::Write, result)
    }

    fn delete(&mut self) -> Outcome {
        // Dropping the logical size is enough; the array keeps its bytes.
        self.meta.set_size(0);
        Outcome::success(0)
    }
}
