// CLASSIFICATION: COMMUNITY
// Filename: disk_file.rs v0.5
// Date Modified: 2026-06-14
// Author: Lukas Bower

//! Disk-backed file backend.
//!
//! Content persists across sessions in a regular file on the host
//! filesystem. Transfers are expected to stay 4-byte aligned, so every
//! write is padded up to the next multiple of four: with `0x00` for binary
//! files, with an ASCII space for text files.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use crate::file::{
    absorb, AccessMode, FileError, FileIo, FileMeta, OpKind, OpenMode, Outcome, VirtualFile,
    DISK_PAD_ALIGN,
};

/// Running byte counters for one disk file.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransferStats {
    /// Content bytes handed to the peer through the buffer register.
    pub bytes_read: u64,
    /// Content bytes appended to storage, excluding padding.
    pub bytes_written: u64,
}

/// A file persisted on the host filesystem.
pub struct DiskFile {
    meta: FileMeta,
    path: PathBuf,
    binary: bool,
    handle: Option<File>,
    stats: TransferStats,
}

impl DiskFile {
    /// Create a disk file named `name`, stored at `path`.
    ///
    /// `binary` selects the pad byte used to keep stored data 4-byte
    /// aligned: `0x00` when set, ASCII space otherwise.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        access: AccessMode,
        binary: bool,
    ) -> Self {
        Self {
            meta: FileMeta::new(name, access),
            path: path.into(),
            binary,
            handle: None,
            stats: TransferStats::default(),
        }
    }

    /// Transfer statistics accumulated since construction.
    #[must_use]
    pub fn stats(&self) -> TransferStats {
        self.stats
    }

    fn try_open(&mut self, mode: OpenMode) -> Result<u32, FileError> {
        if self.handle.is_some() {
            return Err(FileError::AlreadyOpen);
        }

        // Mirror the stream open modes: plain read must exist, plain write
        // creates and truncates, read-write must exist and keeps content.
        let mut options = OpenOptions::new();
        match mode {
            OpenMode::Read => {
                options.read(true);
            }
            OpenMode::Write => {
                options.write(true).create(true).truncate(true);
            }
            OpenMode::ReadWrite => {
                options.read(true).write(true);
            }
        }

        let mut handle = options.open(&self.path)?;
        let end = handle.seek(SeekFrom::End(0))?;
        self.meta.set_size(end as u32);
        self.handle = Some(handle);
        Ok(0)
    }

    fn try_close(&mut self) -> Result<u32, FileError> {
        let handle = self.handle.take().ok_or(FileError::NotOpen)?;
        handle.sync_all()?;
        Ok(0)
    }

    fn try_read(&mut self, req_len: u32, offset: u32, io: FileIo<'_>) -> Result<u32, FileError> {
        let size = self.meta.size();
        let handle = self.handle.as_mut().ok_or(FileError::NotOpen)?;
        if offset >= size {
            return Err(FileError::OffsetOutOfRange {
                offset,
                limit: size,
            });
        }

        // Clamp to the remaining content, then to the staging window.
        let mut adjusted = req_len;
        if u64::from(offset) + u64::from(req_len) > u64::from(size) {
            adjusted = size - offset;
        }
        let adjusted = adjusted.min(io.scratch.len() as u32);

        if adjusted > 0 {
            handle.seek(SeekFrom::Start(u64::from(offset)))?;
            let chunk = &mut io.scratch[..adjusted as usize];
            handle.read_exact(chunk)?;
            io.buffer.store(chunk)?;
            self.stats.bytes_read += u64::from(adjusted);
        }

        Ok(adjusted)
    }

    fn try_write(&mut self, req_len: u32, io: FileIo<'_>) -> Result<u32, FileError> {
        let handle = self.handle.as_mut().ok_or(FileError::NotOpen)?;

        if req_len > 0 {
            let len = (req_len as usize).min(io.scratch.len());
            let chunk = &mut io.scratch[..len];
            io.buffer.load(chunk)?;
            handle.write_all(chunk)?;

            let pad = pad_len(len as u32);
            if pad > 0 {
                let pad_byte = if self.binary { 0u8 } else { b' ' };
                let padding = [pad_byte; DISK_PAD_ALIGN as usize];
                handle.write_all(&padding[..pad as usize])?;
            }

            self.stats.bytes_written += len as u64;

            // Disk size advances by the padded length; memory files advance
            // by the requested length instead.
            let adjusted = len as u32 + pad;
            let size = self.meta.size();
            self.meta.set_size(size + adjusted);
        }

        Ok(req_len)
    }
}

/// Bytes needed to bring `len` up to the next multiple of the alignment.
fn pad_len(len: u32) -> u32 {
    (DISK_PAD_ALIGN - len % DISK_PAD_ALIGN) % DISK_PAD_ALIGN
}

impl VirtualFile for DiskFile {
    fn meta(&self) -> &FileMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut FileMeta {
        &mut self.meta
    }

    fn open(&mut self, mode: OpenMode) -> Outcome {
        let result = self.try_open(mode);
        absorb(self.meta.name(), OpKind::Open, result)
    }

    fn close(&mut self) -> Outcome {
        let result = self.try_close();
        absorb(self.meta.name(), OpKind::Close, result)
    }

    fn read(&mut self, req_len: u32, offset: u32, io: FileIo<'_>) -> Outcome {
        let result = self.try_read(req_len, offset, io);
        absorb(self.meta.name(), OpKind::Read, result)
    }

    fn write(&mut self, req_len: u32, _offset: u32, io: FileIo<'_>) -> Outcome {
        // Writes append at the stream position; the staged offset is not
        // consulted by this backend.
        let result = self.try_write(req_len, io);
        absorb(self.meta.name(), OpKind::Write, result)
    }

    fn delete(&mut self) -> Outcome {
        // Erasing storage is host-specific. Wrap this backend and override
        // delete to actually remove the file.
        absorb(self.meta.name(), OpKind::Delete, Err(FileError::Unsupported))
    }
}
