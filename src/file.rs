// CLASSIFICATION: COMMUNITY
// Filename: file.rs v0.4
// Date Modified: 2026-05-18
// Author: Lukas Bower

//! Virtual file capability shared by every storage backend.
//!
//! A peer never touches a backend directly: it stages offsets and lengths
//! through the register surface, and the engine turns an execute strobe into
//! one of the five operations below. Every outcome is reported through the
//! two-valued status/result pair; backends absorb their own failures and the
//! caller only ever sees an [`Outcome`].

use log::debug;

/// Capacity of the shared data-transfer buffer register, in bytes.
pub const FILE_BUFFER_SIZE: usize = 4096;

/// Hard cap on the capacity of an in-memory file.
pub const MAX_MEMORY_FILE_SIZE: u32 = 10 * 1024 * 1024;

/// Disk-backed writes are padded so stored data stays a multiple of this.
pub const DISK_PAD_ALIGN: u32 = 4;

/// Default base address of the file-access register block.
pub const DEFAULT_BASE_ADDRESS: u32 = 0x2000_0000;

/// Number of file operation kinds.
pub const OP_COUNT: usize = 5;

/// File operation kinds, in wire order of the operation selector register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    /// Open the selected file with the staged open mode.
    Open = 0,
    /// Close the selected file.
    Close = 1,
    /// Move bytes from the file into the shared buffer register.
    Read = 2,
    /// Move bytes from the shared buffer register into the file.
    Write = 3,
    /// Delete the selected file's content.
    Delete = 4,
}

impl OpKind {
    /// All operation kinds, in selector order.
    pub const ALL: [OpKind; OP_COUNT] = [
        OpKind::Open,
        OpKind::Close,
        OpKind::Read,
        OpKind::Write,
        OpKind::Delete,
    ];

    /// Map a raw operation selector value onto an operation kind.
    #[must_use]
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            0 => Some(OpKind::Open),
            1 => Some(OpKind::Close),
            2 => Some(OpKind::Read),
            3 => Some(OpKind::Write),
            4 => Some(OpKind::Delete),
            _ => None,
        }
    }

    /// Slot index of this operation kind.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl core::fmt::Display for OpKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            OpKind::Open => "open",
            OpKind::Close => "close",
            OpKind::Read => "read",
            OpKind::Write => "write",
            OpKind::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Status half of an operation outcome, as exposed by the status register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpStatus {
    /// The operation completed.
    Success = 0,
    /// The operation was refused or failed part-way.
    Failure = 1,
}

/// Open mode requested by the peer through the open-mode register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-only access.
    Read = 0,
    /// Write-only access.
    Write = 1,
    /// Combined read and write access.
    ReadWrite = 2,
}

impl OpenMode {
    /// Map a raw open-mode register value onto a mode.
    #[must_use]
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            0 => Some(OpenMode::Read),
            1 => Some(OpenMode::Write),
            2 => Some(OpenMode::ReadWrite),
            _ => None,
        }
    }

    /// True when the mode carries read intent.
    #[must_use]
    pub fn wants_read(self) -> bool {
        !matches!(self, OpenMode::Write)
    }

    /// True when the mode carries write intent.
    #[must_use]
    pub fn wants_write(self) -> bool {
        !matches!(self, OpenMode::Read)
    }
}

/// Declared capability of a file, or of a published register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Reads only.
    ReadOnly,
    /// Writes only.
    WriteOnly,
    /// Reads and writes.
    ReadWrite,
}

impl AccessMode {
    /// True when reads are permitted.
    #[must_use]
    pub fn readable(self) -> bool {
        !matches!(self, AccessMode::WriteOnly)
    }

    /// True when writes are permitted.
    #[must_use]
    pub fn writable(self) -> bool {
        !matches!(self, AccessMode::ReadOnly)
    }
}

/// Two-valued result of a file operation: what the status and result
/// registers will report on the next read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// Success or failure.
    pub status: OpStatus,
    /// Operation-specific numeric result, typically a byte count.
    pub value: u32,
}

impl Outcome {
    /// A successful outcome carrying `value`.
    #[must_use]
    pub fn success(value: u32) -> Self {
        Self {
            status: OpStatus::Success,
            value,
        }
    }

    /// A failed outcome. The result register reads zero.
    #[must_use]
    pub fn failure() -> Self {
        Self {
            status: OpStatus::Failure,
            value: 0,
        }
    }

    /// True when the status half is [`OpStatus::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == OpStatus::Success
    }
}

/// Failures a backend can run into while servicing an operation.
///
/// Never crosses the protocol boundary: each is folded into a plain
/// [`Outcome::failure`] before the peer sees anything.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    /// Open was issued on a file that is already open.
    #[error("file is already open")]
    AlreadyOpen,
    /// The operation requires an open file.
    #[error("file is not open")]
    NotOpen,
    /// The staged offset is past the end of the file or its capacity.
    #[error("offset {offset} is past the end ({limit})")]
    OffsetOutOfRange {
        /// Offset requested by the peer.
        offset: u32,
        /// First offset that is out of range.
        limit: u32,
    },
    /// The backend does not implement this operation.
    #[error("operation not supported by this backend")]
    Unsupported,
    /// Moving bytes through the shared buffer register failed.
    #[error(transparent)]
    Buffer(#[from] BufferError),
    /// The backing storage failed.
    #[error("storage i/o: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure while copying through the shared buffer register.
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    /// The transfer window does not fit the buffer register.
    #[error("transfer window of {requested} bytes exceeds the {capacity}-byte buffer register")]
    WindowOutOfRange {
        /// Bytes the transfer asked for.
        requested: usize,
        /// Capacity of the buffer register.
        capacity: usize,
    },
}

/// Peer-facing side of the shared data-transfer buffer register.
///
/// Read dispatches `store` the file content for the peer to collect;
/// write dispatches `load` what the peer staged there.
pub trait FileAccessBuffer {
    /// Copy the leading `into.len()` bytes of the buffer register.
    fn load(&mut self, into: &mut [u8]) -> Result<(), BufferError>;

    /// Overwrite the leading bytes of the buffer register with `from`.
    fn store(&mut self, from: &[u8]) -> Result<(), BufferError>;
}

/// Transfer context handed to a backend for one Read or Write dispatch.
///
/// The scratch slice is owned by the engine and sized to
/// [`FILE_BUFFER_SIZE`]; backends stage bytes there on their way between
/// the buffer register and the backing storage.
pub struct FileIo<'a> {
    /// Engine-owned staging area.
    pub scratch: &'a mut [u8],
    /// Shared buffer register.
    pub buffer: &'a mut dyn FileAccessBuffer,
}

/// Per-operation cached protocol state: one offset/length/status/result
/// slot for every operation kind, zero/Success initialized.
///
/// Some slots are never staged for some operations, but allocating them
/// uniformly keeps the selector arithmetic trivial.
#[derive(Debug, Default, Clone)]
pub struct OpSlots {
    offsets: [u32; OP_COUNT],
    lengths: [u32; OP_COUNT],
    statuses: [u32; OP_COUNT],
    results: [u32; OP_COUNT],
}

impl OpSlots {
    /// Staged offset for `op`.
    #[must_use]
    pub fn offset(&self, op: OpKind) -> u32 {
        self.offsets[op.index()]
    }

    /// Stage an offset for `op`.
    pub fn set_offset(&mut self, op: OpKind, value: u32) {
        self.offsets[op.index()] = value;
    }

    /// Staged length for `op`.
    #[must_use]
    pub fn length(&self, op: OpKind) -> u32 {
        self.lengths[op.index()]
    }

    /// Stage a length for `op`.
    pub fn set_length(&mut self, op: OpKind, value: u32) {
        self.lengths[op.index()] = value;
    }

    /// Last recorded status for `op`, in register encoding.
    #[must_use]
    pub fn status(&self, op: OpKind) -> u32 {
        self.statuses[op.index()]
    }

    /// Last recorded result for `op`.
    #[must_use]
    pub fn result(&self, op: OpKind) -> u32 {
        self.results[op.index()]
    }

    /// Record the outcome of an executed operation in its own slot.
    pub fn record(&mut self, op: OpKind, outcome: Outcome) {
        self.statuses[op.index()] = outcome.status as u32;
        self.results[op.index()] = outcome.value;
    }
}

/// Identity and protocol state common to every backend.
#[derive(Debug)]
pub struct FileMeta {
    name: String,
    access: AccessMode,
    size: u32,
    slots: OpSlots,
}

impl FileMeta {
    /// Create metadata for a file named `name` with the given access mode.
    pub fn new(name: impl Into<String>, access: AccessMode) -> Self {
        Self {
            name: name.into(),
            access,
            size: 0,
            slots: OpSlots::default(),
        }
    }

    /// Display name used for selector enumeration.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared access mode.
    #[must_use]
    pub fn access(&self) -> AccessMode {
        self.access
    }

    /// Current logical size of the file content.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Record a new logical size. Backend use only.
    pub fn set_size(&mut self, size: u32) {
        self.size = size;
    }

    /// Per-operation protocol slots.
    #[must_use]
    pub fn slots(&self) -> &OpSlots {
        &self.slots
    }

    /// Mutable per-operation protocol slots.
    pub fn slots_mut(&mut self) -> &mut OpSlots {
        &mut self.slots
    }
}

/// A named, access-mode-tagged virtual file the engine can dispatch to.
///
/// New storage backends implement this trait; the engine never branches on
/// a backend kind. Operations must not panic and must not leak errors:
/// every failure is reported as an [`Outcome::failure`].
pub trait VirtualFile {
    /// Identity and protocol state.
    fn meta(&self) -> &FileMeta;

    /// Mutable identity and protocol state.
    fn meta_mut(&mut self) -> &mut FileMeta;

    /// Open the file with the given mode.
    fn open(&mut self, mode: OpenMode) -> Outcome;

    /// Close the file.
    fn close(&mut self) -> Outcome;

    /// Move up to `req_len` bytes starting at `offset` out of the file and
    /// into the shared buffer register.
    fn read(&mut self, req_len: u32, offset: u32, io: FileIo<'_>) -> Outcome;

    /// Move `req_len` bytes from the shared buffer register into the file
    /// at `offset` (backends may ignore the offset).
    fn write(&mut self, req_len: u32, offset: u32, io: FileIo<'_>) -> Outcome;

    /// Delete the file content.
    fn delete(&mut self) -> Outcome;
}

/// Fold a backend result into the protocol outcome, tracing the failure.
pub(crate) fn absorb(file: &str, op: OpKind, result: Result<u32, FileError>) -> Outcome {
    match result {
        Ok(value) => Outcome::success(value),
        Err(err) => {
            debug!("{file}: {op} refused: {err}");
            Outcome::failure()
        }
    }
}
