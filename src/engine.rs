// CLASSIFICATION: COMMUNITY
// Filename: engine.rs v0.8
// Date Modified: 2026-07-19
// Author: Lukas Bower

//! Protocol controller: turns register traffic into file operations.
//!
//! The engine keeps no authoritative register state of its own. Selector
//! values are read from the bank on demand, staged offsets/lengths and the
//! last status/result of every operation live in the selected file's
//! per-operation slots, and the read-only registers are recomputed from
//! those slots in the pre-read hook just before the peer's read completes.

use log::{debug, info, warn};

use crate::file::{
    AccessMode, BufferError, FileAccessBuffer, FileIo, OpKind, OpenMode, VirtualFile,
    FILE_BUFFER_SIZE,
};
use crate::registers::{RegisterBank, RegisterDef, RegisterError, RegisterSink};
use crate::registry::FileRegistry;

const REG_FILE_SELECTOR: &str = "FileSelector";
const REG_OPERATION_SELECTOR: &str = "FileOperationSelector";
const REG_OPERATION_EXECUTE: &str = "FileOperationExecute";
const REG_OPEN_MODE: &str = "FileOpenMode";
const REG_ACCESS_BUFFER: &str = "FileAccessBuffer";
const REG_ACCESS_OFFSET: &str = "FileAccessOffset";
const REG_ACCESS_LENGTH: &str = "FileAccessLength";
const REG_OPERATION_STATUS: &str = "FileOperationStatus";
const REG_OPERATION_RESULT: &str = "FileOperationResult";
const REG_FILE_SIZE: &str = "FileSize";

/// Addresses of the file-access registers, laid out sequentially from a
/// base address with the shared buffer in the middle.
#[derive(Debug, Clone, Copy)]
pub struct RegisterLayout {
    base: u32,
}

impl RegisterLayout {
    const BUF: u32 = FILE_BUFFER_SIZE as u32;

    /// Layout rooted at `base`.
    #[must_use]
    pub fn new(base: u32) -> Self {
        Self { base }
    }

    /// Base address of the register block.
    #[must_use]
    pub fn base(&self) -> u32 {
        self.base
    }

    /// File selector register.
    #[must_use]
    pub fn file_selector(&self) -> u32 {
        self.base
    }

    /// Operation selector register.
    #[must_use]
    pub fn operation_selector(&self) -> u32 {
        self.base + 0x4
    }

    /// Execute command register.
    #[must_use]
    pub fn operation_execute(&self) -> u32 {
        self.base + 0x8
    }

    /// Open mode register.
    #[must_use]
    pub fn open_mode(&self) -> u32 {
        self.base + 0xC
    }

    /// Shared data-transfer buffer register.
    #[must_use]
    pub fn access_buffer(&self) -> u32 {
        self.base + 0x10
    }

    /// Staged byte offset register.
    #[must_use]
    pub fn access_offset(&self) -> u32 {
        self.base + 0x10 + Self::BUF
    }

    /// Staged byte length register.
    #[must_use]
    pub fn access_length(&self) -> u32 {
        self.base + 0x14 + Self::BUF
    }

    /// Operation status register.
    #[must_use]
    pub fn operation_status(&self) -> u32 {
        self.base + 0x18 + Self::BUF
    }

    /// Operation result register.
    #[must_use]
    pub fn operation_result(&self) -> u32 {
        self.base + 0x1C + Self::BUF
    }

    /// File size register.
    #[must_use]
    pub fn file_size(&self) -> u32 {
        self.base + 0x20 + Self::BUF
    }
}

/// Shared buffer register viewed as a transfer endpoint for one dispatch.
struct BufferWindow<'a> {
    bank: &'a mut RegisterBank,
    address: u32,
}

impl FileAccessBuffer for BufferWindow<'_> {
    fn load(&mut self, into: &mut [u8]) -> Result<(), BufferError> {
        self.bank
            .read_block(self.address, into)
            .map_err(|_| BufferError::WindowOutOfRange {
                requested: into.len(),
                capacity: FILE_BUFFER_SIZE,
            })
    }

    fn store(&mut self, from: &[u8]) -> Result<(), BufferError> {
        self.bank
            .write_block(self.address, from)
            .map_err(|_| BufferError::WindowOutOfRange {
                requested: from.len(),
                capacity: FILE_BUFFER_SIZE,
            })
    }
}

/// The register-driven file-transfer engine.
///
/// Owns the file registry and the staging buffer. Files are registered
/// before the engine is attached to a [`crate::RegisterFile`]; attaching
/// consumes the engine, which is what seals the file set for the session.
pub struct TransferEngine {
    layout: RegisterLayout,
    files: FileRegistry,
    scratch: Vec<u8>,
}

impl TransferEngine {
    /// Engine with an empty registry, registers rooted at `base_address`.
    #[must_use]
    pub fn new(base_address: u32) -> Self {
        Self {
            layout: RegisterLayout::new(base_address),
            files: FileRegistry::new(),
            scratch: vec![0u8; FILE_BUFFER_SIZE],
        }
    }

    /// Register a file. Selector order is registration order.
    pub fn add_file(&mut self, file: Box<dyn VirtualFile>) {
        debug!(
            "registered file {} ({:?}) as selector {}",
            file.meta().name(),
            file.meta().access(),
            self.files.len()
        );
        self.files.add(file);
    }

    /// Register layout in use.
    #[must_use]
    pub fn layout(&self) -> RegisterLayout {
        self.layout
    }

    /// Registered files.
    #[must_use]
    pub fn files(&self) -> &FileRegistry {
        &self.files
    }

    /// Declare the ten protocol registers into `bank`.
    ///
    /// Serving a file-access block with nothing behind it is a
    /// configuration error: with no registered files this publishes
    /// nothing and returns [`RegisterError::EmptyRegistry`].
    pub fn publish(&self, bank: &mut RegisterBank) -> Result<(), RegisterError> {
        if self.files.is_empty() {
            return Err(RegisterError::EmptyRegistry);
        }

        let l = self.layout;
        let word = |name, address, access| RegisterDef {
            name,
            address,
            len: 4,
            access,
        };
        bank.add_word(word(
            REG_FILE_SELECTOR,
            l.file_selector(),
            AccessMode::ReadWrite,
        ))?;
        bank.add_word(word(
            REG_OPERATION_SELECTOR,
            l.operation_selector(),
            AccessMode::ReadWrite,
        ))?;
        bank.add_word(word(
            REG_OPERATION_EXECUTE,
            l.operation_execute(),
            AccessMode::WriteOnly,
        ))?;
        bank.add_word(word(REG_OPEN_MODE, l.open_mode(), AccessMode::ReadWrite))?;
        bank.add_block(RegisterDef {
            name: REG_ACCESS_BUFFER,
            address: l.access_buffer(),
            len: FILE_BUFFER_SIZE as u32,
            access: AccessMode::ReadWrite,
        })?;
        bank.add_word(word(
            REG_ACCESS_OFFSET,
            l.access_offset(),
            AccessMode::ReadWrite,
        ))?;
        bank.add_word(word(
            REG_ACCESS_LENGTH,
            l.access_length(),
            AccessMode::ReadWrite,
        ))?;
        bank.add_word(word(
            REG_OPERATION_STATUS,
            l.operation_status(),
            AccessMode::ReadOnly,
        ))?;
        bank.add_word(word(
            REG_OPERATION_RESULT,
            l.operation_result(),
            AccessMode::ReadOnly,
        ))?;
        bank.add_word(word(REG_FILE_SIZE, l.file_size(), AccessMode::ReadOnly))?;

        info!(
            "published file-access registers at {:#010x} for {} files",
            l.base(),
            self.files.len()
        );
        Ok(())
    }

    fn selected_op(&self, bank: &RegisterBank) -> Result<Option<OpKind>, RegisterError> {
        let raw = bank.read_u32(self.layout.operation_selector())?;
        let op = OpKind::from_raw(raw);
        if op.is_none() {
            warn!("operation selector {raw} is out of range");
        }
        Ok(op)
    }

    /// Re-validate the open-mode register against the newly selected
    /// file's access mode, writing the corrected value back.
    fn revalidate_open_mode(&mut self, bank: &mut RegisterBank) -> Result<(), RegisterError> {
        let l = self.layout;
        let selector = bank.read_u32(l.file_selector())?;
        let Some(file) = self.files.get(selector) else {
            warn!("file selector {selector} is out of range");
            return Ok(());
        };
        let Some(mode) = OpenMode::from_raw(bank.read_u32(l.open_mode())?) else {
            return Ok(());
        };

        let corrected = match file.meta().access() {
            AccessMode::ReadOnly if mode.wants_write() => Some(OpenMode::Read),
            AccessMode::WriteOnly if mode.wants_read() => Some(OpenMode::Write),
            // Read-write files take any open mode unchanged.
            _ => None,
        };
        if let Some(mode) = corrected {
            debug!(
                "coerced open mode to {mode:?} for file {}",
                file.meta().name()
            );
            bank.write_u32(l.open_mode(), mode as u32)?;
        }
        Ok(())
    }

    /// Stage the just-written offset or length value into the selected
    /// file's slot for the selected operation.
    fn stage(&mut self, address: u32, bank: &mut RegisterBank) -> Result<(), RegisterError> {
        let l = self.layout;
        let selector = bank.read_u32(l.file_selector())?;
        let Some(op) = self.selected_op(bank)? else {
            return Ok(());
        };
        let Some(file) = self.files.get_mut(selector) else {
            warn!("file selector {selector} is out of range");
            return Ok(());
        };
        let value = bank.read_u32(address)?;
        let slots = file.meta_mut().slots_mut();
        if address == l.access_offset() {
            slots.set_offset(op, value);
        } else {
            slots.set_length(op, value);
        }
        Ok(())
    }

    /// Dispatch the selected operation on the selected file and record its
    /// outcome in that file's per-operation slots.
    fn execute(&mut self, bank: &mut RegisterBank) -> Result<(), RegisterError> {
        let l = self.layout;
        let selector = bank.read_u32(l.file_selector())?;
        let Some(op) = self.selected_op(bank)? else {
            return Ok(());
        };
        let Some(file) = self.files.get_mut(selector) else {
            warn!("execute ignored: file selector {selector} is out of range");
            return Ok(());
        };
        debug!("execute {op} on selector {selector} ({})", file.meta().name());

        let outcome = match op {
            OpKind::Open => {
                // Unknown raw modes fall through to read-write, like the
                // stream-mode mapping they end up in.
                let mode = OpenMode::from_raw(bank.read_u32(l.open_mode())?)
                    .unwrap_or(OpenMode::ReadWrite);
                let outcome = file.open(mode);
                if outcome.is_success() {
                    bank.write_u32(l.file_size(), file.meta().size())?;
                }
                outcome
            }
            OpKind::Close => file.close(),
            OpKind::Read => {
                let slots = file.meta().slots();
                let (len, offset) = (slots.length(OpKind::Read), slots.offset(OpKind::Read));
                let mut window = BufferWindow {
                    bank: &mut *bank,
                    address: l.access_buffer(),
                };
                file.read(
                    len,
                    offset,
                    FileIo {
                        scratch: self.scratch.as_mut_slice(),
                        buffer: &mut window,
                    },
                )
            }
            OpKind::Write => {
                let slots = file.meta().slots();
                let (len, offset) = (slots.length(OpKind::Write), slots.offset(OpKind::Write));
                let outcome = {
                    let mut window = BufferWindow {
                        bank: &mut *bank,
                        address: l.access_buffer(),
                    };
                    file.write(
                        len,
                        offset,
                        FileIo {
                            scratch: self.scratch.as_mut_slice(),
                            buffer: &mut window,
                        },
                    )
                };
                if outcome.is_success() {
                    let cached = bank.read_u32(l.file_size())?;
                    bank.write_u32(l.file_size(), cached.wrapping_add(outcome.value))?;
                }
                outcome
            }
            OpKind::Delete => file.delete(),
        };

        // Each operation kind remembers its own last status and result.
        file.meta_mut().slots_mut().record(op, outcome);
        Ok(())
    }
}

impl RegisterSink for TransferEngine {
    fn pre_read(&mut self, address: u32, bank: &mut RegisterBank) -> Result<(), RegisterError> {
        let l = self.layout;
        let per_op = address == l.access_offset()
            || address == l.access_length()
            || address == l.operation_status()
            || address == l.operation_result();
        if !per_op && address != l.file_size() {
            return Ok(());
        }

        let selector = bank.read_u32(l.file_selector())?;
        let Some(file) = self.files.get(selector) else {
            warn!("file selector {selector} is out of range; register left stale");
            return Ok(());
        };

        if address == l.file_size() {
            return bank.write_u32(address, file.meta().size());
        }

        let Some(op) = self.selected_op(bank)? else {
            return Ok(());
        };
        let slots = file.meta().slots();
        let value = if address == l.access_offset() {
            slots.offset(op)
        } else if address == l.access_length() {
            slots.length(op)
        } else if address == l.operation_status() {
            slots.status(op)
        } else {
            slots.result(op)
        };
        bank.write_u32(address, value)
    }

    fn post_write(&mut self, address: u32, bank: &mut RegisterBank) -> Result<(), RegisterError> {
        let l = self.layout;
        if address == l.file_selector() {
            self.revalidate_open_mode(bank)
        } else if address == l.operation_execute() {
            self.execute(bank)
        } else if address == l.access_offset() || address == l.access_length() {
            self.stage(address, bank)
        } else {
            Ok(())
        }
    }
}
