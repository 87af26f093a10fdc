// CLASSIFICATION: COMMUNITY
// Filename: registers.rs v0.6
// Date Modified: 2026-07-03
// Author: Lukas Bower

//! Addressable register surface.
//!
//! [`RegisterBank`] is plain storage: word cells and block cells looked up
//! by address, no behavior attached. [`RegisterFile`] is what a peer talks
//! to: it owns the bank together with a [`RegisterSink`] and drives the
//! sink's pre/post hooks around every peer access, enforcing each
//! register's declared access mode. All protocol behavior lives in the
//! sink; the surface stays dumb on purpose.

use crate::file::AccessMode;

/// Publication metadata for one register: its feature name, address, byte
/// length, and peer-facing access mode.
#[derive(Debug, Clone, Copy)]
pub struct RegisterDef {
    /// Feature name exposed to the peer.
    pub name: &'static str,
    /// Byte address of the register.
    pub address: u32,
    /// Register length in bytes.
    pub len: u32,
    /// Peer-facing access mode.
    pub access: AccessMode,
}

/// Errors raised by the register surface.
///
/// These indicate a misconfigured map or an out-of-contract peer access;
/// file-operation failures never surface here.
#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    /// No register is published at this address.
    #[error("no register at address {0:#010x}")]
    UnknownAddress(u32),
    /// The register's access mode forbids this access.
    #[error("access denied at address {0:#010x}")]
    AccessDenied(u32),
    /// A new register would overlap one already published.
    #[error("register at {0:#010x} overlaps an existing register")]
    AddressOverlap(u32),
    /// Word access on a block register.
    #[error("register at {0:#010x} is not a word register")]
    NotAWordRegister(u32),
    /// Block access on a word register.
    #[error("register at {0:#010x} is not a block register")]
    NotABlockRegister(u32),
    /// Block window larger than the register.
    #[error("block access of {requested} bytes exceeds register of {capacity} bytes")]
    BlockOutOfRange {
        /// Bytes the access asked for.
        requested: usize,
        /// Capacity of the block register.
        capacity: usize,
    },
    /// Publishing was attempted with no files registered.
    #[error("cannot publish file-access registers with no files registered")]
    EmptyRegistry,
}

enum Cell {
    Word(u32),
    Block(Vec<u8>),
}

struct Entry {
    def: RegisterDef,
    cell: Cell,
}

/// Raw register storage addressed by byte address.
#[derive(Default)]
pub struct RegisterBank {
    entries: Vec<Entry>,
}

impl RegisterBank {
    /// Create an empty bank.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a 4-byte word register.
    pub fn add_word(&mut self, def: RegisterDef) -> Result<(), RegisterError> {
        self.add(def, Cell::Word(0))
    }

    /// Publish a zero-initialized block register of `def.len` bytes.
    pub fn add_block(&mut self, def: RegisterDef) -> Result<(), RegisterError> {
        let block = vec![0u8; def.len as usize];
        self.add(def, Cell::Block(block))
    }

    fn add(&mut self, def: RegisterDef, cell: Cell) -> Result<(), RegisterError> {
        let new_start = u64::from(def.address);
        let new_end = new_start + u64::from(def.len);
        for entry in &self.entries {
            let start = u64::from(entry.def.address);
            let end = start + u64::from(entry.def.len);
            if new_start < end && start < new_end {
                return Err(RegisterError::AddressOverlap(def.address));
            }
        }
        self.entries.push(Entry { def, cell });
        Ok(())
    }

    /// Published register definitions, in publication order.
    pub fn defs(&self) -> impl Iterator<Item = &RegisterDef> {
        self.entries.iter().map(|e| &e.def)
    }

    /// Definition of the register at `address`, if any.
    #[must_use]
    pub fn def(&self, address: u32) -> Option<&RegisterDef> {
        self.entries
            .iter()
            .find(|e| e.def.address == address)
            .map(|e| &e.def)
    }

    fn entry(&self, address: u32) -> Result<&Entry, RegisterError> {
        self.entries
            .iter()
            .find(|e| e.def.address == address)
            .ok_or(RegisterError::UnknownAddress(address))
    }

    fn entry_mut(&mut self, address: u32) -> Result<&mut Entry, RegisterError> {
        self.entries
            .iter_mut()
            .find(|e| e.def.address == address)
            .ok_or(RegisterError::UnknownAddress(address))
    }

    /// Value of the word register at `address`.
    pub fn read_u32(&self, address: u32) -> Result<u32, RegisterError> {
        match &self.entry(address)?.cell {
            Cell::Word(value) => Ok(*value),
            Cell::Block(_) => Err(RegisterError::NotAWordRegister(address)),
        }
    }

    /// Store `value` into the word register at `address`.
    pub fn write_u32(&mut self, address: u32, value: u32) -> Result<(), RegisterError> {
        match &mut self.entry_mut(address)?.cell {
            Cell::Word(cell) => {
                *cell = value;
                Ok(())
            }
            Cell::Block(_) => Err(RegisterError::NotAWordRegister(address)),
        }
    }

    /// Copy the leading `into.len()` bytes of the block register at
    /// `address`.
    pub fn read_block(&self, address: u32, into: &mut [u8]) -> Result<(), RegisterError> {
        match &self.entry(address)?.cell {
            Cell::Block(block) => {
                if into.len() > block.len() {
                    return Err(RegisterError::BlockOutOfRange {
                        requested: into.len(),
                        capacity: block.len(),
                    });
                }
                into.copy_from_slice(&block[..into.len()]);
                Ok(())
            }
            Cell::Word(_) => Err(RegisterError::NotABlockRegister(address)),
        }
    }

    /// Overwrite the leading bytes of the block register at `address`.
    pub fn write_block(&mut self, address: u32, from: &[u8]) -> Result<(), RegisterError> {
        match &mut self.entry_mut(address)?.cell {
            Cell::Block(block) => {
                if from.len() > block.len() {
                    return Err(RegisterError::BlockOutOfRange {
                        requested: from.len(),
                        capacity: block.len(),
                    });
                }
                block[..from.len()].copy_from_slice(from);
                Ok(())
            }
            Cell::Word(_) => Err(RegisterError::NotABlockRegister(address)),
        }
    }
}

/// Hooks invoked around peer accesses, keyed by register address.
///
/// The sink receives the whole bank so it can consult and refresh other
/// registers while servicing one address. Unused hooks keep their no-op
/// defaults.
pub trait RegisterSink {
    /// Called before a peer read completes. Write-on-read registers
    /// refresh their content here.
    fn pre_read(&mut self, address: u32, bank: &mut RegisterBank) -> Result<(), RegisterError> {
        let _ = (address, bank);
        Ok(())
    }

    /// Called after a peer read completed.
    fn post_read(&mut self, address: u32, bank: &mut RegisterBank) -> Result<(), RegisterError> {
        let _ = (address, bank);
        Ok(())
    }

    /// Called before a peer write is stored.
    fn pre_write(&mut self, address: u32, bank: &mut RegisterBank) -> Result<(), RegisterError> {
        let _ = (address, bank);
        Ok(())
    }

    /// Called after a peer write was stored. Command registers react here.
    fn post_write(&mut self, address: u32, bank: &mut RegisterBank) -> Result<(), RegisterError> {
        let _ = (address, bank);
        Ok(())
    }
}

/// Peer-facing register surface: owns the bank and the sink attached to it.
///
/// Taking ownership of the sink is what makes the register set live; a
/// sink that registers files can no longer grow once it is attached here.
pub struct RegisterFile<S> {
    bank: RegisterBank,
    sink: S,
}

impl<S: RegisterSink> RegisterFile<S> {
    /// Attach `sink` to a published bank.
    pub fn new(bank: RegisterBank, sink: S) -> Self {
        Self { bank, sink }
    }

    /// The underlying bank.
    #[must_use]
    pub fn bank(&self) -> &RegisterBank {
        &self.bank
    }

    /// The attached sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn check(&self, address: u32, write: bool) -> Result<(), RegisterError> {
        let def = self
            .bank
            .def(address)
            .ok_or(RegisterError::UnknownAddress(address))?;
        let allowed = if write {
            def.access.writable()
        } else {
            def.access.readable()
        };
        if allowed {
            Ok(())
        } else {
            Err(RegisterError::AccessDenied(address))
        }
    }

    /// Peer read of a word register.
    pub fn host_read(&mut self, address: u32) -> Result<u32, RegisterError> {
        self.check(address, false)?;
        self.sink.pre_read(address, &mut self.bank)?;
        let value = self.bank.read_u32(address)?;
        self.sink.post_read(address, &mut self.bank)?;
        Ok(value)
    }

    /// Peer write of a word register.
    pub fn host_write(&mut self, address: u32, value: u32) -> Result<(), RegisterError> {
        self.check(address, true)?;
        self.sink.pre_write(address, &mut self.bank)?;
        self.bank.write_u32(address, value)?;
        self.sink.post_write(address, &mut self.bank)?;
        Ok(())
    }

    /// Peer read of a block register.
    pub fn host_read_block(&mut self, address: u32, into: &mut [u8]) -> Result<(), RegisterError> {
        self.check(address, false)?;
        self.sink.pre_read(address, &mut self.bank)?;
        self.bank.read_block(address, into)?;
        self.sink.post_read(address, &mut self.bank)?;
        Ok(())
    }

    /// Peer write of a block register.
    pub fn host_write_block(&mut self, address: u32, from: &[u8]) -> Result<(), RegisterError> {
        self.check(address, true)?;
        self.sink.pre_write(address, &mut self.bank)?;
        self.bank.write_block(address, from)?;
        self.sink.post_write(address, &mut self.bank)?;
        Ok(())
    }
}
