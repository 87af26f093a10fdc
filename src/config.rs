// CLASSIFICATION: COMMUNITY
// Filename: config.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-07-11

//! Declarative file-set configuration.
//!
//! A JSON document names the virtual files a device exposes, so deployments
//! can change the file set without recompiling:
//!
//! ```json
//! {
//!   "base_address": 536870912,
//!   "files": [
//!     { "name": "FirmwareScratch", "kind": "memory", "capacity": 5242880 },
//!     { "name": "Settings", "kind": "disk", "path": "settings.bin",
//!       "access": "rw", "binary": true }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::disk_file::DiskFile;
use crate::engine::TransferEngine;
use crate::file::{AccessMode, VirtualFile, DEFAULT_BASE_ADDRESS};
use crate::mem_file::MemoryFile;

/// Errors raised while loading or applying a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    /// The config document could not be parsed.
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A memory file declaration is missing its capacity.
    #[error("memory file {0:?} declares no capacity")]
    MissingCapacity(String),
    /// A disk file declaration is missing its storage path.
    #[error("disk file {0:?} declares no path")]
    MissingPath(String),
    /// A memory file declaration asks for an access mode other than
    /// write-only, which the backend cannot honor.
    #[error("memory file {0:?} must be write-only")]
    MemoryAccess(String),
    /// The configuration declares no files at all.
    #[error("config declares no files")]
    NoFiles,
}

/// Storage backend selected by a file declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Volatile in-memory file.
    Memory,
    /// File persisted on the host filesystem.
    Disk,
}

/// Access mode spelled the way configs spell it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessSpec {
    /// Read-only.
    Ro,
    /// Write-only.
    Wo,
    /// Read-write.
    Rw,
}

impl AccessSpec {
    fn as_mode(self) -> AccessMode {
        match self {
            AccessSpec::Ro => AccessMode::ReadOnly,
            AccessSpec::Wo => AccessMode::WriteOnly,
            AccessSpec::Rw => AccessMode::ReadWrite,
        }
    }
}

/// One virtual file declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct FileDecl {
    /// Display name used for selector enumeration.
    pub name: String,
    /// Backend kind.
    pub kind: FileKind,
    /// Capacity in bytes; required for memory files.
    #[serde(default)]
    pub capacity: Option<u32>,
    /// Storage path; required for disk files.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Access mode; disk files default to read-write, memory files are
    /// always write-only.
    #[serde(default)]
    pub access: Option<AccessSpec>,
    /// Pad with `0x00` instead of spaces; disk files only.
    #[serde(default)]
    pub binary: bool,
}

impl FileDecl {
    fn build(&self) -> Result<Box<dyn VirtualFile>, ConfigError> {
        match self.kind {
            FileKind::Memory => {
                if let Some(access) = self.access {
                    if access != AccessSpec::Wo {
                        return Err(ConfigError::MemoryAccess(self.name.clone()));
                    }
                }
                let capacity = self
                    .capacity
                    .ok_or_else(|| ConfigError::MissingCapacity(self.name.clone()))?;
                Ok(Box::new(MemoryFile::new(self.name.as_str(), capacity)))
            }
            FileKind::Disk => {
                let path = self
                    .path
                    .as_ref()
                    .ok_or_else(|| ConfigError::MissingPath(self.name.clone()))?;
                let access = self
                    .access
                    .map(AccessSpec::as_mode)
                    .unwrap_or(AccessMode::ReadWrite);
                Ok(Box::new(DiskFile::new(
                    self.name.as_str(),
                    path,
                    access,
                    self.binary,
                )))
            }
        }
    }
}

/// Whole-engine configuration: register base address plus the file set.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Base address of the register block.
    #[serde(default = "default_base_address")]
    pub base_address: u32,
    /// Files to register, in selector order.
    pub files: Vec<FileDecl>,
}

fn default_base_address() -> u32 {
    DEFAULT_BASE_ADDRESS
}

impl EngineConfig {
    /// Parse a configuration from a JSON string.
    pub fn from_str(data: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(data)?)
    }

    /// Load a configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_str(&text)
    }

    /// Build an engine with every declared file registered.
    pub fn build(&self) -> Result<TransferEngine, ConfigError> {
        if self.files.is_empty() {
            return Err(ConfigError::NoFiles);
        }
        let mut engine = TransferEngine::new(self.base_address);
        for decl in &self.files {
            engine.add_file(decl.build()?);
        }
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO: &str = r#"{
        "files": [
            { "name": "scratch", "kind": "memory", "capacity": 1024 },
            { "name": "settings", "kind": "disk", "path": "settings.bin",
              "access": "rw", "binary": true },
            { "name": "device-log", "kind": "disk", "path": "device.log",
              "access": "ro" }
        ]
    }"#;

    #[test]
    fn parses_and_builds_the_demo_file_set() {
        let config = EngineConfig::from_str(DEMO).expect("parse");
        assert_eq!(config.base_address, DEFAULT_BASE_ADDRESS);

        let engine = config.build().expect("build");
        assert_eq!(engine.files().len(), 3);
        assert_eq!(engine.files().get(0).expect("scratch").meta().name(), "scratch");
        assert_eq!(
            engine.files().get(2).expect("log").meta().access(),
            AccessMode::ReadOnly
        );
    }

    #[test]
    fn memory_files_require_a_capacity() {
        let config =
            EngineConfig::from_str(r#"{ "files": [ { "name": "m", "kind": "memory" } ] }"#)
                .expect("parse");
        assert!(matches!(
            config.build(),
            Err(ConfigError::MissingCapacity(_))
        ));
    }

    #[test]
    fn disk_files_require_a_path() {
        let config = EngineConfig::from_str(r#"{ "files": [ { "name": "d", "kind": "disk" } ] }"#)
            .expect("parse");
        assert!(matches!(config.build(), Err(ConfigError::MissingPath(_))));
    }

    #[test]
    fn memory_files_reject_readable_access() {
        let config = EngineConfig::from_str(
            r#"{ "files": [ { "name": "m", "kind": "memory", "capacity": 16, "access": "rw" } ] }"#,
        )
        .expect("parse");
        assert!(matches!(config.build(), Err(ConfigError::MemoryAccess(_))));
    }

    #[test]
    fn empty_file_set_is_rejected() {
        let config = EngineConfig::from_str(r#"{ "files": [] }"#).expect("parse");
        assert!(matches!(config.build(), Err(ConfigError::NoFiles)));
    }
}
