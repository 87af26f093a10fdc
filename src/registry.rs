// CLASSIFICATION: COMMUNITY
// Filename: registry.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-06-02

//! Ordered, owning collection of virtual files.
//!
//! Insertion order is the wire contract: the file selector register indexes
//! this registry, and a file keeps its index for the life of the process.

use crate::file::VirtualFile;

/// Owner of every registered virtual file, indexed by the selector value.
#[derive(Default)]
pub struct FileRegistry {
    files: Vec<Box<dyn VirtualFile>>,
}

impl FileRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file. Its selector index is the registry length before the
    /// call and never changes afterwards.
    pub fn add(&mut self, file: Box<dyn VirtualFile>) {
        self.files.push(file);
    }

    /// File at `selector`, if any.
    #[must_use]
    pub fn get(&self, selector: u32) -> Option<&dyn VirtualFile> {
        self.files.get(selector as usize).map(|f| f.as_ref())
    }

    /// Mutable file at `selector`, if any.
    pub fn get_mut(&mut self, selector: u32) -> Option<&mut (dyn VirtualFile + '_)> {
        self.files.get_mut(selector as usize).map(|f| f.as_mut() as &mut dyn VirtualFile)
    }

    /// Number of registered files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True when no file has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate the files in selector order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn VirtualFile> {
        self.files.iter().map(|f| f.as_ref())
    }
}
