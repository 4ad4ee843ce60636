// File: src/module.rs
//
// Module source retrieval for `from "<module>"` imports.
// The parser only needs raw bytes for a module id; where they come from is
// up to the ModuleReader implementation. Readers never cache: importing the
// same id twice reads it twice.

use crate::errors::{ErrorKind, SprigError};
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File extension for Sprig source files
pub const SOURCE_EXTENSION: &str = "sprig";

/// Maps a module id to its source bytes
pub trait ModuleReader {
    fn read(&self, module: &str) -> Result<Vec<u8>, SprigError>;
}

fn not_found(module: &str) -> SprigError {
    SprigError::new(ErrorKind::ImportError, format!("Module not found: {}", module))
}

/// Resolves module ids against a list of directories
#[derive(Debug, Clone)]
pub struct FsModuleReader {
    search_paths: Vec<PathBuf>,
}

impl FsModuleReader {
    /// Creates a reader with the default search paths
    pub fn new() -> Self {
        FsModuleReader {
            search_paths: vec![
                PathBuf::from("."),         // Current directory
                PathBuf::from("./modules"), // Local modules directory
            ],
        }
    }

    /// Creates a reader searching only `paths`, in order
    pub fn with_search_paths(paths: Vec<PathBuf>) -> Self {
        FsModuleReader { search_paths: paths }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Resolves a module id to a file path
    ///
    /// `math` resolves to `math.sprig` in the first search path containing it;
    /// an id that already names a file (`lib/math.sprig`) is tried as written
    /// inside each search path too.
    pub fn resolve_module_path(&self, module: &str) -> Option<PathBuf> {
        let direct = Path::new(module);
        let filename = if direct.extension().is_some() {
            direct.to_path_buf()
        } else {
            PathBuf::from(format!("{}.{}", module, SOURCE_EXTENSION))
        };

        if filename.is_absolute() {
            return filename.is_file().then_some(filename);
        }

        self.search_paths
            .iter()
            .map(|search_path| search_path.join(&filename))
            .find(|full_path| full_path.is_file())
    }
}

impl Default for FsModuleReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleReader for FsModuleReader {
    fn read(&self, module: &str) -> Result<Vec<u8>, SprigError> {
        let path = self.resolve_module_path(module).ok_or_else(|| {
            not_found(module).with_note(format!(
                "searched: {}",
                self.search_paths
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;

        debug!("module '{}' resolved to {}", module, path.display());

        fs::read(&path).map_err(|e| {
            SprigError::new(
                ErrorKind::ImportError,
                format!("Failed to read module {}: {}", module, e),
            )
        })
    }
}

/// In-memory module bucket, keyed by module id
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    modules: HashMap<String, Vec<u8>>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a module and returns the reader for chaining
    pub fn with_module(mut self, module: &str, source: &str) -> Self {
        self.insert(module, source);
        self
    }

    pub fn insert(&mut self, module: &str, source: &str) {
        self.modules.insert(module.to_string(), source.as_bytes().to_vec());
    }
}

impl ModuleReader for MemoryReader {
    fn read(&self, module: &str) -> Result<Vec<u8>, SprigError> {
        self.modules.get(module).cloned().ok_or_else(|| not_found(module))
    }
}
