//! Domain models for chunks, modules, mappings and selectable items.

use std::fmt;
use std::path::PathBuf;

/// Index of a [`Chunk`] in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(pub(crate) u32);

/// Index of a [`Module`] in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub(crate) u32);

impl ChunkId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ModuleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One parsed sourcemap file and the modules it maps.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub path: PathBuf,
    /// File name of the sourcemap, used for display and ordering.
    pub name: String,
    pub modules: Vec<ModuleId>,
    /// Set as soon as mapping parsing starts, so it is never attempted twice.
    pub mappings_loaded: bool,
}

impl Chunk {
    /// Short label with the usual bundle suffixes removed.
    pub fn label(&self) -> &str {
        self.name
            .strip_suffix(".js.map")
            .or_else(|| self.name.strip_suffix(".map"))
            .unwrap_or(&self.name)
    }
}

/// One original source file referenced by one or more chunks.
#[derive(Debug, Clone)]
pub struct Module {
    /// Normalized display path, protocol prefixes stripped.
    pub path: String,
    /// Path exactly as written in the sourcemap's `sources`.
    pub raw_path: String,
    pub source: Option<String>,
    pub chunks: Vec<ChunkId>,
    pub mappings: Vec<Mapping>,
}

/// Generated position to original position correspondence. All fields are 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    pub generated_line: u32,
    pub generated_column: u32,
    pub original_line: u32,
    pub original_column: u32,
    pub name: Option<String>,
}

/// A single symbol search hit, identified by where it starts in the original source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolRef {
    pub module: ModuleId,
    pub line: u32,
    /// UTF-16 column, matching sourcemap column semantics.
    pub column: u32,
}

/// Anything a tool can select. Equality is identity of the underlying entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Item {
    Chunk(ChunkId),
    Module(ModuleId),
    Symbol(SymbolRef),
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Chunk(id) => write!(f, "chunk#{}", id.0),
            Item::Module(id) => write!(f, "module#{}", id.0),
            Item::Symbol(symbol) => write!(
                f,
                "symbol#{}:{}:{}",
                symbol.module.0, symbol.line, symbol.column
            ),
        }
    }
}
