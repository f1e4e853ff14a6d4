//! Arena of chunks and modules plus the narrowed views tools work on.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use crate::app::intersect::intersect;
use crate::domain::model::{Chunk, ChunkId, Module, ModuleId, SymbolRef};

/// Owns every chunk and module discovered in a session.
///
/// Modules are keyed by their raw sourcemap path so that a source listed by several chunks is
/// one shared entity. Everything else refers to entries by id.
#[derive(Debug, Default)]
pub struct Store {
    chunks: Vec<Chunk>,
    modules: Vec<Module>,
    by_raw_path: HashMap<String, ModuleId>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunk(&self, id: ChunkId) -> &Chunk {
        &self.chunks[id.index()]
    }

    pub fn chunk_mut(&mut self, id: ChunkId) -> &mut Chunk {
        &mut self.chunks[id.index()]
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.index()]
    }

    pub fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.index()]
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn module_by_raw_path(&self, raw_path: &str) -> Option<ModuleId> {
        self.by_raw_path.get(raw_path).copied()
    }

    pub fn add_chunk(&mut self, path: PathBuf) -> ChunkId {
        let id = ChunkId(self.chunks.len() as u32);
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.chunks.push(Chunk {
            path,
            name,
            modules: Vec::new(),
            mappings_loaded: false,
        });
        id
    }

    /// Attach the source `raw_path` to `chunk`, creating the module on first sight.
    ///
    /// Returns the module id and whether it was newly created.
    pub fn link_module(
        &mut self,
        chunk: ChunkId,
        raw_path: &str,
        display_path: String,
        source: Option<String>,
    ) -> (ModuleId, bool) {
        let (id, created) = match self.by_raw_path.get(raw_path) {
            Some(id) => (*id, false),
            None => {
                let id = ModuleId(self.modules.len() as u32);
                self.modules.push(Module {
                    path: display_path,
                    raw_path: raw_path.to_owned(),
                    source: None,
                    chunks: Vec::new(),
                    mappings: Vec::new(),
                });
                self.by_raw_path.insert(raw_path.to_owned(), id);
                (id, true)
            }
        };

        let module = &mut self.modules[id.index()];
        if module.source.is_none() {
            module.source = source;
        }
        if !module.chunks.contains(&chunk) {
            module.chunks.push(chunk);
        }
        let chunk = &mut self.chunks[chunk.index()];
        if !chunk.modules.contains(&id) {
            chunk.modules.push(id);
        }
        (id, created)
    }
}

/// Loader progress, as processed and total file counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
}

impl Progress {
    /// Completion percentage; an empty load counts as complete.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.processed.min(self.total) * 100) / self.total) as u8
    }
}

/// The working set visible to a tool.
///
/// Narrowing always produces a new dataset whose chunks and modules are subsets of the
/// parent's. Only the root dataset is ever mutated, by the loader, while `loaded` is false.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub chunks: Vec<ChunkId>,
    pub modules: Vec<ModuleId>,
    pub symbols: Vec<SymbolRef>,
    pub loaded: bool,
    /// Present while a background load feeds this dataset; cleared once `loaded` is set.
    pub progress: Option<Progress>,
}

/// Shared handle; the root dataset is observed through the same handle while it loads.
pub type DatasetHandle = Rc<RefCell<Dataset>>;

impl Dataset {
    /// An empty dataset that a loader is about to fill.
    pub fn loading() -> Self {
        Self {
            progress: Some(Progress::default()),
            ..Self::default()
        }
    }

    /// A finished dataset, as produced by narrowing.
    pub fn narrowed(chunks: Vec<ChunkId>, modules: Vec<ModuleId>, symbols: Vec<SymbolRef>) -> Self {
        Self {
            chunks,
            modules,
            symbols,
            loaded: true,
            progress: None,
        }
    }

    pub fn into_handle(self) -> DatasetHandle {
        Rc::new(RefCell::new(self))
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty() && self.modules.is_empty() && self.symbols.is_empty()
    }

    /// Working set after picking `chunk`.
    pub fn narrow_to_chunk(&self, store: &Store, chunk: ChunkId) -> Dataset {
        let modules = intersect(&store.chunk(chunk).modules, &self.modules);
        let symbols = self
            .symbols
            .iter()
            .copied()
            .filter(|symbol| modules.contains(&symbol.module))
            .collect();
        Dataset::narrowed(vec![chunk], modules, symbols)
    }

    /// Working set after picking `module`.
    pub fn narrow_to_module(&self, store: &Store, module: ModuleId) -> Dataset {
        let chunks = intersect(&store.module(module).chunks, &self.chunks);
        let symbols = self
            .symbols
            .iter()
            .copied()
            .filter(|symbol| symbol.module == module)
            .collect();
        Dataset::narrowed(chunks, vec![module], symbols)
    }

    /// Sort chunks by file name and modules by display path, as done when loading completes.
    pub fn sort_by_path(&mut self, store: &Store) {
        self.chunks
            .sort_by(|a, b| store.chunk(*a).name.cmp(&store.chunk(*b).name));
        self.modules
            .sort_by(|a, b| store.module(*a).path.cmp(&store.module(*b).path));
    }
}
