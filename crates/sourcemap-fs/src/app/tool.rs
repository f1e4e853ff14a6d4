//! Navigation tools: the chooser and the chunk, module and symbol browsers.
//!
//! A tool is bound to exactly one dataset and reacts to abstract [`Action`]s. Anything it wants
//! the swimlane to do comes back as [`ToolEvent`]s.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::app::dataset::{Dataset, DatasetHandle, Store};
use crate::app::search::{self, SearchContext, SearchOutcome};
use crate::domain::errors::NavigationError;
use crate::domain::model::{ChunkId, Item, ModuleId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToolId(u64);

impl ToolId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Chooser,
    Chunks,
    Modules,
    Symbols,
}

impl ToolKind {
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Chooser => "tools",
            ToolKind::Chunks => "chunks",
            ToolKind::Modules => "modules",
            ToolKind::Symbols => "symbols",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolState {
    Unbound,
    /// Bound to a dataset that is still being filled.
    Loading,
    Ready,
}

/// Input understood by every tool, independent of how the host maps keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Previous,
    Next,
    Proceed,
    Cancel,
    BeginInput,
    Input(char),
    Backspace,
    Submit,
    Escape,
}

#[derive(Debug)]
pub enum ToolEvent {
    SelectItem(Item),
    /// Append this tool to the swimlane.
    Proceed(Box<Tool>),
    Cancel,
}

/// Mutable session state a tool may touch while handling an action.
pub struct ToolContext<'a> {
    pub store: &'a mut Store,
    pub search: SearchContext<'a>,
}

/// One button of the tool chooser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChooserOption {
    pub kind: ToolKind,
    pub count: usize,
}

impl ChooserOption {
    pub fn label(&self) -> String {
        match self.kind {
            ToolKind::Symbols if self.count == 0 => "symbols".to_owned(),
            kind => format!("{} (x{})", kind.name(), self.count),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChooserView {
    parent: Option<ToolKind>,
    options: Vec<ChooserOption>,
    cursor: Option<usize>,
}

impl ChooserView {
    fn new(parent: Option<ToolKind>) -> Self {
        let options = [ToolKind::Chunks, ToolKind::Modules, ToolKind::Symbols]
            .into_iter()
            .filter(|kind| Some(*kind) != parent)
            .map(|kind| ChooserOption { kind, count: 0 })
            .collect();
        Self {
            parent,
            options,
            cursor: None,
        }
    }

    pub fn parent(&self) -> Option<ToolKind> {
        self.parent
    }

    pub fn options(&self) -> &[ChooserOption] {
        &self.options
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    fn refresh(&mut self, dataset: &Dataset) {
        for option in &mut self.options {
            option.count = match option.kind {
                ToolKind::Chunks => dataset.chunks.len(),
                ToolKind::Modules => dataset.modules.len(),
                ToolKind::Symbols => dataset.symbols.len(),
                ToolKind::Chooser => 0,
            };
        }
        if self.cursor.is_none() {
            self.cursor = self.options.iter().position(|option| option.count > 0);
        }
    }

    /// The only chunk or module on offer, if there is exactly one.
    fn single_item(&self, dataset: &Dataset) -> Option<Item> {
        let mut items = self.options.iter().flat_map(|option| -> Vec<Item> {
            match option.kind {
                ToolKind::Chunks => dataset.chunks.iter().copied().map(Item::Chunk).collect(),
                ToolKind::Modules => dataset.modules.iter().copied().map(Item::Module).collect(),
                ToolKind::Symbols | ToolKind::Chooser => Vec::new(),
            }
        });
        match (items.next(), items.next()) {
            (Some(item), None) => Some(item),
            _ => None,
        }
    }

    fn step(&mut self, forward: bool) {
        let len = self.options.len();
        if len == 0 {
            return;
        }
        self.cursor = Some(match self.cursor {
            None => 0,
            Some(cursor) if forward => (cursor + 1) % len,
            Some(0) => len - 1,
            Some(cursor) => cursor - 1,
        });
    }

    fn selected_kind(&self) -> Option<ToolKind> {
        self.cursor
            .and_then(|cursor| self.options.get(cursor))
            .map(|option| option.kind)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChunkList {
    rows: Vec<ChunkId>,
    cursor: usize,
}

impl ChunkList {
    pub fn rows(&self) -> &[ChunkId] {
        &self.rows
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<ChunkId> {
        self.rows.get(self.cursor).copied()
    }

    /// Row label: the chunk name plus how many modules it maps.
    pub fn row_label(store: &Store, id: ChunkId) -> String {
        let chunk = store.chunk(id);
        format!("{} (m{})", chunk.label(), chunk.modules.len())
    }

    fn refresh(&mut self, dataset: &Dataset) {
        let selected = self.selected();
        self.rows = dataset.chunks.clone();
        self.cursor = selected
            .and_then(|id| self.rows.iter().position(|row| *row == id))
            .unwrap_or(0);
    }

    fn select_next(&mut self) {
        if self.cursor + 1 < self.rows.len() {
            self.cursor += 1;
        }
    }

    fn select_previous(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    /// Directory row, keyed by its full path.
    Dir(String),
    Module(ModuleId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub node: TreeNode,
    pub name: String,
    pub depth: usize,
    /// Chunks for a module, modules below it for a directory.
    pub count: usize,
}

/// Module paths folded into a fully expanded directory tree.
#[derive(Debug, Clone, Default)]
pub struct ModuleTree {
    rows: Vec<TreeRow>,
    cursor: usize,
}

impl ModuleTree {
    pub fn rows(&self) -> &[TreeRow] {
        &self.rows
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<&TreeNode> {
        self.rows.get(self.cursor).map(|row| &row.node)
    }

    /// Build the rows for `modules`, directories before their contents.
    pub fn build_rows(store: &Store, modules: &[ModuleId]) -> Vec<TreeRow> {
        let mut sorted = modules.to_vec();
        sorted.sort_by(|a, b| store.module(*a).path.cmp(&store.module(*b).path));

        let mut rows: Vec<TreeRow> = Vec::with_capacity(sorted.len());
        let mut dir_rows: HashMap<String, usize> = HashMap::new();

        for id in sorted {
            let module = store.module(id);
            let parts: Vec<&str> = module.path.split('/').filter(|part| !part.is_empty()).collect();
            let (name, dirs) = match parts.split_last() {
                Some((name, dirs)) => (name.to_string(), dirs),
                None => (module.path.clone(), &[][..]),
            };

            let mut key = String::new();
            for (depth, dir) in dirs.iter().enumerate() {
                if !key.is_empty() {
                    key.push('/');
                }
                key.push_str(dir);
                let index = *dir_rows.entry(key.clone()).or_insert_with(|| {
                    rows.push(TreeRow {
                        node: TreeNode::Dir(key.clone()),
                        name: dir.to_string(),
                        depth,
                        count: 0,
                    });
                    rows.len() - 1
                });
                rows[index].count += 1;
            }

            rows.push(TreeRow {
                node: TreeNode::Module(id),
                name,
                depth: dirs.len(),
                count: module.chunks.len(),
            });
        }
        rows
    }

    fn refresh(&mut self, store: &Store, dataset: &Dataset) {
        let selected = self.selected().cloned();
        self.rows = Self::build_rows(store, &dataset.modules);
        self.cursor = selected
            .and_then(|node| self.rows.iter().position(|row| row.node == node))
            .unwrap_or(0);
    }

    fn select_next(&mut self) {
        if self.cursor + 1 < self.rows.len() {
            self.cursor += 1;
        }
    }

    fn select_previous(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }
}

/// Search box plus the outcome of the last search.
#[derive(Debug, Clone, Default)]
pub struct SymbolPanel {
    query: String,
    editing: bool,
    outcome: Option<SearchOutcome>,
    scroll: usize,
}

impl SymbolPanel {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn outcome(&self) -> Option<&SearchOutcome> {
        self.outcome.as_ref()
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    fn hit_count(&self) -> usize {
        match &self.outcome {
            Some(SearchOutcome::Matches(results)) => results.hits.len(),
            _ => 0,
        }
    }

    fn handle_input(&mut self, action: Action, parent: &Dataset, ctx: &mut ToolContext<'_>) {
        match action {
            Action::Input(ch) => self.query.push(ch),
            Action::Backspace => {
                self.query.pop();
            }
            Action::Escape | Action::Cancel => self.editing = false,
            Action::Submit => {
                if self.query.trim().is_empty() {
                    return;
                }
                self.editing = false;
                self.run(parent, ctx);
            }
            _ => {}
        }
    }

    fn run(&mut self, parent: &Dataset, ctx: &mut ToolContext<'_>) {
        match search::search(ctx.store, parent, &self.query, &ctx.search) {
            Ok(Some(outcome)) => {
                self.outcome = Some(outcome);
                self.scroll = 0;
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(query = %self.query, error = %err, "search pattern rejected");
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum ToolView {
    Chooser(ChooserView),
    Chunks(ChunkList),
    Modules(ModuleTree),
    Symbols(SymbolPanel),
}

#[derive(Debug)]
pub struct Tool {
    id: ToolId,
    state: ToolState,
    dataset: Option<DatasetHandle>,
    selected_item: Option<Item>,
    view: ToolView,
}

impl Tool {
    /// Offers the browsers not already represented by `parent`.
    pub fn chooser(parent: Option<ToolKind>) -> Self {
        Self::with_view(ToolView::Chooser(ChooserView::new(parent)))
    }

    pub fn browser(kind: ToolKind) -> Self {
        Self::with_view(match kind {
            ToolKind::Chunks => ToolView::Chunks(ChunkList::default()),
            ToolKind::Modules => ToolView::Modules(ModuleTree::default()),
            ToolKind::Symbols => ToolView::Symbols(SymbolPanel::default()),
            ToolKind::Chooser => ToolView::Chooser(ChooserView::new(None)),
        })
    }

    fn with_view(view: ToolView) -> Self {
        Self {
            id: ToolId::next(),
            state: ToolState::Unbound,
            dataset: None,
            selected_item: None,
            view,
        }
    }

    fn bound(mut self, dataset: DatasetHandle) -> Self {
        self.dataset = Some(dataset);
        self.state = ToolState::Loading;
        self
    }

    pub fn id(&self) -> ToolId {
        self.id
    }

    pub fn kind(&self) -> ToolKind {
        match self.view {
            ToolView::Chooser(_) => ToolKind::Chooser,
            ToolView::Chunks(_) => ToolKind::Chunks,
            ToolView::Modules(_) => ToolKind::Modules,
            ToolView::Symbols(_) => ToolKind::Symbols,
        }
    }

    pub fn state(&self) -> ToolState {
        self.state
    }

    pub fn view(&self) -> &ToolView {
        &self.view
    }

    pub fn selected_item(&self) -> Option<Item> {
        self.selected_item
    }

    pub fn dataset(&self) -> Option<&DatasetHandle> {
        self.dataset.as_ref()
    }

    /// Whether the tool wants raw text input rather than navigation.
    pub fn is_capturing_input(&self) -> bool {
        matches!(&self.view, ToolView::Symbols(panel) if panel.editing)
    }

    /// Attach the dataset this tool navigates. A tool is bound at most once.
    ///
    /// The view is populated by the next [`refresh`](Self::refresh).
    pub fn bind(&mut self, dataset: DatasetHandle) -> Result<(), NavigationError> {
        if self.dataset.is_some() {
            return Err(NavigationError::AlreadyBound);
        }
        self.dataset = Some(dataset);
        self.state = ToolState::Loading;
        Ok(())
    }

    /// Re-read the bound dataset. Called on bind and on every loader progress notification.
    ///
    /// A chooser that becomes ready with a single chunk or module on offer selects it.
    pub fn refresh(&mut self, store: &Store) -> Vec<ToolEvent> {
        let Some(handle) = self.dataset.clone() else {
            return Vec::new();
        };
        let dataset = handle.borrow();

        match &mut self.view {
            ToolView::Chooser(view) => view.refresh(&dataset),
            ToolView::Chunks(list) => list.refresh(&dataset),
            ToolView::Modules(tree) => tree.refresh(store, &dataset),
            ToolView::Symbols(_) => {}
        }

        let was_ready = self.state == ToolState::Ready;
        self.state = if dataset.loaded {
            ToolState::Ready
        } else {
            ToolState::Loading
        };
        if was_ready || self.state != ToolState::Ready {
            return Vec::new();
        }

        if let ToolView::Chooser(view) = &self.view
            && let Some(item) = view.single_item(&dataset)
        {
            self.selected_item = Some(item);
            return vec![ToolEvent::SelectItem(item)];
        }
        Vec::new()
    }

    pub fn handle(&mut self, action: Action, ctx: &mut ToolContext<'_>) -> Vec<ToolEvent> {
        if self.state == ToolState::Unbound {
            return Vec::new();
        }
        let Some(handle) = self.dataset.clone() else {
            return Vec::new();
        };

        if let ToolView::Symbols(panel) = &mut self.view
            && panel.editing
        {
            panel.handle_input(action, &handle.borrow(), ctx);
            return Vec::new();
        }
        if action == Action::Cancel {
            return vec![ToolEvent::Cancel];
        }

        match &mut self.view {
            ToolView::Chooser(view) => match action {
                Action::Previous => view.step(false),
                Action::Next => view.step(true),
                Action::Proceed => {
                    if let Some(kind) = view.selected_kind() {
                        let next = Tool::browser(kind).bound(handle);
                        return vec![ToolEvent::Proceed(Box::new(next))];
                    }
                }
                _ => {}
            },
            ToolView::Chunks(list) => match action {
                Action::Previous => list.select_previous(),
                Action::Next => list.select_next(),
                Action::Proceed => {
                    if let Some(chunk) = list.selected() {
                        let item = Item::Chunk(chunk);
                        self.selected_item = Some(item);
                        let narrowed = handle.borrow().narrow_to_chunk(ctx.store, chunk);
                        let next = Tool::chooser(Some(ToolKind::Chunks)).bound(narrowed.into_handle());
                        return vec![ToolEvent::SelectItem(item), ToolEvent::Proceed(Box::new(next))];
                    }
                }
                _ => {}
            },
            ToolView::Modules(tree) => match action {
                Action::Previous => tree.select_previous(),
                Action::Next => tree.select_next(),
                Action::Proceed => match tree.selected().cloned() {
                    Some(TreeNode::Dir(_)) => tree.select_next(),
                    Some(TreeNode::Module(module)) => {
                        let item = Item::Module(module);
                        self.selected_item = Some(item);
                        let narrowed = handle.borrow().narrow_to_module(ctx.store, module);
                        let next = Tool::chooser(Some(ToolKind::Modules)).bound(narrowed.into_handle());
                        return vec![ToolEvent::SelectItem(item), ToolEvent::Proceed(Box::new(next))];
                    }
                    None => {}
                },
                _ => {}
            },
            ToolView::Symbols(panel) => match action {
                Action::BeginInput => {
                    panel.query.clear();
                    panel.editing = true;
                }
                Action::Previous => panel.scroll = panel.scroll.saturating_sub(1),
                Action::Next => {
                    if panel.scroll + 1 < panel.hit_count() {
                        panel.scroll += 1;
                    }
                }
                Action::Proceed => {
                    if let Some(next) = panel.outcome.as_ref().and_then(SearchOutcome::dataset) {
                        let next = Tool::chooser(Some(ToolKind::Symbols)).bound(next.clone().into_handle());
                        return vec![ToolEvent::Proceed(Box::new(next))];
                    }
                }
                _ => {}
            },
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::app::dataset::tests::sample_store;
    use crate::app::loader::SourceRules;
    use crate::domain::model::{Mapping, SymbolRef};
    use crate::infra::config::LoaderConfig;
    use crate::infra::decoder::SourcemapDecoder;

    fn act(tool: &mut Tool, store: &mut Store, action: Action) -> Vec<ToolEvent> {
        let rules = SourceRules::from_config(&LoaderConfig::default()).unwrap();
        let mut ctx = ToolContext {
            store,
            search: SearchContext {
                decoder: &SourcemapDecoder,
                rules: &rules,
                context_chars: 64,
            },
        };
        tool.handle(action, &mut ctx)
    }

    fn bound(mut tool: Tool, store: &Store, dataset: Dataset) -> (Tool, Vec<ToolEvent>) {
        tool.bind(dataset.into_handle()).unwrap();
        let events = tool.refresh(store);
        (tool, events)
    }

    fn proceeded(events: Vec<ToolEvent>) -> Tool {
        events
            .into_iter()
            .find_map(|event| match event {
                ToolEvent::Proceed(tool) => Some(*tool),
                _ => None,
            })
            .expect("proceed event")
    }

    #[test]
    fn binding_twice_is_rejected() {
        let mut tool = Tool::chooser(None);
        assert_eq!(tool.state(), ToolState::Unbound);
        tool.bind(Dataset::default().into_handle()).unwrap();
        assert_eq!(
            tool.bind(Dataset::default().into_handle()),
            Err(NavigationError::AlreadyBound)
        );
    }

    #[test]
    fn unbound_tool_ignores_actions() {
        let (mut store, _) = sample_store();
        let mut tool = Tool::browser(ToolKind::Chunks);
        for action in [Action::Next, Action::Proceed, Action::Cancel] {
            assert!(act(&mut tool, &mut store, action).is_empty());
        }
    }

    #[test]
    fn chooser_offers_counts_minus_parent() {
        let (store, dataset) = sample_store();
        let (tool, events) = bound(Tool::chooser(Some(ToolKind::Chunks)), &store, dataset);
        assert!(events.is_empty());
        let ToolView::Chooser(view) = tool.view() else {
            panic!("expected chooser");
        };
        let labels: Vec<String> = view.options().iter().map(ChooserOption::label).collect();
        assert_eq!(labels, vec!["modules (x2)", "symbols"]);
        assert_eq!(view.cursor(), Some(0));
    }

    #[test]
    fn chooser_highlights_first_non_empty_option() {
        let (store, dataset) = sample_store();
        let only_modules = Dataset::narrowed(Vec::new(), dataset.modules, Vec::new());
        let (tool, _) = bound(Tool::chooser(None), &store, only_modules);
        let ToolView::Chooser(view) = tool.view() else {
            panic!("expected chooser");
        };
        assert_eq!(view.cursor(), Some(1));
    }

    #[test]
    fn chooser_auto_selects_single_item_once_loaded() {
        let (store, dataset) = sample_store();
        let x = dataset.modules[0];
        let handle = Dataset {
            modules: vec![x],
            ..Dataset::loading()
        }
        .into_handle();

        let mut tool = Tool::chooser(Some(ToolKind::Chunks));
        tool.bind(handle.clone()).unwrap();
        assert!(tool.refresh(&store).is_empty());
        assert_eq!(tool.state(), ToolState::Loading);

        handle.borrow_mut().loaded = true;
        let events = tool.refresh(&store);
        assert!(matches!(events.as_slice(), [ToolEvent::SelectItem(Item::Module(id))] if *id == x));
        assert_eq!(tool.selected_item(), Some(Item::Module(x)));
        assert_eq!(tool.state(), ToolState::Ready);
        assert!(tool.refresh(&store).is_empty());
    }

    #[test]
    fn chooser_counts_chunks_and_modules_together() {
        let (store, dataset) = sample_store();
        let single = Dataset::narrowed(vec![dataset.chunks[0]], vec![dataset.modules[0]], Vec::new());
        let (tool, events) = bound(Tool::chooser(None), &store, single);
        assert!(events.is_empty());
        assert_eq!(tool.selected_item(), None);
    }

    #[test]
    fn chooser_proceeds_into_browser_on_same_dataset() {
        let (mut store, dataset) = sample_store();
        let (mut tool, _) = bound(Tool::chooser(None), &store, dataset);
        act(&mut tool, &mut store, Action::Next);
        let next = proceeded(act(&mut tool, &mut store, Action::Proceed));
        assert_eq!(next.kind(), ToolKind::Modules);
        assert!(std::rc::Rc::ptr_eq(
            next.dataset().unwrap(),
            tool.dataset().unwrap()
        ));
    }

    #[test]
    fn chunk_browser_selects_then_narrows() {
        let (mut store, dataset) = sample_store();
        let a = dataset.chunks[0];
        let x = dataset.modules[0];
        let (mut tool, _) = bound(Tool::browser(ToolKind::Chunks), &store, dataset);

        let ToolView::Chunks(list) = tool.view() else {
            panic!("expected chunk list");
        };
        assert_eq!(ChunkList::row_label(&store, list.rows()[0]), "a (m1)");

        let events = act(&mut tool, &mut store, Action::Proceed);
        assert!(matches!(events[0], ToolEvent::SelectItem(Item::Chunk(id)) if id == a));
        assert_eq!(tool.selected_item(), Some(Item::Chunk(a)));

        let chooser = proceeded(events);
        assert_eq!(chooser.kind(), ToolKind::Chooser);
        let narrowed = chooser.dataset().unwrap().borrow().clone();
        assert_eq!(narrowed.chunks, vec![a]);
        assert_eq!(narrowed.modules, vec![x]);
    }

    #[test]
    fn module_tree_groups_by_directory() {
        let (store, dataset) = sample_store();
        let rows = ModuleTree::build_rows(&store, &dataset.modules);
        let summary: Vec<(String, usize, usize)> = rows
            .iter()
            .map(|row| (row.name.clone(), row.depth, row.count))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("src".to_string(), 0, 2),
                ("x.js".to_string(), 1, 2),
                ("y.js".to_string(), 1, 1),
            ]
        );
    }

    #[test]
    fn module_browser_drills_through_directories() {
        let (mut store, dataset) = sample_store();
        let x = dataset.modules[0];
        let (mut tool, _) = bound(Tool::browser(ToolKind::Modules), &store, dataset);

        assert!(act(&mut tool, &mut store, Action::Proceed).is_empty());
        let ToolView::Modules(tree) = tool.view() else {
            panic!("expected module tree");
        };
        assert_eq!(tree.cursor(), 1);

        let events = act(&mut tool, &mut store, Action::Proceed);
        assert!(matches!(events[0], ToolEvent::SelectItem(Item::Module(id)) if id == x));
        let chooser = proceeded(events);
        let narrowed = chooser.dataset().unwrap().borrow().clone();
        assert_eq!(narrowed.modules, vec![x]);
        assert_eq!(narrowed.chunks.len(), 2);
    }

    #[test]
    fn cancel_is_forwarded_outside_input_mode() {
        let (mut store, dataset) = sample_store();
        let (mut tool, _) = bound(Tool::browser(ToolKind::Symbols), &store, dataset);
        assert!(matches!(
            act(&mut tool, &mut store, Action::Cancel).as_slice(),
            [ToolEvent::Cancel]
        ));

        act(&mut tool, &mut store, Action::BeginInput);
        assert!(tool.is_capturing_input());
        assert!(act(&mut tool, &mut store, Action::Cancel).is_empty());
        assert!(!tool.is_capturing_input());
    }

    fn searchable_store() -> (Store, Dataset) {
        let (mut store, dataset) = sample_store();
        for chunk in &dataset.chunks {
            store.chunk_mut(*chunk).mappings_loaded = true;
        }
        let y = dataset.modules[1];
        store.module_mut(y).mappings.push(Mapping {
            generated_line: 0,
            generated_column: 0,
            original_line: 0,
            original_column: 0,
            name: None,
        });
        (store, dataset)
    }

    fn type_query(tool: &mut Tool, store: &mut Store, query: &str) {
        act(tool, store, Action::BeginInput);
        for ch in query.chars() {
            act(tool, store, Action::Input(ch));
        }
        act(tool, store, Action::Submit);
    }

    #[test]
    fn symbol_search_enables_proceed() {
        let (mut store, dataset) = searchable_store();
        let y = dataset.modules[1];
        let (mut tool, _) = bound(Tool::browser(ToolKind::Symbols), &store, dataset);

        assert!(act(&mut tool, &mut store, Action::Proceed).is_empty());

        type_query(&mut tool, &mut store, "let*");
        assert!(!tool.is_capturing_input());
        let chooser = proceeded(act(&mut tool, &mut store, Action::Proceed));
        let narrowed = chooser.dataset().unwrap().borrow().clone();
        assert_eq!(narrowed.modules, vec![y]);
        assert_eq!(
            narrowed.symbols,
            vec![SymbolRef {
                module: y,
                line: 0,
                column: 0
            }]
        );
        let ToolView::Chooser(view) = chooser.view() else {
            panic!("expected chooser");
        };
        assert_eq!(view.parent(), Some(ToolKind::Symbols));
    }

    #[test]
    fn blank_or_unmatched_search_does_not_proceed() {
        let (mut store, dataset) = searchable_store();
        let (mut tool, _) = bound(Tool::browser(ToolKind::Symbols), &store, dataset);

        type_query(&mut tool, &mut store, "   ");
        assert!(tool.is_capturing_input());
        act(&mut tool, &mut store, Action::Escape);

        type_query(&mut tool, &mut store, "missing");
        let ToolView::Symbols(panel) = tool.view() else {
            panic!("expected symbol panel");
        };
        assert!(matches!(panel.outcome(), Some(SearchOutcome::NoMatches { .. })));
        assert!(act(&mut tool, &mut store, Action::Proceed).is_empty());
    }
}
