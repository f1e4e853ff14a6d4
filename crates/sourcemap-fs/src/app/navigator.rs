//! The navigation engine a host drives: loading, input dispatch, cycles and redraw timing.

use std::cell::Ref;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;

use anyhow::{Context, Result};

use crate::app::cycle::CycleDetector;
use crate::app::dataset::{Dataset, DatasetHandle, Store};
use crate::app::loader::{DatasetLoader, SourceRules};
use crate::app::rate_limit::{RedrawReason, RedrawScheduler};
use crate::app::search::SearchContext;
use crate::app::swimlane::{Swimlane, SwimlaneEvent};
use crate::app::tool::{Action, Tool, ToolContext, ToolId};
use crate::domain::model::Item;
use crate::infra::config::Config;
use crate::infra::decoder::{MappingDecoder, SourcemapDecoder};

/// Everything a host may want to react to, drained with [`Navigator::drain_events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Root dataset load progress in percent.
    Progress(u8),
    DatasetReady,
    ItemSelected(Item),
    ToolAppended(ToolId),
    ToolRemoved(ToolId),
    LoadFailed { path: PathBuf, message: String },
}

pub struct Navigator {
    store: Store,
    root: DatasetHandle,
    loader: Option<DatasetLoader>,
    swimlane: Swimlane,
    cycles: CycleDetector,
    decoder: Box<dyn MappingDecoder>,
    rules: SourceRules,
    context_chars: usize,
    redraw: RedrawScheduler,
    /// Loader progress arrived while tree redraws were throttled.
    tree_stale: bool,
    failures: usize,
    events: Vec<EngineEvent>,
}

impl Navigator {
    /// Start exploring `dir`. Files are loaded by subsequent [`pump_loader`](Self::pump_loader) calls.
    pub fn open(dir: &Path, config: &Config) -> Result<Self> {
        Self::with_decoder(dir, config, Box::new(SourcemapDecoder))
    }

    pub fn with_decoder(
        dir: &Path,
        config: &Config,
        decoder: Box<dyn MappingDecoder>,
    ) -> Result<Self> {
        let rules = SourceRules::from_config(&config.loader)?;
        let loader = DatasetLoader::discover(dir, rules.clone())
            .with_context(|| format!("failed to open sourcemap directory {}", dir.display()))?;
        let render = &config.render;

        let mut navigator = Self {
            store: Store::new(),
            root: Dataset::loading().into_handle(),
            loader: Some(loader),
            swimlane: Swimlane::new(),
            cycles: CycleDetector::new(),
            decoder,
            rules,
            context_chars: config.search.context_chars(),
            redraw: RedrawScheduler::new(
                render.tree_interval(),
                render.chooser_interval(),
                render.search_interval(),
                render.cycle_interval(),
            ),
            tree_stale: false,
            failures: 0,
            events: Vec::new(),
        };

        let mut root_tool = Tool::chooser(None);
        root_tool.bind(Rc::clone(&navigator.root))?;
        let now = Instant::now();
        let events = navigator.swimlane.append_tool(root_tool, &navigator.store);
        navigator.absorb(events, now);
        navigator.redraw.request(RedrawReason::Input, now);
        Ok(navigator)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn swimlane(&self) -> &Swimlane {
        &self.swimlane
    }

    pub fn cycles(&self) -> &CycleDetector {
        &self.cycles
    }

    pub fn root(&self) -> Ref<'_, Dataset> {
        self.root.borrow()
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_some()
    }

    /// Number of sourcemap files that failed to load.
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Load one more file into the root dataset. Returns `false` once loading is over.
    pub fn pump_loader(&mut self, now: Instant) -> bool {
        let Some(loader) = self.loader.as_mut() else {
            return false;
        };
        let Some(step) = loader.step(&mut self.store, &mut self.root.borrow_mut()) else {
            self.loader = None;
            return false;
        };

        if let Some(err) = step.error {
            self.failures += 1;
            self.events.push(EngineEvent::LoadFailed {
                path: err.path().to_path_buf(),
                message: err.to_string(),
            });
        }
        self.events.push(EngineEvent::Progress(step.progress.percent()));

        if step.finished {
            self.loader = None;
            self.tree_stale = false;
            self.events.push(EngineEvent::DatasetReady);
            let events = self.swimlane.notify_progress(&self.store);
            self.absorb(events, now);
            // Completion is drawn right away.
            self.redraw.request(RedrawReason::Input, now);
            tracing::info!(
                files = step.progress.total,
                failures = self.failures,
                "sourcemap directory loaded"
            );
            return false;
        }

        if self.redraw.request(RedrawReason::Tree, now) {
            self.refresh_loading_tools(now);
        } else {
            self.tree_stale = true;
        }
        true
    }

    /// Drive the loader to completion.
    pub fn finish_loading(&mut self, now: Instant) {
        while self.pump_loader(now) {}
    }

    /// Send `action` to the focused tool.
    pub fn dispatch(&mut self, action: Action, now: Instant) {
        let mut ctx = ToolContext {
            store: &mut self.store,
            search: SearchContext {
                decoder: self.decoder.as_ref(),
                rules: &self.rules,
                context_chars: self.context_chars,
            },
        };
        let events = self.swimlane.dispatch(action, &mut ctx);

        let reason = match action {
            Action::Submit => RedrawReason::Search,
            _ => RedrawReason::Input,
        };
        self.redraw.request(reason, now);
        self.absorb(events, now);
    }

    /// Whether the host should redraw now. Throttled tree refreshes are applied first.
    pub fn poll_redraw(&mut self, now: Instant) -> bool {
        let due = self.redraw.poll(now);
        if due && self.tree_stale {
            self.refresh_loading_tools(now);
        }
        due
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    fn refresh_loading_tools(&mut self, now: Instant) {
        self.tree_stale = false;
        let events = self.swimlane.notify_progress(&self.store);
        self.absorb(events, now);
    }

    fn absorb(&mut self, events: Vec<SwimlaneEvent>, now: Instant) {
        if events.is_empty() {
            return;
        }
        for event in events {
            self.events.push(match event {
                SwimlaneEvent::ToolAppended(id) => EngineEvent::ToolAppended(id),
                SwimlaneEvent::ToolRemoved(id) => EngineEvent::ToolRemoved(id),
                SwimlaneEvent::ItemSelected(item) => EngineEvent::ItemSelected(item),
            });
        }
        if self.cycles.update(&self.swimlane.selected_items()) {
            self.redraw.request(RedrawReason::Cycle, now);
        }
        self.redraw.request(RedrawReason::Chooser, now);
    }
}
