//! Left-to-right stack of tools; the newest tool has focus.

use crate::app::dataset::Store;
use crate::app::tool::{Action, Tool, ToolContext, ToolEvent, ToolId, ToolState};
use crate::domain::model::Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwimlaneEvent {
    ToolAppended(ToolId),
    ToolRemoved(ToolId),
    ItemSelected(Item),
}

#[derive(Debug, Default)]
pub struct Swimlane {
    tools: Vec<Tool>,
    focused: Option<ToolId>,
}

impl Swimlane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn focused_id(&self) -> Option<ToolId> {
        self.focused
    }

    pub fn focused(&self) -> Option<&Tool> {
        let id = self.focused?;
        self.tools.iter().find(|tool| tool.id() == id)
    }

    /// Selected item of every tool, in swimlane order.
    pub fn selected_items(&self) -> Vec<Option<Item>> {
        self.tools.iter().map(Tool::selected_item).collect()
    }

    /// Push `tool`, focus it, then deliver whatever it emits on its first refresh.
    pub fn append_tool(&mut self, tool: Tool, store: &Store) -> Vec<SwimlaneEvent> {
        let mut out = Vec::new();
        self.append_into(tool, store, &mut out);
        out
    }

    /// Remove `id` and focus the new rightmost tool. Unknown ids are ignored.
    pub fn remove_tool(&mut self, id: ToolId) -> Vec<SwimlaneEvent> {
        let Some(index) = self.tools.iter().position(|tool| tool.id() == id) else {
            return Vec::new();
        };
        self.tools.remove(index);
        self.focused = self.tools.last().map(Tool::id);
        tracing::debug!(tools = self.tools.len(), "tool removed");
        vec![SwimlaneEvent::ToolRemoved(id)]
    }

    /// Route `action` to the focused tool and apply the events it produces.
    pub fn dispatch(&mut self, action: Action, ctx: &mut ToolContext<'_>) -> Vec<SwimlaneEvent> {
        let Some(id) = self.focused else {
            return Vec::new();
        };
        let Some(tool) = self.tools.iter_mut().find(|tool| tool.id() == id) else {
            return Vec::new();
        };
        let events = tool.handle(action, ctx);

        let mut out = Vec::new();
        self.deliver(id, events, ctx.store, &mut out);
        out
    }

    /// Refresh every tool whose dataset is still loading.
    pub fn notify_progress(&mut self, store: &Store) -> Vec<SwimlaneEvent> {
        let mut out = Vec::new();
        let pending: Vec<ToolId> = self
            .tools
            .iter()
            .filter(|tool| tool.state() == ToolState::Loading)
            .map(Tool::id)
            .collect();
        for id in pending {
            if let Some(tool) = self.tools.iter_mut().find(|tool| tool.id() == id) {
                let events = tool.refresh(store);
                self.deliver(id, events, store, &mut out);
            }
        }
        out
    }

    fn append_into(&mut self, mut tool: Tool, store: &Store, out: &mut Vec<SwimlaneEvent>) {
        let id = tool.id();
        let events = tool.refresh(store);
        tracing::debug!(kind = tool.kind().name(), tools = self.tools.len() + 1, "tool appended");
        self.tools.push(tool);
        self.focused = Some(id);
        out.push(SwimlaneEvent::ToolAppended(id));
        self.deliver(id, events, store, out);
    }

    fn deliver(
        &mut self,
        source: ToolId,
        events: Vec<ToolEvent>,
        store: &Store,
        out: &mut Vec<SwimlaneEvent>,
    ) {
        for event in events {
            match event {
                ToolEvent::SelectItem(item) => out.push(SwimlaneEvent::ItemSelected(item)),
                ToolEvent::Proceed(next) => self.append_into(*next, store, out),
                ToolEvent::Cancel => {
                    if self.tools.len() > 1 {
                        out.extend(self.remove_tool(source));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::app::dataset::Dataset;
    use crate::app::dataset::tests::sample_store;
    use crate::app::loader::SourceRules;
    use crate::app::search::SearchContext;
    use crate::app::tool::ToolKind;
    use crate::infra::config::LoaderConfig;
    use crate::infra::decoder::SourcemapDecoder;

    fn dispatch(lane: &mut Swimlane, store: &mut Store, action: Action) -> Vec<SwimlaneEvent> {
        let rules = SourceRules::from_config(&LoaderConfig::default()).unwrap();
        let mut ctx = ToolContext {
            store,
            search: SearchContext {
                decoder: &SourcemapDecoder,
                rules: &rules,
                context_chars: 64,
            },
        };
        lane.dispatch(action, &mut ctx)
    }

    fn root_lane(store: &Store, dataset: Dataset) -> Swimlane {
        let mut lane = Swimlane::new();
        let mut root = Tool::chooser(None);
        root.bind(dataset.into_handle()).unwrap();
        lane.append_tool(root, store);
        lane
    }

    #[test]
    fn append_focuses_newest_tool() {
        let (store, dataset) = sample_store();
        let mut lane = root_lane(&store, dataset.clone());
        let first = lane.focused_id().unwrap();

        let mut next = Tool::browser(ToolKind::Chunks);
        next.bind(dataset.into_handle()).unwrap();
        let id = next.id();
        let events = lane.append_tool(next, &store);

        assert_eq!(events, vec![SwimlaneEvent::ToolAppended(id)]);
        assert_eq!(lane.focused_id(), Some(id));
        assert_ne!(first, id);
        assert_eq!(lane.len(), 2);
    }

    #[test]
    fn proceed_chain_appends_tools() {
        let (mut store, dataset) = sample_store();
        let mut lane = root_lane(&store, dataset);

        // Chooser -> chunk browser -> chooser narrowed to chunk a.
        dispatch(&mut lane, &mut store, Action::Proceed);
        let events = dispatch(&mut lane, &mut store, Action::Proceed);

        assert_eq!(lane.len(), 3);
        assert!(matches!(events[0], SwimlaneEvent::ItemSelected(Item::Chunk(_))));
        assert!(matches!(events[1], SwimlaneEvent::ToolAppended(_)));
        // Chunk a has one module, so the narrowed chooser selects it straight away.
        assert!(matches!(events[2], SwimlaneEvent::ItemSelected(Item::Module(_))));
        assert_eq!(lane.focused_id(), lane.tools().last().map(Tool::id));
    }

    #[test]
    fn cancel_removes_focused_tool_but_never_the_last() {
        let (mut store, dataset) = sample_store();
        let mut lane = root_lane(&store, dataset);
        let root = lane.focused_id();

        dispatch(&mut lane, &mut store, Action::Proceed);
        assert_eq!(lane.len(), 2);

        let events = dispatch(&mut lane, &mut store, Action::Cancel);
        assert!(matches!(events.as_slice(), [SwimlaneEvent::ToolRemoved(_)]));
        assert_eq!(lane.len(), 1);
        assert_eq!(lane.focused_id(), root);

        assert!(dispatch(&mut lane, &mut store, Action::Cancel).is_empty());
        assert_eq!(lane.len(), 1);
    }

    #[test]
    fn removing_everything_clears_focus() {
        let (store, dataset) = sample_store();
        let mut lane = root_lane(&store, dataset);
        let id = lane.focused_id().unwrap();
        assert_eq!(lane.remove_tool(id), vec![SwimlaneEvent::ToolRemoved(id)]);
        assert!(lane.is_empty());
        assert_eq!(lane.focused_id(), None);
        assert!(lane.remove_tool(id).is_empty());
    }

    #[test]
    fn progress_refreshes_loading_tools() {
        let (store, dataset) = sample_store();
        let handle = Dataset {
            modules: vec![dataset.modules[0]],
            ..Dataset::loading()
        }
        .into_handle();

        let mut lane = Swimlane::new();
        let mut tool = Tool::chooser(Some(ToolKind::Chunks));
        tool.bind(handle.clone()).unwrap();
        lane.append_tool(tool, &store);
        assert!(lane.notify_progress(&store).is_empty());

        handle.borrow_mut().loaded = true;
        let events = lane.notify_progress(&store);
        assert!(matches!(events.as_slice(), [SwimlaneEvent::ItemSelected(Item::Module(_))]));
        assert!(lane.notify_progress(&store).is_empty());
    }
}
