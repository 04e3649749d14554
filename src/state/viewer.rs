use crate::search::{search, SearchState};
use crate::tree::{NodeIdx, Sheet, TopicTree};

/// Search mark of a single topic row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub(crate) enum NodeMark {
    #[default]
    None,
    Highlight,
    Dim,
}

/// Everything the view needs to draw one topic row. The view is a pure
/// function of this value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct NodeVisual {
    pub expanded: bool,
    pub focused: bool,
    pub mark: NodeMark,
}

/// All mutable viewer state for one loaded sheet.
///
/// Created on load, replaced wholesale on reload. The tree itself never
/// changes; only expansion, focus, search and the two overlays do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ViewerState {
    tree: TopicTree,
    sheet_title: String,

    /// Per node; only meaningful for nodes with children.
    expanded: Vec<bool>,

    focused: Option<NodeIdx>,
    /// Bumped on every `focus` so the view scrolls again even when the
    /// same node is focused twice.
    focus_seq: u64,

    search: SearchState,
    /// Expansion as it was before the current search started.
    pre_search_expanded: Option<Vec<bool>>,

    sidebar_open: bool,
    open_note: Option<NodeIdx>,
}

impl ViewerState {
    pub(crate) fn new(sheet: &Sheet) -> Self {
        Self::from_tree(sheet.title.clone(), TopicTree::from_topic(&sheet.root_topic))
    }

    pub(crate) fn from_tree(sheet_title: String, tree: TopicTree) -> Self {
        let expanded = tree.iter().map(|(_, n)| !n.collapsed).collect();
        Self {
            tree,
            sheet_title,
            expanded,
            focused: None,
            focus_seq: 0,
            search: SearchState::default(),
            pre_search_expanded: None,
            sidebar_open: false,
            open_note: None,
        }
    }

    pub(crate) fn tree(&self) -> &TopicTree {
        &self.tree
    }

    pub(crate) fn sheet_title(&self) -> &str {
        &self.sheet_title
    }

    pub(crate) fn search_state(&self) -> &SearchState {
        &self.search
    }

    pub(crate) fn sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    pub(crate) fn open_note(&self) -> Option<NodeIdx> {
        self.open_note
    }

    pub(crate) fn focused(&self) -> Option<NodeIdx> {
        self.focused
    }

    /// Increments once per scroll request; the focused node is the target.
    pub(crate) fn focus_seq(&self) -> u64 {
        self.focus_seq
    }

    pub(crate) fn is_expanded(&self, idx: NodeIdx) -> bool {
        self.tree.has_children(idx) && self.expanded.get(idx).copied().unwrap_or(false)
    }

    pub(crate) fn mark(&self, idx: NodeIdx) -> NodeMark {
        if !self.search.is_active() {
            NodeMark::None
        } else if self.search.is_match(idx) {
            NodeMark::Highlight
        } else {
            NodeMark::Dim
        }
    }

    pub(crate) fn visual(&self, idx: NodeIdx) -> NodeVisual {
        NodeVisual {
            expanded: self.is_expanded(idx),
            focused: self.focused == Some(idx),
            mark: self.mark(idx),
        }
    }

    /// Flip one node's children container. Descendants keep their own state.
    pub(crate) fn toggle(&mut self, idx: NodeIdx) -> bool {
        if !self.tree.has_children(idx) {
            return false;
        }
        self.expanded[idx] = !self.expanded[idx];
        self.keep_expansion();
        true
    }

    pub(crate) fn expand_all(&mut self) {
        self.set_all(true);
        self.keep_expansion();
    }

    pub(crate) fn collapse_all(&mut self) {
        self.set_all(false);
        self.keep_expansion();
    }

    /// The user shaped the expansion during a search; clearing the search
    /// must not roll that back.
    fn keep_expansion(&mut self) {
        self.pre_search_expanded = None;
    }

    fn set_all(&mut self, value: bool) {
        for (idx, flag) in self.expanded.iter_mut().enumerate() {
            if self.tree.has_children(idx) {
                *flag = value;
            }
        }
    }

    pub(crate) fn expand_ancestors(&mut self, idx: NodeIdx) {
        for a in self.tree.ancestors(idx) {
            self.expanded[a] = true;
        }
    }

    /// Move the focus marker to `idx`, reveal it and request a scroll.
    pub(crate) fn focus(&mut self, idx: NodeIdx) {
        if self.tree.get(idx).is_none() {
            return;
        }
        self.focused = Some(idx);
        self.focus_seq += 1;
        self.expand_ancestors(idx);
        self.keep_expansion();
    }

    /// Recompute the search for `query`. An empty query leaves search mode.
    pub(crate) fn apply_query(&mut self, query: &str) {
        if query.is_empty() {
            self.clear_search();
            return;
        }

        if !self.search.is_active() {
            self.pre_search_expanded = Some(self.expanded.clone());
        }

        self.search = search(&self.tree, query);
        self.focused = None;

        let hits = self.search.matches.iter().map(|m| m.node).collect::<Vec<_>>();
        for idx in hits {
            self.expand_ancestors(idx);
        }
        self.sidebar_open = true;
    }

    /// Drop search marks and results. The pre-search expansion comes back
    /// unless the user changed expansion in the meantime. The sidebar stays as
    /// it is.
    pub(crate) fn clear_search(&mut self) {
        self.search = SearchState::default();
        self.focused = None;
        if let Some(prev) = self.pre_search_expanded.take() {
            self.expanded = prev;
        }
    }

    pub(crate) fn next_result(&mut self) -> Option<NodeIdx> {
        let idx = self.search.next()?;
        self.focus(idx);
        Some(idx)
    }

    pub(crate) fn select_result(&mut self, index: usize) -> Option<NodeIdx> {
        let idx = self.search.select(index)?;
        self.focus(idx);
        Some(idx)
    }

    pub(crate) fn open_sidebar(&mut self) {
        self.sidebar_open = true;
    }

    pub(crate) fn close_sidebar(&mut self) {
        self.clear_search();
        self.sidebar_open = false;
    }

    pub(crate) fn show_note(&mut self, idx: NodeIdx) {
        let has_note = self.tree.get(idx).is_some_and(|n| n.notes.is_some());
        self.open_note = has_note.then_some(idx);
    }

    pub(crate) fn hide_note(&mut self) {
        self.open_note = None;
    }
}
