pub(crate) mod click;
pub(crate) mod viewer;

pub(crate) use click::{ClickGate, ClickOutcome, DOUBLE_CLICK_WINDOW_MS};
pub(crate) use viewer::{NodeMark, NodeVisual, ViewerState};

use crate::config::ViewerConfig;
use crate::storage::{clear_session, load_session, Session};
use leptos::prelude::*;

#[derive(Clone, Copy)]
pub(crate) struct AppState {
    pub config: StoredValue<ViewerConfig>,

    /// Mirrors the session flags; `None` means "not signed in".
    pub session: RwSignal<Option<Session>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            config: StoredValue::new(ViewerConfig::from_window()),
            session: RwSignal::new(load_session()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.get().is_some()
    }

    pub fn logout(&self) {
        clear_session();
        self.session.set(None);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
pub(crate) struct AppContext(pub AppState);

/// The loaded sheet's state, shared by every component of the viewer page.
#[derive(Clone, Copy)]
pub(crate) struct ViewerContext(pub RwSignal<ViewerState>);
