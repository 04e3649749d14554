use crate::state::{
    ClickGate, ClickOutcome, NodeMark, NodeVisual, ViewerContext, ViewerState,
    DOUBLE_CLICK_WINDOW_MS,
};
use crate::tree::{NodeIdx, TopicTree};
use crate::util::{clear_timeout, note_lines, set_timeout};
use icons::{ChevronDown, ChevronRight, ExternalLink, StickyNote, X};
use leptos::ev;
use leptos::html;
use leptos::prelude::*;
use leptos_dom::helpers::window_event_listener;
use std::sync::{Arc, Mutex};
use wasm_bindgen::JsCast;

pub(crate) const POPUP_GAP: f64 = 5.0;
pub(crate) const POPUP_EDGE_MARGIN: f64 = 10.0;
const FADE_IN_DELAY_MS: i32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ExpandControl {
    Toggle,
    /// Static dot for leaves.
    LeafMarker,
}

/// Static (per-load) description of one topic row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TopicView {
    pub key: String,
    pub title: String,
    pub depth: usize,
    pub is_root: bool,
    pub has_note: bool,
    pub link: Option<String>,
    pub control: ExpandControl,
    /// `None` for leaves: no children container at all.
    pub children: Option<Vec<NodeIdx>>,
}

pub(crate) fn topic_view(tree: &TopicTree, idx: NodeIdx) -> Option<TopicView> {
    let n = tree.get(idx)?;
    let has_kids = !n.children.is_empty();
    Some(TopicView {
        key: n.key.clone(),
        title: n.title.clone(),
        depth: n.depth,
        is_root: n.parent.is_none(),
        has_note: n.notes.is_some(),
        link: n.hyperlink.clone(),
        control: if has_kids {
            ExpandControl::Toggle
        } else {
            ExpandControl::LeafMarker
        },
        children: has_kids.then(|| n.children.clone()),
    })
}

/// One view node per topic, depth-first, children order preserved.
pub(crate) fn render(tree: &TopicTree) -> Vec<TopicView> {
    (0..tree.len()).filter_map(|i| topic_view(tree, i)).collect()
}

pub(crate) fn dom_id(key: &str) -> String {
    format!("topic-{key}")
}

pub(crate) fn header_class(visual: NodeVisual) -> String {
    let mut class = vec![
        "topic-header flex items-center gap-1 rounded-md px-1.5 py-0.5 cursor-pointer transition-all duration-200 hover:bg-accent/60",
    ];
    match visual.mark {
        NodeMark::Highlight => class.push("search-highlight bg-yellow-100 ring-1 ring-yellow-300"),
        NodeMark::Dim => class.push("search-dim opacity-40"),
        NodeMark::None => {}
    }
    if visual.focused {
        class.push("search-focus ring-2 ring-blue-500 bg-blue-50");
    }
    class.join(" ")
}

pub(crate) fn title_class(is_root: bool) -> &'static str {
    if is_root {
        "topic-title flex-1 break-words font-bold text-sm"
    } else {
        "topic-title flex-1 break-words font-normal text-xs"
    }
}

pub(crate) fn children_class(expanded: bool) -> &'static str {
    if expanded {
        "children-container ml-3 border-l border-border pl-2"
    } else {
        "children-container hidden"
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Rect {
    pub left: f64,
    pub top: f64,
    pub bottom: f64,
}

impl From<web_sys::DomRect> for Rect {
    fn from(r: web_sys::DomRect) -> Self {
        Self {
            left: r.left(),
            top: r.top(),
            bottom: r.bottom(),
        }
    }
}

/// A settled header click. A lone click has no action of its own; a double
/// click toggles a parent. Returns whether the state changed.
pub(crate) fn settle_header_click(s: &mut ViewerState, idx: NodeIdx, double: bool) -> bool {
    double && s.toggle(idx)
}

/// Below the anchor, shifted left when it would overflow the right edge and
/// flipped above the anchor when it would overflow the bottom edge.
pub(crate) fn place_popup(anchor: Rect, size: (f64, f64), viewport: (f64, f64)) -> (f64, f64) {
    let (w, h) = size;
    let (vw, vh) = viewport;

    let mut left = anchor.left;
    let mut top = anchor.bottom + POPUP_GAP;

    if left + w > vw {
        left = (vw - w - POPUP_EDGE_MARGIN).max(0.0);
    }
    if top + h > vh {
        top = (anchor.top - h - POPUP_GAP).max(0.0);
    }
    (left, top)
}

fn viewport_size() -> (f64, f64) {
    let Some(w) = web_sys::window() else {
        return (0.0, 0.0);
    };
    let width = w.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let height = w.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    (width, height)
}

fn scroll_to_topic(key: &str) {
    let Some(el) = document().get_element_by_id(&dom_id(key)) else {
        return;
    };
    let opts = web_sys::ScrollIntoViewOptions::new();
    opts.set_behavior(web_sys::ScrollBehavior::Smooth);
    opts.set_block(web_sys::ScrollLogicalPosition::Center);
    el.scroll_into_view_with_scroll_into_view_options(&opts);
}

/// Where the open notes popup is anchored (the clicked icon).
#[derive(Clone, Copy)]
struct NoteAnchor(RwSignal<Rect>);

#[component]
pub fn MindmapTree() -> impl IntoView {
    let ViewerContext(state) = expect_context::<ViewerContext>();

    let anchor = RwSignal::new(Rect::default());
    provide_context(NoteAnchor(anchor));

    let root = state.with_untracked(|s| s.tree().root());

    // Scroll on every focus request, after ancestors had a tick to expand.
    let focus_seq = Memo::new(move |_| state.with(|s| s.focus_seq()));
    Effect::new(move |_| {
        if focus_seq.get() == 0 {
            return;
        }
        let key = state.with_untracked(|s| {
            s.focused()
                .and_then(|i| s.tree().get(i))
                .map(|n| n.key.clone())
        });
        if let Some(key) = key {
            set_timeout(0, move || scroll_to_topic(&key));
        }
    });

    let faded_in = RwSignal::new(false);
    set_timeout(FADE_IN_DELAY_MS, move || {
        let _ = faded_in.try_set(true);
    });

    view! {
        <div
            id="mindmapContainer"
            class=move || {
                if faded_in.get() {
                    "mindmap-tree space-y-0.5 transition-opacity duration-300 opacity-100"
                } else {
                    "mindmap-tree space-y-0.5 transition-opacity duration-300 opacity-0"
                }
            }
        >
            {match root {
                Some(idx) => view! { <TopicNode idx=idx /> }.into_any(),
                None => view! {
                    <div class="p-8 text-center text-sm text-muted-foreground">"Nothing to display"</div>
                }
                .into_any(),
            }}
        </div>
        <NotePopup />
    }
}

#[component]
pub fn TopicNode(idx: NodeIdx) -> AnyView {
    let ViewerContext(state) = expect_context::<ViewerContext>();
    let NoteAnchor(anchor) = expect_context::<NoteAnchor>();

    let Some(topic) = state.with_untracked(|s| topic_view(s.tree(), idx)) else {
        return ().into_any();
    };

    // Only this row re-renders when its own visual state changes.
    let visual = Memo::new(move |_| state.with(|s| s.visual(idx)));
    let gate = Arc::new(Mutex::new(ClickGate::default()));
    let has_kids = topic.control == ExpandControl::Toggle;

    let on_header_click = move |_ev: web_sys::MouseEvent| {
        let Ok(outcome) = gate.lock().map(|mut g| g.on_click()) else {
            return;
        };
        match outcome {
            ClickOutcome::StartTimer { ticket } => {
                let gate_for_timer = gate.clone();
                let handle = set_timeout(DOUBLE_CLICK_WINDOW_MS, move || {
                    let fired = gate_for_timer
                        .lock()
                        .map(|mut g| g.on_timeout(ticket))
                        .unwrap_or(false);
                    if fired {
                        state.maybe_update(|s| settle_header_click(s, idx, false));
                    }
                });
                if let (Some(h), Ok(mut g)) = (handle, gate.lock()) {
                    g.arm(ticket, h);
                }
            }
            ClickOutcome::Double { timer } => {
                if let Some(t) = timer {
                    clear_timeout(t);
                }
                state.maybe_update(|s| settle_header_click(s, idx, true));
            }
        }
    };

    let on_toggle = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        state.update(|s| {
            s.toggle(idx);
        });
    };

    let on_note = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        if let Some(el) = ev
            .current_target()
            .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
        {
            anchor.set(el.get_bounding_client_rect().into());
        }
        state.update(|s| s.show_note(idx));
    };

    let note_button = topic.has_note.then(|| {
        view! {
            <button
                type="button"
                class="note-icon rounded border border-amber-200 bg-amber-50 p-1 text-amber-600 transition-all duration-200 hover:scale-110 hover:bg-amber-100 hover:text-amber-800"
                title="View notes"
                on:click=on_note
            >
                <StickyNote class="size-3" />
            </button>
        }
    });

    let link_anchor = topic.link.clone().map(|href| {
        view! {
            <a
                class="link-icon rounded border border-blue-200 bg-blue-50 p-1 text-blue-600 transition-all duration-200 hover:scale-110 hover:bg-blue-100 hover:text-blue-800"
                title="Open link"
                href=href
                target="_blank"
                rel="noopener noreferrer"
                on:click=|ev: web_sys::MouseEvent| ev.stop_propagation()
            >
                <ExternalLink class="size-3" />
            </a>
        }
    });

    let control = if has_kids {
        view! {
            <button
                type="button"
                class="expand-btn flex size-5 shrink-0 items-center justify-center rounded text-muted-foreground transition-all duration-200 hover:text-foreground"
                title=move || if visual.get().expanded { "Collapse" } else { "Expand" }
                aria-expanded=move || visual.get().expanded.to_string()
                on:click=on_toggle
            >
                {move || if visual.get().expanded {
                    view! { <ChevronDown class="size-4" /> }.into_any()
                } else {
                    view! { <ChevronRight class="size-4" /> }.into_any()
                }}
            </button>
        }
        .into_any()
    } else {
        view! { <div class="mx-1.5 size-2 shrink-0 rounded-full bg-gray-400" /> }.into_any()
    };

    let children = topic.children.map(|kids| {
        view! {
            <div class=move || children_class(visual.get().expanded)>
                {kids
                    .into_iter()
                    .map(|c| view! { <TopicNode idx=c /> })
                    .collect_view()}
            </div>
        }
    });

    view! {
        <div
            class=if topic.is_root { "topic-item root-topic" } else { "topic-item" }
            id=dom_id(&topic.key)
            data-topic-id=topic.key.clone()
            data-level=topic.depth.to_string()
            data-mark=move || visual.get().mark.as_ref().to_string()
        >
            <div class=move || header_class(visual.get()) on:click=on_header_click>
                <div class="flex shrink-0 items-center gap-1">
                    {note_button}
                    {link_anchor}
                </div>
                {control}
                <span class=title_class(topic.is_root)>{topic.title.clone()}</span>
            </div>
            {children}
        </div>
    }
    .into_any()
}

#[component]
pub fn NotePopup() -> impl IntoView {
    let ViewerContext(state) = expect_context::<ViewerContext>();
    let NoteAnchor(anchor) = expect_context::<NoteAnchor>();

    let popup_ref: NodeRef<html::Div> = NodeRef::new();
    let position: RwSignal<(f64, f64)> = RwSignal::new((0.0, 0.0));

    let open = Memo::new(move |_| state.with(|s| s.open_note()));
    let lines = move || {
        open.get()
            .and_then(|i| state.with_untracked(|s| s.tree().get(i).and_then(|n| n.notes.clone())))
            .map(|n| note_lines(&n))
            .unwrap_or_default()
    };

    // First place it right under the icon, then clamp once its size is known.
    Effect::new(move |_| {
        if open.get().is_none() {
            return;
        }
        let a = anchor.get_untracked();
        position.set((a.left, a.bottom + POPUP_GAP));

        set_timeout(0, move || {
            let Some(el) = popup_ref.get_untracked() else {
                return;
            };
            let r = el.get_bounding_client_rect();
            let _ = position.try_set(place_popup(a, (r.width(), r.height()), viewport_size()));
        });
    });

    let outside_click = window_event_listener(ev::click, move |ev: web_sys::MouseEvent| {
        if state.with_untracked(|s| s.open_note()).is_none() {
            return;
        }
        let Some(target) = ev.target().and_then(|t| t.dyn_into::<web_sys::Element>().ok()) else {
            return;
        };
        // The icon that opened the popup is not "outside".
        if target.closest(".note-icon").ok().flatten().is_some() {
            return;
        }
        let inside = popup_ref
            .get_untracked()
            .map(|el| el.contains(Some(&target)))
            .unwrap_or(false);
        if !inside {
            state.update(|s| s.hide_note());
        }
    });
    on_cleanup(move || outside_click.remove());

    view! {
        <Show when=move || open.get().is_some()>
            <div
                node_ref=popup_ref
                id="notesPopup"
                class="fixed z-50 max-w-sm rounded-lg border border-gray-300 bg-white p-3 shadow-lg"
                style=move || {
                    let (left, top) = position.get();
                    format!("left: {left}px; top: {top}px; min-width: 200px; max-height: 300px;")
                }
            >
                <button
                    type="button"
                    class="absolute top-2 right-2 z-10 p-1 text-gray-400 hover:text-gray-600"
                    aria-label="Close notes"
                    on:click=move |_| state.update(|s| s.hide_note())
                >
                    <X class="size-3" />
                </button>
                <div class="overflow-y-auto pr-5 text-sm leading-relaxed text-gray-700" style="max-height: 250px;">
                    {move || {
                        lines()
                            .into_iter()
                            .map(|line| {
                                // Keep blank lines visible.
                                let line = if line.is_empty() { "\u{00A0}".to_string() } else { line };
                                view! { <div class="note-line">{line}</div> }
                            })
                            .collect_view()
                    }}
                </div>
            </div>
        </Show>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::fixtures::topic;
    use crate::tree::Topic;

    fn sample() -> TopicTree {
        let mut noted = topic("n", "Noted", vec![]);
        noted.notes = Some("line1\nline2".to_string());
        noted.hyperlink = Some("https://example.com".to_string());
        let blank: Topic = topic("b", "Blank", vec![]);
        TopicTree::from_topic(&topic(
            "r",
            "Root",
            vec![noted, topic("p", "Parent", vec![blank])],
        ))
    }

    #[test]
    fn test_render_one_view_per_topic_in_preorder() {
        let views = render(&sample());
        let keys = views.iter().map(|v| v.key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["r", "n", "p", "b"]);
        assert_eq!(views[0].children, Some(vec![1, 2]));
        assert!(views[0].is_root);
        assert!(!views[2].is_root);
        assert_eq!(views[3].depth, 2);
    }

    #[test]
    fn test_leaves_have_no_control_and_no_container() {
        for v in render(&sample()) {
            if v.key == "n" || v.key == "b" {
                assert_eq!(v.control, ExpandControl::LeafMarker);
                assert!(v.children.is_none());
            } else {
                assert_eq!(v.control, ExpandControl::Toggle);
                assert!(v.children.is_some());
            }
        }
    }

    #[test]
    fn test_affordances_follow_fields() {
        let tree = sample();
        let noted = topic_view(&tree, 1).expect("view");
        assert!(noted.has_note);
        assert_eq!(noted.link.as_deref(), Some("https://example.com"));
        let blank = topic_view(&tree, 3).expect("view");
        assert!(!blank.has_note);
        assert!(blank.link.is_none());
        assert!(topic_view(&tree, 9).is_none());
    }

    #[test]
    fn test_blank_notes_hide_affordance_after_parse() {
        let sheets = crate::tree::parse_json(
            r#"{"sheets": [{"root_topic": {"id": "r", "title": "R", "notes": " \n "}}]}"#,
        )
        .expect("should parse");
        let tree = TopicTree::from_topic(&sheets[0].root_topic);
        assert!(!topic_view(&tree, 0).expect("view").has_note);
    }

    #[test]
    fn test_header_class_reflects_visual() {
        let plain = header_class(NodeVisual::default());
        assert!(!plain.contains("search-"));

        let dim = header_class(NodeVisual {
            mark: NodeMark::Dim,
            ..NodeVisual::default()
        });
        assert!(dim.contains("search-dim"));

        let hit = header_class(NodeVisual {
            mark: NodeMark::Highlight,
            focused: true,
            ..NodeVisual::default()
        });
        assert!(hit.contains("search-highlight"));
        assert!(hit.contains("search-focus"));
    }

    #[test]
    fn test_children_class_hides_when_collapsed() {
        assert!(children_class(false).contains("hidden"));
        assert!(!children_class(true).contains("hidden"));
    }

    #[test]
    fn test_root_title_is_bold() {
        assert!(title_class(true).contains("font-bold"));
        assert!(!title_class(false).contains("font-bold"));
    }

    #[test]
    fn test_place_popup_below_anchor() {
        let a = Rect {
            left: 100.0,
            top: 50.0,
            bottom: 70.0,
        };
        assert_eq!(place_popup(a, (200.0, 100.0), (1024.0, 768.0)), (100.0, 75.0));
    }

    #[test]
    fn test_place_popup_shifts_left_at_right_edge() {
        let a = Rect {
            left: 900.0,
            top: 50.0,
            bottom: 70.0,
        };
        let (left, top) = place_popup(a, (200.0, 100.0), (1024.0, 768.0));
        assert_eq!(left, 814.0);
        assert_eq!(top, 75.0);
    }

    #[test]
    fn test_place_popup_flips_above_at_bottom_edge() {
        let a = Rect {
            left: 10.0,
            top: 700.0,
            bottom: 720.0,
        };
        assert_eq!(place_popup(a, (200.0, 100.0), (1024.0, 768.0)), (10.0, 595.0));
    }

    #[test]
    fn test_dom_id() {
        assert_eq!(dom_id("abc"), "topic-abc");
    }

    #[test]
    fn test_lone_header_click_changes_nothing() {
        let mut s = ViewerState::from_tree("Sheet".to_string(), sample());
        let before = (0..s.tree().len()).map(|i| s.visual(i)).collect::<Vec<_>>();

        assert!(!settle_header_click(&mut s, 2, false));
        assert!(!settle_header_click(&mut s, 1, false));
        let after = (0..s.tree().len()).map(|i| s.visual(i)).collect::<Vec<_>>();
        assert_eq!(before, after);
        assert_eq!(s.focused(), None);
    }

    #[test]
    fn test_double_header_click_toggles_parents_only() {
        let mut s = ViewerState::from_tree("Sheet".to_string(), sample());
        assert!(s.is_expanded(2));
        assert!(settle_header_click(&mut s, 2, true));
        assert!(!s.is_expanded(2));
        // Leaf: nothing to toggle.
        assert!(!settle_header_click(&mut s, 1, true));
    }
}
