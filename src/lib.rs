mod app;
mod components;
mod config;
mod models;
mod pages;
mod search;
mod state;
mod storage;
mod tree;
mod util;
mod viewer;

use crate::app::App;
use leptos::logging::error;
use leptos::prelude::*;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

/// Log uncaught script errors and unhandled promise rejections. Panics are
/// covered by `install_panic_screen`.
fn install_global_error_logging() {
    let Some(win) = web_sys::window() else {
        return;
    };

    let on_error = Closure::<dyn Fn(web_sys::Event)>::new(|ev: web_sys::Event| {
        match ev.dyn_ref::<web_sys::ErrorEvent>() {
            Some(e) => error!(
                "uncaught error: {} ({}:{}:{})",
                e.message(),
                e.filename(),
                e.lineno(),
                e.colno()
            ),
            None => error!("uncaught error: {}", ev.type_()),
        }
    });
    let on_rejection = Closure::<dyn Fn(web_sys::Event)>::new(|ev: web_sys::Event| {
        match ev.dyn_ref::<web_sys::PromiseRejectionEvent>() {
            Some(e) => error!("unhandled rejection: {:?}", e.reason()),
            None => error!("unhandled rejection"),
        }
    });

    let _ = win.add_event_listener_with_callback("error", on_error.as_ref().unchecked_ref());
    let _ = win.add_event_listener_with_callback(
        "unhandledrejection",
        on_rejection.as_ref().unchecked_ref(),
    );

    // Live for the whole page.
    on_error.forget();
    on_rejection.forget();
}

const FATAL_ERROR_ID: &str = "fatalError";

/// Panics still go to the console, then the page gets a blocking error screen
/// since the reactive tree can no longer be trusted.
fn install_panic_screen() {
    std::panic::set_hook(Box::new(|info| {
        console_error_panic_hook::hook(info);
        if let Err(e) = show_fatal_error(&info.to_string()) {
            error!("could not show the error screen: {e:?}");
        }
    }));
}

/// Overlay with the error detail, "Retry" (reload) and "Back to login".
/// Built with plain DOM calls; only one is ever shown.
fn show_fatal_error(detail: &str) -> Result<(), wasm_bindgen::JsValue> {
    let doc = document();
    if doc.get_element_by_id(FATAL_ERROR_ID).is_some() {
        return Ok(());
    }
    let Some(body) = doc.body() else {
        return Ok(());
    };

    let overlay = doc.create_element("div")?;
    overlay.set_id(FATAL_ERROR_ID);
    overlay.set_attribute("role", "alertdialog")?;
    overlay.set_attribute(
        "class",
        "fixed inset-0 z-[100] flex items-center justify-center bg-background/95 px-4",
    )?;

    let card = doc.create_element("div")?;
    card.set_attribute(
        "class",
        "w-full max-w-md rounded-xl border bg-card p-6 shadow-sm flex flex-col gap-3",
    )?;

    let title = doc.create_element("h2")?;
    title.set_attribute("class", "text-lg font-semibold")?;
    title.set_text_content(Some("Something went wrong"));

    let message = doc.create_element("p")?;
    message.set_attribute("class", "text-sm text-destructive")?;
    message.set_text_content(Some(detail));

    let actions = doc.create_element("div")?;
    actions.set_attribute("class", "flex gap-2")?;

    let retry = doc.create_element("button")?;
    retry.set_attribute(
        "class",
        "h-8 rounded-md bg-primary px-3 text-sm text-primary-foreground",
    )?;
    retry.set_text_content(Some("Retry"));
    let on_retry = Closure::<dyn Fn()>::new(|| {
        let _ = window().location().reload();
    });
    retry.add_event_listener_with_callback("click", on_retry.as_ref().unchecked_ref())?;
    on_retry.forget();

    let back = doc.create_element("button")?;
    back.set_attribute("class", "h-8 rounded-md border px-3 text-sm")?;
    back.set_text_content(Some("Back to login"));
    let on_back = Closure::<dyn Fn()>::new(|| {
        storage::clear_session();
        let _ = window().location().set_href("/login");
    });
    back.add_event_listener_with_callback("click", on_back.as_ref().unchecked_ref())?;
    on_back.forget();

    actions.append_child(&retry)?;
    actions.append_child(&back)?;
    card.append_child(&title)?;
    card.append_child(&message)?;
    card.append_child(&actions)?;
    overlay.append_child(&card)?;
    body.append_child(&overlay)?;
    Ok(())
}

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    install_panic_screen();
    install_global_error_logging();
    mount_to_body(App);
}


#[cfg(test)]
mod tests {
    use crate::search::SearchStatus;
    use crate::state::{NodeMark, ViewerState};
    use crate::tree::{parse_json, TopicTree, UNTITLED_TOPIC};
    use crate::viewer::{render, ExpandControl};

    const SAMPLE: &str = r#"{
        "sheets": [{
            "title": "Project Plan",
            "root_topic": {
                "id": "root",
                "title": "Project Plan",
                "children": [
                    {"id": "goals", "title": "Goals", "notes": "Ship v1\nGather feedback",
                     "children": [{"id": "g1", "title": "Fast search"}]},
                    {"id": "risks", "title": "Risks", "branch_folded": true,
                     "children": [{"id": "r1", "title": "Scope creep",
                                   "hyperlink": "https://example.com/scope"}]},
                    {"id": "misc", "title": "   ", "extra": 42}
                ]
            }
        }]
    }"#;

    fn loaded() -> ViewerState {
        let sheets = parse_json(SAMPLE).expect("sample should parse");
        ViewerState::new(&sheets[0])
    }

    #[test]
    fn test_sample_document_renders() {
        let s = loaded();
        assert_eq!(s.sheet_title(), "Project Plan");

        let views = render(s.tree());
        let titles = views.iter().map(|v| v.title.as_str()).collect::<Vec<_>>();
        assert_eq!(
            titles,
            vec!["Project Plan", "Goals", "Fast search", "Risks", "Scope creep", UNTITLED_TOPIC]
        );
        assert_eq!(views[5].control, ExpandControl::LeafMarker);
        assert!(views[1].has_note);
        assert_eq!(views[4].link.as_deref(), Some("https://example.com/scope"));
    }

    #[test]
    fn test_folded_branch_starts_collapsed() {
        let s = loaded();
        let risks = s.tree().find_key("risks").expect("risks");
        assert!(!s.is_expanded(risks));
        assert!(s.is_expanded(0));
    }

    #[test]
    fn test_search_reveals_hidden_match_and_restores() {
        let mut s = loaded();
        let risks = s.tree().find_key("risks").expect("risks");
        let scope = s.tree().find_key("r1").expect("r1");

        s.apply_query("scope");
        assert_eq!(s.search_state().status(), SearchStatus::Results);
        assert!(s.is_expanded(risks));
        assert_eq!(s.mark(scope), NodeMark::Highlight);
        assert_eq!(s.search_state().matches[0].path, "Project Plan > Risks > Scope creep");

        s.apply_query("");
        assert!(!s.is_expanded(risks));
        assert_eq!(s.mark(scope), NodeMark::None);
    }

    #[test]
    fn test_visited_result_stays_open_after_clear() {
        let mut s = loaded();
        let risks = s.tree().find_key("risks").expect("risks");
        let scope = s.tree().find_key("r1").expect("r1");

        s.apply_query("scope");
        s.next_result();
        assert_eq!(s.focused(), Some(scope));

        s.apply_query("");
        assert!(s.is_expanded(risks));
        assert_eq!(s.focused(), None);
    }

    #[test]
    fn test_bulk_collapse_during_search_is_kept() {
        let mut s = loaded();
        s.apply_query("goals");
        s.collapse_all();
        s.apply_query("");
        assert!((0..s.tree().len()).all(|i| !s.is_expanded(i)));
    }

    #[test]
    fn test_no_results_status() {
        let mut s = loaded();
        s.apply_query("zzz");
        assert_eq!(s.search_state().status(), SearchStatus::NoResults);
        assert!((0..s.tree().len()).all(|i| s.mark(i) == NodeMark::Dim));
    }

    #[test]
    fn test_tree_shape_matches_document() {
        let sheets = parse_json(SAMPLE).expect("sample should parse");
        let tree = TopicTree::from_topic(&sheets[0].root_topic);
        assert_eq!(tree.len(), 6);
        let g1 = tree.find_key("g1").expect("g1");
        assert_eq!(tree.path(g1), "Project Plan > Goals > Fast search");
    }
}
