use crate::components::ui::{
    Alert, AlertDescription, AlertTitle, Button, ButtonSize, ButtonVariant, Card, CardContent,
    CardDescription, CardFooter, CardHeader, CardTitle, Input, InputTone, Label, Spinner,
};
use crate::config::check_credentials;
use crate::search::{highlight_segments, SearchStatus};
use crate::state::{AppContext, ViewerContext, ViewerState};
use crate::storage::{check_and_mark_viewer_visit, save_session};
use crate::tree::{load_embedded_sheet, Sheet, ViewerError};
use crate::util::{set_timeout, Debouncer};
use crate::viewer::MindmapTree;
use icons::{LogOut, Search, X};
use leptos::error::Errors;
use leptos::ev;
use leptos::html;
use leptos::logging::{error, log, warn};
use leptos::prelude::*;
use leptos_dom::helpers::window_event_listener;

const LOGIN_REDIRECT_DELAY_MS: i32 = 300;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shortcut {
    FocusSearch,
    ExpandAll,
    CollapseAll,
    /// Close the notes popup and the search.
    Dismiss,
}

/// Cmd/Ctrl+F, Cmd/Ctrl+E, Cmd/Ctrl+R and Esc.
fn shortcut_for(key: &str, is_meta: bool) -> Option<Shortcut> {
    match (key.to_lowercase().as_str(), is_meta) {
        ("f", true) => Some(Shortcut::FocusSearch),
        ("e", true) => Some(Shortcut::ExpandAll),
        ("r", true) => Some(Shortcut::CollapseAll),
        ("escape", _) => Some(Shortcut::Dismiss),
        _ => None,
    }
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let username: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if loading.get_untracked() {
            return;
        }

        let user_val = username.get_untracked();
        let pass_val = password.get_untracked();
        let config = app_state.0.config.get_value();

        error.set(None);

        if let Err(e) = check_credentials(&user_val, &pass_val, &config) {
            warn!("login rejected: {e}");
            password.set(String::new());
            error.set(Some(e));
            return;
        }

        loading.set(true);
        let session = save_session(user_val.trim());
        if session.is_none() {
            warn!("sessionStorage unavailable; login will not survive a reload");
        }

        // Short transition before landing on the viewer.
        set_timeout(LOGIN_REDIRECT_DELAY_MS, move || {
            let _ = window().location().set_href("/");
        });
    };

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
                <div class="mb-6 flex items-center justify-center">
                    <span class="text-sm font-medium text-foreground">"Mindmap Viewer"</span>
                </div>

                <Card>
                    <CardHeader>
                        <CardTitle class="text-lg">"Sign in"</CardTitle>
                        <CardDescription class="text-xs">"Enter the viewer credentials to open the mindmap."</CardDescription>
                    </CardHeader>

                    <CardContent>
                        <form class="flex flex-col gap-3" on:submit=on_submit>
                            <div class="flex flex-col gap-1.5">
                                <Label html_for="username" class="text-xs">"Username"</Label>
                                <Input
                                    id="username"
                                    placeholder="viewer"
                                    bind_value=username
                                    autofocus=true
                                    disabled=loading
                                    class="h-8 text-sm"
                                />
                            </div>

                            <div class="flex flex-col gap-1.5">
                                <Label html_for="password" class="text-xs">"Password"</Label>
                                <Input
                                    id="password"
                                    r#type="password"
                                    placeholder="••••••••"
                                    bind_value=password
                                    disabled=loading
                                    class="h-8 text-sm"
                                />
                            </div>

                            <Show when=move || error.get().is_some()>
                                {move || {
                                    error.get().map(|e| {
                                        view! {
                                            <Alert destructive=true>
                                                <AlertDescription class="text-xs">
                                                    {e}
                                                </AlertDescription>
                                            </Alert>
                                        }
                                    })
                                }}
                            </Show>

                            <Button
                                class="w-full"
                                size=ButtonSize::Sm
                                attr:disabled=move || loading.get()
                            >
                                <span class="inline-flex items-center gap-2">
                                    <Show when=move || loading.get()>
                                        <Spinner label="Signing in" />
                                    </Show>
                                    {move || if loading.get() { "Signing in..." } else { "Continue" }}
                                </span>
                            </Button>
                        </form>
                    </CardContent>
                </Card>
            </div>
        </div>
    }
}

/// Viewer route. The session check is advisory: it only decides whether the
/// login form or the viewer is shown.
#[component]
pub fn ViewerRoot() -> impl IntoView {
    let app_state = expect_context::<AppContext>();

    let single_use = app_state.0.config.with_value(|c| c.single_use_session);
    if single_use && app_state.0.session.get_untracked().is_some() && check_and_mark_viewer_visit()
    {
        log!("viewer reloaded in a single-use session; signing out");
        app_state.0.logout();
    }

    let is_authenticated = move || app_state.0.is_authenticated();

    view! {
        <Show when=is_authenticated fallback=move || view! { <LoginPage /> }>
            <ViewerPage />
        </Show>
    }
}

#[component]
pub fn ViewerPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let element_id = app_state.0.config.with_value(|c| c.data_element_id.clone());

    // Bumped by "Retry": the whole document is read again from scratch.
    let attempt: RwSignal<u32> = RwSignal::new(0);
    let retry = Callback::new(move |_: ()| attempt.update(|n| *n += 1));

    // Load failures and anything else thrown while rendering the viewer end up
    // on the same error screen.
    view! {
        <ErrorBoundary fallback={move |errors: ArcRwSignal<Errors>| {
            let (message, kind) = errors
                .with(|errs| {
                    errs.iter().next().map(|(_, e)| {
                        let kind = e
                            .downcast_ref::<ViewerError>()
                            .map(|v| format!("{:?}", v.kind))
                            .unwrap_or_else(|| "Runtime".to_string());
                        (e.to_string(), kind)
                    })
                })
                .unwrap_or_else(|| ("Something went wrong".to_string(), "Runtime".to_string()));
            view! { <ErrorScreen message=message kind=kind on_retry=retry /> }
        }}>
            {move || {
                let n = attempt.get();
                load_embedded_sheet(&element_id)
                    .inspect(|sheet| log!("mindmap loaded: {} (attempt {n})", sheet.title))
                    .inspect_err(|e| error!("mindmap failed to load: {e}"))
                    .map(|sheet| view! { <ViewerShell sheet=sheet /> })
            }}
        </ErrorBoundary>
    }
}

#[component]
fn ErrorScreen(
    #[prop(into)] message: String,
    #[prop(into)] kind: String,
    on_retry: Callback<()>,
) -> impl IntoView {
    let app_state = expect_context::<AppContext>();

    view! {
        <div class="flex min-h-screen items-center justify-center bg-background px-4">
            <Card class="w-full max-w-md" attr:data-error-kind=kind>
                <CardHeader>
                    <CardTitle class="text-lg">"Unable to open the mindmap"</CardTitle>
                </CardHeader>
                <CardContent>
                    <Alert destructive=true>
                        <AlertTitle class="text-sm">"Load error"</AlertTitle>
                        <AlertDescription class="text-xs">{message}</AlertDescription>
                    </Alert>
                </CardContent>
                <CardFooter>
                    <Button size=ButtonSize::Sm on:click=move |_| on_retry.run(())>
                        "Retry"
                    </Button>
                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Sm
                        on:click=move |_| app_state.0.logout()
                    >
                        "Back to login"
                    </Button>
                </CardFooter>
            </Card>
        </div>
    }
}

/// Title bar, search sidebar and tree for one loaded sheet.
#[component]
fn ViewerShell(sheet: Sheet) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let config = app_state.0.config.get_value();

    let state = RwSignal::new(ViewerState::new(&sheet));
    provide_context(ViewerContext(state));

    let query: RwSignal<String> = RwSignal::new(String::new());
    let search_ref: NodeRef<html::Input> = NodeRef::new();
    let debouncer = Debouncer::new(config.search_debounce_ms);

    let title = state.with_untracked(|s| s.sheet_title().to_string());
    document().set_title(&title);

    // Typing is debounced; clearing applies at once and drops any pending run.
    Effect::new({
        let debouncer = debouncer.clone();
        move |prev: Option<()>| {
            let q = query.get();
            if prev.is_none() {
                return;
            }
            if q.is_empty() {
                debouncer.cancel();
                state.update(|s| s.clear_search());
                return;
            }
            debouncer.schedule(move || {
                let _ = state.try_update(|s| s.apply_query(&q));
            });
        }
    });

    let focus_search = move || {
        state.update(|s| s.open_sidebar());
        // The field lives in the sidebar; give it a tick to appear.
        set_timeout(0, move || {
            if let Some(input) = search_ref.get_untracked() {
                let _ = input.focus();
                input.select();
            }
        });
    };

    // Emptying the query also cancels a pending debounced search.
    let close_search = move || {
        query.set(String::new());
        state.update(|s| s.close_sidebar());
    };

    let toggle_search = move || {
        if state.with_untracked(|s| s.sidebar_open()) {
            close_search();
        } else {
            focus_search();
        }
    };

    // Shortcuts apply wherever focus is, including the search field.
    let key_handle = window_event_listener(ev::keydown, move |ev: web_sys::KeyboardEvent| {
        let Some(shortcut) = shortcut_for(&ev.key(), ev.meta_key() || ev.ctrl_key()) else {
            return;
        };
        ev.prevent_default();

        match shortcut {
            Shortcut::FocusSearch => focus_search(),
            Shortcut::ExpandAll => state.update(|s| s.expand_all()),
            Shortcut::CollapseAll => state.update(|s| s.collapse_all()),
            Shortcut::Dismiss => {
                state.update(|s| s.hide_note());
                if state.with_untracked(|s| s.sidebar_open()) {
                    close_search();
                }
            }
        }
    });
    on_cleanup(move || key_handle.remove());

    // Enter runs a still-pending search right away, then steps to the next hit.
    let on_search_key = Callback::new({
        let debouncer = debouncer.clone();
        move |ev: web_sys::KeyboardEvent| {
            if ev.key() != "Enter" {
                return;
            }
            ev.prevent_default();
            let q = query.get_untracked();
            debouncer.cancel();
            state.update(|s| {
                if s.search_state().query != q {
                    s.apply_query(&q);
                }
                s.next_result();
            });
        }
    });
    on_cleanup(move || debouncer.cancel());

    let status = Memo::new(move |_| state.with(|s| s.search_state().status()));
    let tone = Signal::derive(move || match status.get() {
        SearchStatus::Idle => InputTone::Neutral,
        SearchStatus::NoResults => InputTone::Negative,
        SearchStatus::Results => InputTone::Positive,
    });
    let sidebar_open = Memo::new(move |_| state.with(|s| s.sidebar_open()));

    let username = move || {
        app_state
            .0
            .session
            .get()
            .map(|s| s.username)
            .unwrap_or_default()
    };
    let signed_in_at = move || {
        app_state
            .0
            .session
            .get()
            .and_then(|s| s.login_time)
            .map(|t| format!("Signed in at {t}"))
            .unwrap_or_default()
    };

    view! {
        <div class="flex h-screen flex-col bg-background text-foreground">
            <header class="flex h-12 shrink-0 items-center gap-2 border-b px-3">
                <h1 class="min-w-0 flex-1 truncate text-sm font-semibold">{title}</h1>
                <span class="hidden text-xs text-muted-foreground sm:inline" title=signed_in_at>
                    {username}
                </span>
                <Button
                    variant=ButtonVariant::Outline
                    size=ButtonSize::Sm
                    on:click=move |_| state.update(|s| s.expand_all())
                    attr:title="Expand all (Ctrl+E)"
                >
                    "Expand all"
                </Button>
                <Button
                    variant=ButtonVariant::Outline
                    size=ButtonSize::Sm
                    on:click=move |_| state.update(|s| s.collapse_all())
                    attr:title="Collapse all (Ctrl+R)"
                >
                    "Collapse all"
                </Button>
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Icon
                    on:click=move |_| toggle_search()
                    attr:title="Search (Ctrl+F)"
                >
                    <Search />
                </Button>
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Icon
                    on:click=move |_| app_state.0.logout()
                    attr:title="Log out"
                >
                    <LogOut />
                </Button>
            </header>

            <div class="flex min-h-0 flex-1">
                <aside
                    id="searchSidebar"
                    class=move || {
                        if sidebar_open.get() {
                            "flex w-72 shrink-0 flex-col border-r bg-muted/20 transition-all duration-200"
                        } else {
                            "hidden"
                        }
                    }
                    data-status=move || status.get().as_ref().to_string()
                >
                    <div class="flex items-center gap-2 border-b p-2">
                        <Input
                            id="searchInput"
                            placeholder="Search topics..."
                            bind_value=query
                            tone=tone
                            node_ref=search_ref
                            on_keydown=on_search_key
                            class="h-8 text-sm"
                        />
                        <Button
                            variant=ButtonVariant::Ghost
                            size=ButtonSize::Icon
                            class="h-8 w-8"
                            on:click=move |_| close_search()
                            attr:title="Close search"
                        >
                            <X />
                        </Button>
                    </div>
                    <SearchResults />
                </aside>

                <main class="min-w-0 flex-1 overflow-auto p-4">
                    <MindmapTree />
                </main>
            </div>
        </div>
    }
}

#[component]
fn SearchResults() -> impl IntoView {
    let ViewerContext(state) = expect_context::<ViewerContext>();

    let search = Memo::new(move |_| state.with(|s| s.search_state().clone()));

    move || {
        let s = search.get();
        match s.status() {
            // No query: the results panel is closed.
            SearchStatus::Idle => ().into_any(),
            SearchStatus::NoResults => {
                view! {
                    <div class="p-3 text-xs text-muted-foreground">"No results found"</div>
                }
                .into_any()
            }
            SearchStatus::Results => {
                let count = s.matches.len();
                let label = if count == 1 {
                    "1 result".to_string()
                } else {
                    format!("{count} results")
                };
                let active = s.active_index;
                let query = s.query.clone();

                view! {
                    <div class="px-3 pt-2 pb-1 text-xs text-muted-foreground">{label}</div>
                    <div class="min-h-0 flex-1 overflow-y-auto px-1 pb-2">
                        {s
                            .matches
                            .into_iter()
                            .enumerate()
                            .map(|(i, m)| {
                                let row_class = if i == active {
                                    "w-full rounded-md px-2 py-1.5 text-left bg-primary/10 ring-1 ring-primary/30"
                                } else {
                                    "w-full rounded-md px-2 py-1.5 text-left hover:bg-accent/60"
                                };
                                let segments = highlight_segments(&m.title, &query);
                                view! {
                                    <button
                                        type="button"
                                        class=row_class
                                        on:click=move |_| {
                                            state.update(|s| {
                                                s.select_result(i);
                                            });
                                        }
                                    >
                                        <div class="truncate text-sm">
                                            {segments
                                                .into_iter()
                                                .map(|seg| {
                                                    if seg.matched {
                                                        view! { <mark class="rounded-sm bg-yellow-200 px-0.5">{seg.text}</mark> }.into_any()
                                                    } else {
                                                        view! { <span>{seg.text}</span> }.into_any()
                                                    }
                                                })
                                                .collect_view()}
                                        </div>
                                        <div class="truncate text-[11px] text-muted-foreground">{m.path}</div>
                                    </button>
                                }
                            })
                            .collect_view()}
                    </div>
                }
                .into_any()
            }
        }
    }
}
