use icons::Loader;
use leptos::prelude::*;
use tw_merge::tw_merge;

#[component]
pub fn Spinner(
    #[prop(into, optional)] class: String,
    /// Announced to screen readers.
    #[prop(into, default = "Loading".to_string())]
    label: String,
) -> impl IntoView {
    let merged_class = tw_merge!("size-4 shrink-0 animate-spin text-current", class);

    view! { <Loader class=merged_class attr:role="status" attr:aria-label=label /> }
}
