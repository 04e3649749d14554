use leptos::prelude::*;
use leptos_ui::clx;
use tw_merge::tw_merge;

/// Inline message box. `destructive` switches to the error palette.
#[component]
pub fn Alert(
    #[prop(into, optional)] class: String,
    #[prop(optional)] destructive: bool,
    children: Children,
) -> impl IntoView {
    let class = tw_merge!(
        "relative w-full rounded-lg border px-4 py-3 text-sm",
        if destructive {
            "border-destructive/30 text-destructive"
        } else {
            "bg-card text-card-foreground"
        },
        class
    );

    view! {
        <div
            role="alert"
            data-name="Alert"
            data-variant=if destructive { "destructive" } else { "default" }
            class=class
        >
            {children()}
        </div>
    }
}

mod components {
    use super::*;
    clx! {AlertTitle, h4, "mb-1 font-medium tracking-tight leading-none"}
    clx! {AlertDescription, p, "text-sm [&_p]:leading-relaxed"}
}

pub use components::*;
