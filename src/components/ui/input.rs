use leptos::html;
use leptos::prelude::*;
use tw_merge::tw_merge;
use wasm_bindgen::JsCast;

/// Border tint used as a quick positive/negative signal (e.g. search hits).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum InputTone {
    #[default]
    Neutral,
    Positive,
    Negative,
}

impl InputTone {
    fn class(self) -> &'static str {
        match self {
            InputTone::Neutral => "",
            InputTone::Positive => "border-green-500 focus-visible:border-green-500",
            InputTone::Negative => "border-red-500 focus-visible:border-red-500",
        }
    }
}

#[component]
pub fn Input(
    // Styling
    #[prop(into, optional)] class: String,
    #[prop(into, optional)] tone: Signal<InputTone>,

    // Common HTML attributes
    #[prop(into, default = "text")] r#type: &'static str,
    #[prop(into, optional)] placeholder: String,
    #[prop(into, optional)] id: String,
    #[prop(into, optional)] disabled: Signal<bool>,
    #[prop(optional)] required: bool,
    #[prop(optional)] autofocus: bool,

    // Two-way binding
    //
    // NOTE: manual wiring instead of `bind:value=...`; the binding macros have
    // changed across Leptos versions.
    #[prop(into)] bind_value: RwSignal<String>,

    #[prop(optional)] on_keydown: Option<Callback<web_sys::KeyboardEvent>>,

    // Ref for direct DOM access
    #[prop(optional)] node_ref: NodeRef<html::Input>,
) -> impl IntoView {
    let merged_class = move || {
        tw_merge!(
            "placeholder:text-muted-foreground selection:bg-primary selection:text-primary-foreground border-input flex h-9 w-full min-w-0 rounded-md border bg-transparent px-3 py-1 text-base shadow-xs transition-[color,box-shadow] outline-none disabled:pointer-events-none disabled:cursor-not-allowed disabled:opacity-50 md:text-sm",
            "focus-visible:border-ring focus-visible:ring-ring/50 focus-visible:ring-2",
            tone.get().class(),
            class.clone()
        )
    };

    let on_input = move |ev: web_sys::Event| {
        if let Some(target) = ev.target() {
            if let Some(input) = target.dyn_ref::<web_sys::HtmlInputElement>() {
                bind_value.set(input.value());
            }
        }
    };

    let on_key = move |ev: web_sys::KeyboardEvent| {
        if let Some(cb) = on_keydown {
            cb.run(ev);
        }
    };

    view! {
        <input
            data-name="Input"
            data-tone=move || tone.get().as_ref().to_string()
            type=r#type
            class=merged_class
            placeholder=placeholder
            id=id
            disabled=move || disabled.get()
            required=required
            autofocus=autofocus
            prop:value=move || bind_value.get()
            on:input=on_input
            on:keydown=on_key
            node_ref=node_ref
        />
    }
}
