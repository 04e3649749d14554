use std::sync::{Arc, Mutex};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// Current time as an ISO-8601 UTC string (browser clock).
pub(crate) fn now_iso() -> String {
    js_sys::Date::new_0().to_iso_string().into()
}

/// Run `f` once after `ms`. Returns the timer handle, if a window exists.
pub(crate) fn set_timeout(ms: i32, f: impl FnOnce() + 'static) -> Option<i32> {
    let win = web_sys::window()?;
    win.set_timeout_with_callback_and_timeout_and_arguments_0(
        Closure::once_into_js(f).as_ref().unchecked_ref(),
        ms,
    )
    .ok()
}

pub(crate) fn clear_timeout(handle: i32) {
    if let Some(win) = web_sys::window() {
        win.clear_timeout_with_handle(handle);
    }
}

/// Trailing-edge debounce: at most one pending timer, each `schedule`
/// supersedes the previous one.
#[derive(Clone)]
pub(crate) struct Debouncer {
    delay_ms: i32,
    pending: Arc<Mutex<Option<i32>>>,
}

impl Debouncer {
    pub fn new(delay_ms: i32) -> Self {
        Self {
            delay_ms,
            pending: Arc::new(Mutex::new(None)),
        }
    }

    pub fn schedule(&self, f: impl FnOnce() + 'static) {
        self.cancel();

        let pending = self.pending.clone();
        let handle = set_timeout(self.delay_ms, move || {
            if let Ok(mut p) = pending.lock() {
                *p = None;
            }
            f();
        });

        if let Ok(mut p) = self.pending.lock() {
            *p = handle;
        }
    }

    pub fn cancel(&self) {
        let handle = self.pending.lock().ok().and_then(|mut p| p.take());
        if let Some(h) = handle {
            clear_timeout(h);
        }
    }
}

/// Split note text into display lines (`\n` or `\r\n` separated).
pub(crate) fn note_lines(notes: &str) -> Vec<String> {
    notes.lines().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_lines() {
        assert_eq!(note_lines("line1\nline2"), vec!["line1", "line2"]);
        assert_eq!(note_lines("a\r\nb\n\nc"), vec!["a", "b", "", "c"]);
        assert_eq!(note_lines("single"), vec!["single"]);
    }
}
