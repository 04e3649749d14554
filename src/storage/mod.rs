//! Tab-scoped session flags (`sessionStorage`).
//!
//! This is the whole "authentication" layer: a flag the login page sets and
//! the viewer reads. Missing or malformed state means "not signed in".

use crate::util::now_iso;

pub(crate) const LOGGED_IN_KEY: &str = "isLoggedIn";
pub(crate) const USERNAME_KEY: &str = "username";
pub(crate) const LOGIN_TIME_KEY: &str = "loginTime";
pub(crate) const VISITED_VIEWER_KEY: &str = "hasVisitedViewer";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Session {
    pub username: String,
    pub login_time: Option<String>,
}

fn session_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.session_storage().ok().flatten())
}

fn get_item(key: &str) -> Option<String> {
    session_storage()?.get_item(key).ok().flatten()
}

pub(crate) fn session_from_parts(
    logged_in: Option<String>,
    username: Option<String>,
    login_time: Option<String>,
) -> Option<Session> {
    if logged_in.as_deref() != Some("true") {
        return None;
    }
    Some(Session {
        username: username
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| "Anonymous".to_string()),
        login_time,
    })
}

pub(crate) fn load_session() -> Option<Session> {
    session_from_parts(
        get_item(LOGGED_IN_KEY),
        get_item(USERNAME_KEY),
        get_item(LOGIN_TIME_KEY),
    )
}

pub(crate) fn save_session(username: &str) -> Option<Session> {
    let storage = session_storage()?;
    let login_time = now_iso();
    let _ = storage.set_item(LOGGED_IN_KEY, "true");
    let _ = storage.set_item(USERNAME_KEY, username);
    let _ = storage.set_item(LOGIN_TIME_KEY, &login_time);
    Some(Session {
        username: username.to_string(),
        login_time: Some(login_time),
    })
}

/// Logout and forced re-login both wipe everything the tab stored.
pub(crate) fn clear_session() {
    if let Some(storage) = session_storage() {
        let _ = storage.clear();
    }
}

/// Single-use session policy: returns true when this tab already opened the
/// viewer once (i.e. this is a reload). Marks the visit otherwise.
pub(crate) fn check_and_mark_viewer_visit() -> bool {
    let Some(storage) = session_storage() else {
        return false;
    };
    if storage.get_item(VISITED_VIEWER_KEY).ok().flatten().is_some() {
        return true;
    }
    let _ = storage.set_item(VISITED_VIEWER_KEY, "true");
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_requires_true_flag() {
        assert!(session_from_parts(None, Some("u".into()), None).is_none());
        assert!(session_from_parts(Some("1".into()), Some("u".into()), None).is_none());
        assert!(session_from_parts(Some("false".into()), None, None).is_none());
    }

    #[test]
    fn test_session_from_parts() {
        let s = session_from_parts(
            Some("true".into()),
            Some("alice".into()),
            Some("2026-01-01T00:00:00.000Z".into()),
        )
        .expect("should be signed in");
        assert_eq!(s.username, "alice");
        assert_eq!(s.login_time.as_deref(), Some("2026-01-01T00:00:00.000Z"));
    }

    #[test]
    fn test_session_username_fallback() {
        let s = session_from_parts(Some("true".into()), Some(" ".into()), None)
            .expect("should be signed in");
        assert_eq!(s.username, "Anonymous");
    }
}
