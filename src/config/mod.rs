use leptos::logging::warn;
use serde::Deserialize;

const DEFAULT_DATA_ELEMENT_ID: &str = "mindmap-data";
const DEFAULT_USERNAME: &str = "viewer";
const DEFAULT_PASSWORD: &str = "viewer";
const DEFAULT_SEARCH_DEBOUNCE_MS: i32 = 300;

/// Page-level settings, read once at startup from `window.ENV`.
///
/// ```html
/// <script>
///   window.ENV = { VIEWER_USERNAME: "alice", VIEWER_PASSWORD: "secret" };
/// </script>
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ViewerConfig {
    /// `id` of the `<script type="application/json">` holding the document.
    pub data_element_id: String,

    /// The single static credential pair. Not a security boundary.
    pub username: String,
    pub password: String,

    /// Reloading the viewer clears the session and forces a new login.
    pub single_use_session: bool,

    pub search_debounce_ms: i32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            data_element_id: DEFAULT_DATA_ELEMENT_ID.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            single_use_session: false,
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
        }
    }
}

/// The `window.ENV` object as the host page writes it. Every key is optional
/// and unknown keys are ignored.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) struct EnvOverrides {
    pub data_element_id: Option<String>,
    pub viewer_username: Option<String>,
    pub viewer_password: Option<String>,
    pub single_use_session: Option<bool>,
    pub search_debounce_ms: Option<f64>,
}

impl ViewerConfig {
    pub fn from_window() -> Self {
        let Some(env) = web_sys::window()
            .and_then(|w| w.get("ENV"))
            .filter(|env| !env.is_undefined() && env.is_object())
        else {
            return Self::default();
        };

        match serde_wasm_bindgen::from_value::<EnvOverrides>(env.into()) {
            Ok(overrides) => Self::default().with_overrides(overrides),
            Err(e) => {
                warn!("ignoring malformed window.ENV: {e}");
                Self::default()
            }
        }
    }

    pub(crate) fn with_overrides(mut self, env: EnvOverrides) -> Self {
        if let Some(v) = env.data_element_id {
            self.data_element_id = v;
        }
        if let Some(v) = env.viewer_username {
            self.username = v;
        }
        if let Some(v) = env.viewer_password {
            self.password = v;
        }
        if let Some(v) = env.single_use_session {
            self.single_use_session = v;
        }
        if let Some(v) = env.search_debounce_ms.filter(|v| v.is_finite() && *v >= 0.0) {
            self.search_debounce_ms = v.round() as i32;
        }
        self
    }
}

/// Trimmed comparison against the configured pair. Both fields are required.
pub(crate) fn check_credentials(
    username: &str,
    password: &str,
    config: &ViewerConfig,
) -> Result<(), String> {
    let username = username.trim();
    let password = password.trim();

    if username.is_empty() || password.is_empty() {
        return Err("Please enter both username and password".to_string());
    }

    if username == config.username && password == config.password {
        Ok(())
    } else {
        Err("Incorrect username or password".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ViewerConfig {
        ViewerConfig {
            username: "alice".to_string(),
            password: "p&ss".to_string(),
            ..ViewerConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let c = ViewerConfig::default();
        assert_eq!(c.data_element_id, "mindmap-data");
        assert_eq!(c.search_debounce_ms, 300);
        assert!(!c.single_use_session);
    }

    #[test]
    fn test_check_credentials_ok_with_whitespace() {
        assert!(check_credentials(" alice ", "p&ss\n", &cfg()).is_ok());
    }

    #[test]
    fn test_check_credentials_requires_both_fields() {
        let err = check_credentials("alice", "  ", &cfg()).expect_err("blank password");
        assert!(err.contains("both"));
        assert!(check_credentials("", "p&ss", &cfg()).is_err());
    }

    #[test]
    fn test_check_credentials_mismatch() {
        let err = check_credentials("alice", "nope", &cfg()).expect_err("wrong password");
        assert_eq!(err, "Incorrect username or password");
        assert!(check_credentials("Alice", "p&ss", &cfg()).is_err());
    }

    #[test]
    fn test_env_overrides_apply_over_defaults() {
        let json = r#"{
            "DATA_ELEMENT_ID": "doc",
            "VIEWER_USERNAME": "u",
            "SINGLE_USE_SESSION": true,
            "SEARCH_DEBOUNCE_MS": 150,
            "API_URL": "ignored"
        }"#;
        let env: EnvOverrides = serde_json::from_str(json).expect("env should parse");
        let c = ViewerConfig::default().with_overrides(env);
        assert_eq!(c.data_element_id, "doc");
        assert_eq!(c.username, "u");
        assert_eq!(c.password, "viewer");
        assert!(c.single_use_session);
        assert_eq!(c.search_debounce_ms, 150);
    }

    #[test]
    fn test_negative_debounce_is_ignored() {
        let env = EnvOverrides {
            search_debounce_ms: Some(-5.0),
            ..EnvOverrides::default()
        };
        let c = ViewerConfig::default().with_overrides(env);
        assert_eq!(c.search_debounce_ms, 300);
    }
}
