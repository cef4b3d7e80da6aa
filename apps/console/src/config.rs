use std::fs;

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub server_url: String,
    pub auth_token: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".into(),
            auth_token: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    auth_token: Option<String>,
}

/// Defaults, then an optional `console.toml` next to the binary, then
/// environment variables. Later sources win.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("console.toml") {
        apply_file_settings(&mut settings, &raw);
    }

    if let Ok(v) = std::env::var("GAME_SERVER_URL") {
        settings.server_url = v;
    }
    if let Ok(v) = std::env::var("GAME_AUTH_TOKEN") {
        settings.auth_token = Some(v);
    }

    settings
}

fn apply_file_settings(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<FileSettings>(raw) else {
        return;
    };
    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if let Some(v) = file_cfg.auth_token {
        settings.auth_token = Some(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_settings_override_defaults() {
        let mut settings = Settings::default();
        apply_file_settings(
            &mut settings,
            "server_url = \"https://play.example.com\"\nauth_token = \"tok\"\n",
        );
        assert_eq!(settings.server_url, "https://play.example.com");
        assert_eq!(settings.auth_token.as_deref(), Some("tok"));
    }

    #[test]
    fn unreadable_file_settings_are_ignored() {
        let mut settings = Settings::default();
        apply_file_settings(&mut settings, "server_url = [not toml");
        assert_eq!(settings, Settings::default());
    }
}
