use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // OAuth client and refresh credentials
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_grant_type")]
    pub grant_type: String,
    #[serde(default)]
    pub refresh_token: String,

    /// Owner of the playlists created by the suite.
    #[serde(default)]
    pub user_id: String,

    // Fixture playlists that must already exist on the account
    #[serde(default)]
    pub playlist_id: Option<String>,
    #[serde(default)]
    pub update_playlist_id: Option<String>,
    #[serde(default = "default_fixture_name")]
    pub fixture_playlist_name: String,
    #[serde(default = "default_fixture_description")]
    pub fixture_playlist_description: String,

    #[serde(default = "default_auth_base")]
    pub auth_base: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// How many times a failed scenario is re-run before it is reported.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

fn default_grant_type() -> String { "refresh_token".into() }
fn default_fixture_name() -> String { "Updated Playlist Name".into() }
fn default_fixture_description() -> String { "Updated playlist description".into() }
fn default_auth_base() -> String { "https://accounts.spotify.com".into() }
fn default_api_base() -> String { "https://api.spotify.com/v1".into() }
fn default_request_timeout() -> u64 { 30 }
fn default_max_retries() -> u32 { 2 }
fn default_log_dir() -> PathBuf { "logs".into() }

/// Credentials posted to the token endpoint on every refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub grant_type: String,
    pub refresh_token: String,
}

impl RefreshCredentials {
    pub fn form(&self) -> [(&'static str, &str); 4] {
        [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", self.grant_type.as_str()),
            ("refresh_token", self.refresh_token.as_str()),
        ]
    }
}

impl Config {
    /// Parse a TOML config file and apply environment overrides.
    pub fn from_path(path: &std::path::Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)?;
        let mut cfg: Config = toml::from_str(&s)?;
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Environment variables win over the file so secrets can stay out of it
    /// and tests can point the suite at a mock server.
    pub fn apply_env_overrides(&mut self) {
        let overrides: [(&str, &mut String); 6] = [
            ("SPOTIFY_AUTH_BASE", &mut self.auth_base),
            ("SPOTIFY_API_BASE", &mut self.api_base),
            ("SPOTIFY_CLIENT_ID", &mut self.client_id),
            ("SPOTIFY_CLIENT_SECRET", &mut self.client_secret),
            ("SPOTIFY_REFRESH_TOKEN", &mut self.refresh_token),
            ("SPOTIFY_USER_ID", &mut self.user_id),
        ];
        for (key, slot) in overrides {
            if let Ok(v) = env::var(key) {
                if !v.trim().is_empty() {
                    *slot = v.trim().to_string();
                }
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let required = [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("refresh_token", &self.refresh_token),
            ("user_id", &self.user_id),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(k, _)| *k)
            .collect();
        if !missing.is_empty() {
            anyhow::bail!("missing required config values: {}", missing.join(", "));
        }
        url::Url::parse(&self.auth_base)
            .map_err(|e| anyhow::anyhow!("invalid auth_base {}: {}", self.auth_base, e))?;
        url::Url::parse(&self.api_base)
            .map_err(|e| anyhow::anyhow!("invalid api_base {}: {}", self.api_base, e))?;
        Ok(())
    }

    pub fn refresh_credentials(&self) -> RefreshCredentials {
        RefreshCredentials {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            grant_type: self.grant_type.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }
}
