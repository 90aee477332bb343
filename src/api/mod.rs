pub mod accounts;
pub mod playlists;
pub mod rest;

use crate::config::Config;
use crate::error::Result;
use crate::token::TokenCache;
use std::sync::Arc;
use std::time::Duration;

/// Clients wired from one config: the shared token cache and the playlist
/// API that draws tokens from it.
pub struct Clients {
    pub tokens: Arc<TokenCache>,
    pub playlists: playlists::PlaylistApi,
}

impl Clients {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let timeout = Duration::from_secs(cfg.request_timeout_secs);
        let accounts = accounts::AccountsApi::new(rest::RestClient::new(&cfg.auth_base, timeout)?);
        let tokens = Arc::new(TokenCache::new(Arc::new(accounts), cfg.refresh_credentials()));
        let playlists = playlists::PlaylistApi::new(
            rest::RestClient::new(&cfg.api_base, timeout)?,
            tokens.clone(),
            cfg.user_id.clone(),
        );
        Ok(Self { tokens, playlists })
    }
}
