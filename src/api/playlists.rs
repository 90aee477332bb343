use super::rest::{ApiResponse, RestClient};
use crate::error::Result;
use crate::models::Playlist;
use crate::token::TokenCache;
use std::sync::Arc;

pub const USERS: &str = "/users";
pub const PLAYLISTS: &str = "/playlists";

/// Playlist endpoints of the business API. Every call takes its bearer token
/// from the shared cache unless one is passed explicitly.
#[derive(Clone)]
pub struct PlaylistApi {
    rest: RestClient,
    tokens: Arc<TokenCache>,
    user_id: String,
}

fn segment(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

impl PlaylistApi {
    pub fn new(rest: RestClient, tokens: Arc<TokenCache>, user_id: impl Into<String>) -> Self {
        Self {
            rest,
            tokens,
            user_id: user_id.into(),
        }
    }

    fn user_playlists_path(&self) -> String {
        format!("{}/{}{}", USERS, segment(&self.user_id), PLAYLISTS)
    }

    fn playlist_path(playlist_id: &str) -> String {
        format!("{}/{}", PLAYLISTS, segment(playlist_id))
    }

    pub async fn create(&self, playlist: &Playlist) -> Result<ApiResponse> {
        let token = self.tokens.get_token().await?;
        self.create_with_token(playlist, &token).await
    }

    /// Create with a caller-supplied token, bypassing the cache.
    pub async fn create_with_token(&self, playlist: &Playlist, token: &str) -> Result<ApiResponse> {
        self.rest
            .post_json(&self.user_playlists_path(), token, playlist)
            .await
    }

    pub async fn get(&self, playlist_id: &str) -> Result<ApiResponse> {
        let token = self.tokens.get_token().await?;
        self.rest.get(&Self::playlist_path(playlist_id), &token).await
    }

    pub async fn update(&self, playlist: &Playlist, playlist_id: &str) -> Result<ApiResponse> {
        let token = self.tokens.get_token().await?;
        self.rest
            .put(&Self::playlist_path(playlist_id), &token, playlist)
            .await
    }
}
