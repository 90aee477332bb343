//! The playlist checks and their assertions.
//!
//! Scenarios are plain async functions registered in a static table together
//! with their report metadata. `runner::run_scenarios` executes them.

use crate::api::playlists::PlaylistApi;
use crate::api::rest::ApiResponse;
use crate::config::Config;
use crate::error::{Result, SuiteError};
use crate::models::{ErrorPayload, ExpectedStatus, Playlist};
use futures::future::BoxFuture;
use rand::{distributions::Alphanumeric, Rng};

/// Token that the service must reject.
pub const INVALID_TOKEN: &str = "123";

/// Everything a scenario body may use. Shared read-only across tasks.
pub struct SuiteContext {
    pub playlists: PlaylistApi,
    pub config: Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixture {
    Playlist,
    UpdatePlaylist,
}

impl Fixture {
    pub fn key(self) -> &'static str {
        match self {
            Fixture::Playlist => "playlist_id",
            Fixture::UpdatePlaylist => "update_playlist_id",
        }
    }
}

impl SuiteContext {
    pub fn new(playlists: PlaylistApi, config: Config) -> Self {
        Self { playlists, config }
    }

    pub fn fixture(&self, fixture: Fixture) -> Result<&str> {
        let id = match fixture {
            Fixture::Playlist => self.config.playlist_id.as_deref(),
            Fixture::UpdatePlaylist => self.config.update_playlist_id.as_deref(),
        };
        id.filter(|s| !s.trim().is_empty())
            .ok_or(SuiteError::MissingFixture(fixture.key()))
    }
}

pub type ScenarioFn = for<'a> fn(&'a SuiteContext) -> BoxFuture<'a, Result<()>>;

#[derive(Clone, Copy)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    pub story: Option<&'static str>,
    pub links: &'static [&'static str],
    /// Fixture ids the scenario cannot run without.
    pub requires: &'static [Fixture],
    pub run: ScenarioFn,
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("story", &self.story)
            .finish()
    }
}

impl Scenario {
    /// Entry for `list`: name, description, then story and links when set.
    pub fn listing(&self) -> String {
        let mut out = format!("- {}: {}", self.name, self.description);
        if let Some(story) = self.story {
            out.push_str(&format!("\n    story: {}", story));
        }
        for link in self.links {
            out.push_str(&format!("\n    link: {}", link));
        }
        out
    }
}

pub fn render_listing(scenarios: &[Scenario]) -> String {
    scenarios
        .iter()
        .map(Scenario::listing)
        .collect::<Vec<_>>()
        .join("\n")
}

const CREATE_STORY: &str = "Create a playlist story";

pub fn all() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "create_playlist",
            description: "Should be able to create a playlist with correct name, description and public status",
            story: Some(CREATE_STORY),
            links: &["https://example.org", "tms:12345", "issue:1234567"],
            requires: &[],
            run: create_playlist,
        },
        Scenario {
            name: "get_playlist",
            description: "Should be able to get a playlist with correct name, description and public status",
            story: None,
            links: &[],
            requires: &[Fixture::Playlist],
            run: get_playlist,
        },
        Scenario {
            name: "update_playlist",
            description: "Should be able to update a playlist",
            story: None,
            links: &[],
            requires: &[Fixture::UpdatePlaylist],
            run: update_playlist,
        },
        Scenario {
            name: "create_playlist_without_name",
            description: "Should not be able to create a playlist without name",
            story: Some(CREATE_STORY),
            links: &[],
            requires: &[],
            run: create_playlist_without_name,
        },
        Scenario {
            name: "create_playlist_with_expired_token",
            description: "Should not be able to create a playlist with an expired token",
            story: Some(CREATE_STORY),
            links: &[],
            requires: &[],
            run: create_playlist_with_expired_token,
        },
    ]
}

fn random_words(prefix: &str, len: usize) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect();
    format!("{} {}", prefix, suffix)
}

pub fn fake_name() -> String {
    random_words("Playlist", 10)
}

pub fn fake_description() -> String {
    random_words("Description", 40)
}

pub fn assert_status(actual: &ApiResponse, expected: ExpectedStatus) -> Result<()> {
    if actual.status != expected.code() {
        return Err(SuiteError::UnexpectedStatusCode {
            expected: expected.code(),
            actual: actual.status,
            body: actual.text(),
        });
    }
    Ok(())
}

pub fn assert_playlist_eq(response: &Playlist, request: &Playlist) -> Result<()> {
    if response.name != request.name {
        return Err(SuiteError::mismatch("name", &request.name, &response.name));
    }
    if response.description != request.description {
        return Err(SuiteError::mismatch(
            "description",
            &request.description,
            &response.description,
        ));
    }
    if response.is_public != request.is_public {
        return Err(SuiteError::mismatch("public", request.is_public, response.is_public));
    }
    Ok(())
}

pub fn assert_error(payload: &ErrorPayload, expected: ExpectedStatus) -> Result<()> {
    if payload.error.status != expected.code() {
        return Err(SuiteError::mismatch(
            "error.status",
            expected.code(),
            payload.error.status,
        ));
    }
    if payload.error.message != expected.message() {
        return Err(SuiteError::mismatch(
            "error.message",
            expected.message(),
            &payload.error.message,
        ));
    }
    Ok(())
}

fn create_playlist(ctx: &SuiteContext) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let request = Playlist::new(fake_name(), fake_description(), false);
        let resp = ctx.playlists.create(&request).await?;
        assert_status(&resp, ExpectedStatus::Created)?;
        assert_playlist_eq(&resp.json::<Playlist>()?, &request)
    })
}

fn get_playlist(ctx: &SuiteContext) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let expected = Playlist::new(
            ctx.config.fixture_playlist_name.clone(),
            ctx.config.fixture_playlist_description.clone(),
            false,
        );
        let id = ctx.fixture(Fixture::Playlist)?;
        let resp = ctx.playlists.get(id).await?;
        assert_status(&resp, ExpectedStatus::Ok)?;
        assert_playlist_eq(&resp.json::<Playlist>()?, &expected)
    })
}

fn update_playlist(ctx: &SuiteContext) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let request = Playlist::new(fake_name(), fake_name(), false);
        let id = ctx.fixture(Fixture::UpdatePlaylist)?;
        let resp = ctx.playlists.update(&request, id).await?;
        assert_status(&resp, ExpectedStatus::Ok)
    })
}

fn create_playlist_without_name(ctx: &SuiteContext) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let request = Playlist::new("", fake_description(), false);
        let resp = ctx.playlists.create(&request).await?;
        assert_status(&resp, ExpectedStatus::MissingName)?;
        assert_error(&resp.json::<ErrorPayload>()?, ExpectedStatus::MissingName)
    })
}

fn create_playlist_with_expired_token(ctx: &SuiteContext) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let request = Playlist::new(fake_name(), fake_description(), false);
        let resp = ctx
            .playlists
            .create_with_token(&request, INVALID_TOKEN)
            .await?;
        assert_status(&resp, ExpectedStatus::InvalidToken)?;
        assert_error(&resp.json::<ErrorPayload>()?, ExpectedStatus::InvalidToken)
    })
}
