use serde::{Deserialize, Serialize};

/// Playlist body as sent to and echoed by the playlist endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "public", default)]
    pub is_public: bool,
}

impl Playlist {
    pub fn new(name: impl Into<String>, description: impl Into<String>, is_public: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            is_public,
        }
    }
}

/// Error body returned by the playlist endpoints on 4xx:
/// `{"error": {"status": 400, "message": "..."}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: InnerError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnerError {
    pub status: u16,
    pub message: String,
}

/// Expected outcomes the scenarios assert against. The message is the error
/// text the service returns for that status, empty for success codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedStatus {
    Ok,
    Created,
    MissingName,
    InvalidToken,
}

impl ExpectedStatus {
    pub fn code(self) -> u16 {
        match self {
            ExpectedStatus::Ok => 200,
            ExpectedStatus::Created => 201,
            ExpectedStatus::MissingName => 400,
            ExpectedStatus::InvalidToken => 401,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ExpectedStatus::Ok | ExpectedStatus::Created => "",
            ExpectedStatus::MissingName => "Missing required field: name",
            ExpectedStatus::InvalidToken => "Invalid access token",
        }
    }
}
