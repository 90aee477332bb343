use super::rest::RestClient;
use crate::config::RefreshCredentials;
use crate::error::{Result, SuiteError};
use crate::token::{IssuedToken, TokenEndpoint};
use async_trait::async_trait;
use tracing::debug;

pub const TOKEN_PATH: &str = "/api/token";

/// Identity provider client. Exchanges the long-lived refresh token for a
/// new access token.
pub struct AccountsApi {
    rest: RestClient,
}

impl AccountsApi {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }
}

#[async_trait]
impl TokenEndpoint for AccountsApi {
    async fn refresh(&self, credentials: &RefreshCredentials) -> Result<IssuedToken> {
        let resp = self
            .rest
            .post_form(TOKEN_PATH, &credentials.form())
            .await
            .map_err(|e| SuiteError::TokenRefreshFailed(format!("token endpoint unreachable: {}", e)))?;
        if resp.status != 200 {
            return Err(SuiteError::TokenRefreshFailed(format!(
                "{} => {}",
                resp.status,
                resp.text()
            )));
        }
        let access_token = resp
            .path("/access_token")
            .and_then(|v| v.as_str().map(|s| s.to_string()))
            .ok_or_else(|| SuiteError::TokenRefreshFailed("no access_token".into()))?;
        let expires_in = resp
            .path("/expires_in")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| SuiteError::TokenRefreshFailed("no integer expires_in".into()))?;
        debug!("token endpoint issued token valid for {}s", expires_in);
        Ok(IssuedToken {
            access_token,
            expires_in,
        })
    }
}
