//! Descope outbound-application broker over HTTPS.
//!
//! Token fetches authenticate with `<project id>:<management key>`;
//! connection starts authenticate as the signed-in user with
//! `<project id>:<refresh token>`.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{AccessToken, BrokerError, ConnectRequest, TokenBroker};
use crate::config::{EnvConfig, Settings};
use crate::errors::Result;
use crate::http_client::HttpClient;

pub const DEFAULT_BASE_URL: &str = "https://api.descope.com";
const FETCH_TOKEN_PATH: &str = "/v1/mgmt/outbound/app/user/token/latest";
const CONNECT_PATH: &str = "/v1/outbound/oauth/connect";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FetchTokenRequest<'a> {
    app_id: &'a str,
    user_id: &'a str,
    options: FetchTokenOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FetchTokenOptions {
    force_refresh: bool,
}

#[derive(Debug, Deserialize)]
struct FetchTokenResponse {
    #[serde(default)]
    token: Option<TokenBody>,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    #[serde(rename = "accessToken", alias = "access_token", default)]
    access_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectBody<'a> {
    app_id: &'a str,
    options: ConnectOptions<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectOptions<'a> {
    redirect_url: &'a str,
    scopes: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ConnectResponse {
    #[serde(default)]
    url: Option<String>,
}

// ---------------------------------------------------------------------------
// DescopeBroker
// ---------------------------------------------------------------------------

pub struct DescopeBroker {
    http: HttpClient,
    base_url: String,
    project_id: String,
    management_key: String,
}

impl DescopeBroker {
    pub fn new(
        http: HttpClient,
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        management_key: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            management_key: management_key.into(),
        }
    }

    /// Build from settings plus environment secrets. The environment's
    /// broker URL, when present, wins over the settings file.
    pub fn from_config(http: HttpClient, settings: &Settings, env: &EnvConfig) -> Result<Self> {
        let (project_id, management_key) = env.broker_credentials()?;
        let base_url = env
            .broker_url
            .clone()
            .unwrap_or_else(|| settings.broker_base_url.clone());
        Ok(Self::new(http, base_url, project_id, management_key))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl TokenBroker for DescopeBroker {
    async fn fetch_token(
        &self,
        app_id: &str,
        user_id: &str,
        force_refresh: bool,
    ) -> std::result::Result<AccessToken, BrokerError> {
        let body = FetchTokenRequest {
            app_id,
            user_id,
            options: FetchTokenOptions { force_refresh },
        };

        let resp = self
            .http
            .client()
            .post(self.url(FETCH_TOKEN_PATH))
            .bearer_auth(format!("{}:{}", self.project_id, self.management_key))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(status_error(status, text));
        }

        let parsed: FetchTokenResponse = resp
            .json()
            .await
            .map_err(|e| BrokerError::Unavailable(format!("malformed token response: {e}")))?;

        parsed
            .token
            .and_then(|t| t.access_token)
            .filter(|t| !t.is_empty())
            .map(AccessToken::new)
            .ok_or_else(|| BrokerError::NotConnected(format!("no token issued for {app_id}")))
    }

    async fn connect(&self, request: &ConnectRequest) -> std::result::Result<String, BrokerError> {
        let body = ConnectBody {
            app_id: &request.app_id,
            options: ConnectOptions {
                redirect_url: request.redirect_url.as_str(),
                scopes: &request.scopes,
            },
        };

        let resp = self
            .http
            .client()
            .post(self.url(CONNECT_PATH))
            .bearer_auth(format!("{}:{}", self.project_id, request.refresh_token))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            tracing::warn!(app_id = %request.app_id, status = status.as_u16(), "broker connect failed: {}", text);
            return Err(status_error(status, text));
        }

        let parsed: ConnectResponse = resp
            .json()
            .await
            .map_err(|e| BrokerError::Unavailable(format!("malformed connect response: {e}")))?;

        parsed
            .url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| BrokerError::Unavailable("connect response carried no url".into()))
    }
}

fn transport_error(e: reqwest::Error) -> BrokerError {
    if e.is_timeout() {
        BrokerError::Unavailable(format!("request timed out: {e}"))
    } else {
        BrokerError::Unavailable(e.to_string())
    }
}

/// Only 404 speaks about the user's grant. Throttling and request timeouts
/// are the broker being unavailable; other 4xx (bad management key,
/// malformed request) are rejections of this client.
fn status_error(status: StatusCode, body: String) -> BrokerError {
    match status {
        StatusCode::NOT_FOUND => BrokerError::NotConnected(body),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            BrokerError::Unavailable(format!("{status}: {body}"))
        }
        s if s.is_server_error() => BrokerError::Unavailable(format!("{status}: {body}")),
        s => BrokerError::Rejected {
            status: s.as_u16(),
            message: body,
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
