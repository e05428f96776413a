//! Test doubles shared by the unit tests of several modules.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::broker::{AccessToken, BrokerError, ConnectRequest, TokenBroker};
use crate::credentials::Credential;
use crate::errors::{DataTuneError, Result};
use crate::providers::{FileRef, SearchProvider};

/// What the fake broker does when asked for an app's token.
#[derive(Debug, Clone)]
pub enum TokenBehavior {
    Token(String),
    Unavailable,
    Hang,
}

/// In-memory broker keyed by app id. Unknown apps are "not connected".
#[derive(Default)]
pub struct FakeBroker {
    tokens: Mutex<HashMap<String, TokenBehavior>>,
    connect_url: Mutex<Option<String>>,
    calls: AtomicUsize,
    force_flags: Mutex<Vec<bool>>,
    connect_requests: Mutex<Vec<ConnectRequest>>,
}

impl FakeBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, app_id: &str, behavior: TokenBehavior) -> Self {
        self.set(app_id, behavior);
        self
    }

    pub fn with_connect_url(self, url: &str) -> Self {
        *self.connect_url.lock().unwrap() = Some(url.to_string());
        self
    }

    pub fn set(&self, app_id: &str, behavior: TokenBehavior) {
        self.tokens
            .lock()
            .unwrap()
            .insert(app_id.to_string(), behavior);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn force_flags(&self) -> Vec<bool> {
        self.force_flags.lock().unwrap().clone()
    }

    pub fn connect_requests(&self) -> Vec<ConnectRequest> {
        self.connect_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenBroker for FakeBroker {
    async fn fetch_token(
        &self,
        app_id: &str,
        _user_id: &str,
        force_refresh: bool,
    ) -> std::result::Result<AccessToken, BrokerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.force_flags.lock().unwrap().push(force_refresh);
        let behavior = self.tokens.lock().unwrap().get(app_id).cloned();
        match behavior {
            Some(TokenBehavior::Token(t)) => Ok(AccessToken::new(t)),
            Some(TokenBehavior::Unavailable) => {
                Err(BrokerError::Unavailable("connection refused".into()))
            }
            Some(TokenBehavior::Hang) => std::future::pending().await,
            None => Err(BrokerError::NotConnected(format!("no grant for {app_id}"))),
        }
    }

    async fn connect(
        &self,
        request: &ConnectRequest,
    ) -> std::result::Result<String, BrokerError> {
        self.connect_requests.lock().unwrap().push(request.clone());
        self.connect_url
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| BrokerError::Rejected {
                status: 400,
                message: "connect disabled".into(),
            })
    }
}

/// Provider strategy with scripted behavior.
pub enum ScriptedSearch {
    Files(Vec<FileRef>),
    Fail(String),
    Hang,
    Delay(Duration, Vec<FileRef>),
}

impl ScriptedSearch {
    pub fn files(provider: &str, names: &[&str]) -> Self {
        Self::Files(
            names
                .iter()
                .enumerate()
                .map(|(i, name)| FileRef::new(&format!("{provider}-{i}"), name, provider))
                .collect(),
        )
    }

    pub fn into_arc(self) -> Arc<dyn SearchProvider> {
        Arc::new(self)
    }
}

#[async_trait]
impl SearchProvider for ScriptedSearch {
    async fn search(&self, credential: &Credential, _query: &str) -> Result<Vec<FileRef>> {
        match self {
            Self::Files(files) => Ok(files.clone()),
            Self::Fail(msg) => Err(DataTuneError::Provider {
                provider: credential.provider().to_string(),
                message: msg.clone(),
            }),
            Self::Hang => std::future::pending().await,
            Self::Delay(delay, files) => {
                tokio::time::sleep(*delay).await;
                Ok(files.clone())
            }
        }
    }
}
