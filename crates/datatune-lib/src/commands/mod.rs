pub mod providers;
pub mod search;
#[cfg(feature = "http-server")]
pub mod serve;
pub mod status;

use std::sync::Arc;

use clap::ArgMatches;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use crate::broker::{DescopeBroker, TokenBroker};
use crate::config::{EnvConfig, Settings};
use crate::connect::ConnectService;
use crate::credentials::CredentialResolver;
use crate::errors::{DataTuneError, Result};
use crate::http_client::HttpClient;
use crate::providers::{default_registry, ProviderRegistry};
use crate::search::SearchAggregator;

/// Central holder for the services commands run against.
///
/// The broker is built on first use, so commands that never talk to it
/// (e.g. `providers`) work without broker credentials in the environment.
pub struct Services {
    pub settings: Settings,
    pub env: EnvConfig,
    pub http_client: HttpClient,
    pub registry: ProviderRegistry,
    shutdown: CancellationToken,
    broker: OnceCell<Arc<dyn TokenBroker>>,
    aggregator: OnceCell<Arc<SearchAggregator>>,
    connect: OnceCell<Arc<ConnectService>>,
}

impl Services {
    pub fn new(settings: Settings, env: EnvConfig, http_client: HttpClient) -> Self {
        Self {
            settings,
            env,
            http_client,
            registry: default_registry(),
            shutdown: CancellationToken::new(),
            broker: OnceCell::new(),
            aggregator: OnceCell::new(),
            connect: OnceCell::new(),
        }
    }

    /// Use `broker` instead of building one from the environment.
    pub fn with_broker(mut self, broker: Arc<dyn TokenBroker>) -> Self {
        self.broker = OnceCell::from(broker);
        self
    }

    /// Token that long-running commands watch to stop.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub async fn broker(&self) -> Result<&Arc<dyn TokenBroker>> {
        self.broker
            .get_or_try_init(|| async {
                let broker =
                    DescopeBroker::from_config(self.http_client.clone(), &self.settings, &self.env)?;
                Ok::<_, DataTuneError>(Arc::new(broker) as Arc<dyn TokenBroker>)
            })
            .await
    }

    async fn resolver(&self) -> Result<CredentialResolver> {
        let broker = self.broker().await?;
        Ok(CredentialResolver::new(
            Arc::clone(broker),
            self.settings.broker_timeout(),
        ))
    }

    pub async fn aggregator(&self) -> Result<&Arc<SearchAggregator>> {
        self.aggregator
            .get_or_try_init(|| async {
                let resolver = self.resolver().await?;
                Ok::<_, DataTuneError>(Arc::new(SearchAggregator::new(
                    self.registry.clone(),
                    resolver,
                    self.settings.provider_timeout(),
                )))
            })
            .await
    }

    pub async fn connect(&self) -> Result<&Arc<ConnectService>> {
        self.connect
            .get_or_try_init(|| async {
                let resolver = self.resolver().await?;
                Ok::<_, DataTuneError>(Arc::new(ConnectService::new(
                    self.registry.clone(),
                    resolver,
                    self.settings.pending_connect_ttl(),
                )))
            })
            .await
    }
}

/// Add every subcommand to the root command.
pub fn register_commands(root: clap::Command) -> clap::Command {
    let root = root
        .subcommand(search::search_command())
        .subcommand(providers::providers_command())
        .subcommand(status::status_command());
    #[cfg(feature = "http-server")]
    let root = root.subcommand(serve::serve_command());
    root
}

/// Run the handler for subcommand `name`.
pub async fn dispatch_command(name: &str, matches: &ArgMatches, services: &Services) -> Result<()> {
    match name {
        "search" => search::handle_search(matches, services.aggregator().await?.as_ref()).await,
        "providers" => providers::handle_providers(matches, &services.registry),
        "status" => status::handle_status(matches, services.aggregator().await?.as_ref()).await,
        #[cfg(feature = "http-server")]
        "serve" => serve::handle_serve(matches, services).await,
        other => Err(DataTuneError::Command(format!("unknown command: {}", other))),
    }
}
