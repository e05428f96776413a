//! `serve` command: run the HTTP API until interrupted.

use std::sync::Arc;

use clap::{Arg, ArgMatches, Command};

use crate::errors::Result;
use crate::output;
use crate::server::config::ServerConfig;
use crate::server::session::SessionStore;
use crate::server::{start_server, AppState};

use super::Services;

pub fn serve_command() -> Command {
    Command::new("serve")
        .about("Start the HTTP API server")
        .aliases(["http", "server"])
        .arg(Arg::new("host").long("host").default_value("0.0.0.0").help("Host to bind HTTP server to"))
        .arg(
            Arg::new("port")
                .long("port")
                .default_value("8000")
                .value_parser(clap::value_parser!(u16))
                .help("Port to run HTTP server on"),
        )
        .arg(Arg::new("public-url").long("public-url").help("Base URL browsers reach the server at"))
}

fn server_config(matches: &ArgMatches) -> ServerConfig {
    let defaults = ServerConfig::default();
    ServerConfig {
        host: matches.get_one::<String>("host").cloned().unwrap_or(defaults.host),
        port: matches.get_one::<u16>("port").copied().unwrap_or(defaults.port),
        public_url: matches.get_one::<String>("public-url").cloned(),
    }
}

pub async fn handle_serve(matches: &ArgMatches, services: &Services) -> Result<()> {
    let config = server_config(matches);
    let state = Arc::new(AppState::new(
        Arc::clone(services.aggregator().await?),
        Arc::clone(services.connect().await?),
        SessionStore::new(services.settings.session_ttl()),
        config.public_url.clone(),
    ));

    let handle = start_server(config, state).await?;
    output::success(&format!("Listening on http://{}", handle.local_addr()));

    services.shutdown_token().cancelled().await;
    handle.shutdown().await?;
    output::info("Server stopped");
    Ok(())
}
