//! `status` command: which providers a user is connected to.

use clap::{Arg, ArgMatches, Command};
use serde_json::json;

use crate::cli;
use crate::errors::{DataTuneError, Result};
use crate::output;
use crate::search::SearchAggregator;

pub fn status_command() -> Command {
    Command::new("status")
        .about("Show which storage providers a user has connected")
        .arg(
            Arg::new("user")
                .long("user")
                .short('u')
                .required(true)
                .help("User id to check"),
        )
}

pub async fn handle_status(matches: &ArgMatches, aggregator: &SearchAggregator) -> Result<()> {
    let user = matches
        .get_one::<String>("user")
        .ok_or_else(|| DataTuneError::Command("--user is required".into()))?;
    let connected = aggregator.connected_services(user).await;

    if cli::is_json(matches) {
        let body = json!({ "user_id": user, "connected_services": connected });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    for provider in aggregator.registry().providers() {
        if connected.contains(&provider.id) {
            output::success(&format!("{}: connected", provider.display_name));
        } else {
            output::warning(&format!("{}: not connected", provider.display_name));
        }
    }
    Ok(())
}
