//! `search` command: query every provider for one user.

use clap::{Arg, ArgMatches, Command};

use crate::cli;
use crate::errors::{DataTuneError, Result};
use crate::output;
use crate::search::{AggregateResult, SearchAggregator};

pub fn search_command() -> Command {
    Command::new("search")
        .about("Search files across every configured storage provider")
        .aliases(["s"])
        .arg(
            Arg::new("user")
                .long("user")
                .short('u')
                .required(true)
                .help("User id whose connections are searched"),
        )
        .arg(
            Arg::new("query")
                .required(true)
                .num_args(1..)
                .help("Search terms"),
        )
}

/// The query as typed, words joined by single spaces.
fn query_from(matches: &ArgMatches) -> String {
    matches
        .get_many::<String>("query")
        .map(|words| words.map(String::as_str).collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

pub async fn handle_search(matches: &ArgMatches, aggregator: &SearchAggregator) -> Result<()> {
    let user = matches
        .get_one::<String>("user")
        .ok_or_else(|| DataTuneError::Command("--user is required".into()))?;
    let query = query_from(matches);
    if query.trim().is_empty() {
        return Err(DataTuneError::Command("Search query is required".into()));
    }

    let result = aggregator.search_all(user, &query).await;
    print_result(&result, cli::is_json(matches))
}

fn print_result(result: &AggregateResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&result.report())?);
    } else {
        if result.connected_services().is_empty() {
            output::warning("No connected services returned results");
        }
        output::render_report(result);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::create_root_command;
    use crate::commands::register_commands;
    use crate::commands::tests::services_with;
    use crate::testing::{FakeBroker, TokenBehavior};
    use std::sync::Arc;

    fn parse(args: &[&str]) -> ArgMatches {
        let root = register_commands(create_root_command());
        let matches = root.try_get_matches_from(args).unwrap();
        matches.subcommand_matches("search").unwrap().clone()
    }

    #[test]
    fn test_query_words_are_joined() {
        let matches = parse(&["datatune", "search", "--user", "u1", "quarterly", "report"]);
        assert_eq!(query_from(&matches), "quarterly report");
        assert_eq!(matches.get_one::<String>("user").unwrap(), "u1");
    }

    #[test]
    fn test_global_json_flag_reaches_subcommand() {
        assert!(cli::is_json(&parse(&["datatune", "--json", "search", "-u", "u1", "q"])));
        assert!(cli::is_json(&parse(&["datatune", "search", "--json", "-u", "u1", "q"])));
        assert!(!cli::is_json(&parse(&["datatune", "search", "-u", "u1", "q"])));
    }

    #[test]
    fn test_user_is_required() {
        let root = register_commands(create_root_command());
        assert!(root.try_get_matches_from(["datatune", "search", "report"]).is_err());
    }

    #[tokio::test]
    async fn test_blank_query_rejected() {
        let services = services_with(Arc::new(FakeBroker::new()));
        let matches = parse(&["datatune", "search", "-u", "u1", "  "]);
        let err = handle_search(&matches, services.aggregator().await.unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DataTuneError::Command(msg) if msg.contains("required")));
    }

    #[tokio::test]
    async fn test_search_runs_and_prints_json() {
        let broker = Arc::new(
            FakeBroker::new().with("datatune-google-drive", TokenBehavior::Token("g".into())),
        );
        let services = services_with(broker.clone());
        let matches = parse(&["datatune", "--json", "search", "-u", "u1", "report"]);
        handle_search(&matches, services.aggregator().await.unwrap())
            .await
            .unwrap();
        assert_eq!(broker.calls(), 3);
    }
}
