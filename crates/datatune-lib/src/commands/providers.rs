//! `providers` command: list the configured storage providers.

use clap::{ArgMatches, Command};

use crate::cli;
use crate::errors::Result;
use crate::output;
use crate::providers::{Provider, ProviderRegistry};

pub fn providers_command() -> Command {
    Command::new("providers").about("List configured storage providers")
}

fn describe(provider: &Provider) -> String {
    let mut line = format!(
        "{} ({}), app {}",
        provider.id, provider.display_name, provider.app_id
    );
    if !provider.scopes.is_empty() {
        line.push_str(&format!(", scopes: {}", provider.scopes.join(" ")));
    }
    if !provider.aliases.is_empty() {
        line.push_str(&format!(", also: {}", provider.aliases.join(", ")));
    }
    line
}

pub fn handle_providers(matches: &ArgMatches, registry: &ProviderRegistry) -> Result<()> {
    if cli::is_json(matches) {
        let providers: Vec<&Provider> = registry.providers().collect();
        println!("{}", serde_json::to_string_pretty(&providers)?);
        return Ok(());
    }
    for provider in registry.providers() {
        output::info(&describe(provider));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::catalog;

    #[test]
    fn test_describe() {
        assert_eq!(
            describe(&catalog::one_drive()),
            "one-drive (OneDrive), app datatune-one-drive, scopes: Files.ReadWrite User.Read"
        );
        assert!(describe(&catalog::custom_oauth()).ends_with("also: azure-blob-storage, aws-s3, gcp-cloud-storage"));
    }
}
