use std::path::PathBuf;

/// Creates the root clap Command with global `--verbose`, `--json` and
/// `--config` flags.
///
/// When `--verbose` is combined with `--json`, verbose output is suppressed
/// to keep JSON clean.
pub fn create_root_command() -> clap::Command {
    clap::Command::new("datatune")
        .about("Search files across connected cloud storage")
        .arg(
            clap::Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(clap::ArgAction::SetTrue)
                .help("Enable verbose output"),
        )
        .arg(
            clap::Arg::new("json")
                .long("json")
                .global(true)
                .action(clap::ArgAction::SetTrue)
                .help("Output in JSON format"),
        )
        .arg(
            clap::Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Settings file (default: ~/.datatune/config.json)"),
        )
}

/// Returns whether verbose mode is active based on parsed matches.
///
/// Verbose is suppressed when `--json` is also set, to keep JSON output clean.
pub fn is_verbose(matches: &clap::ArgMatches) -> bool {
    let verbose = matches.get_flag("verbose");
    let json = matches.get_flag("json");
    verbose && !json
}

pub fn is_json(matches: &clap::ArgMatches) -> bool {
    matches.get_flag("json")
}

pub fn config_path(matches: &clap::ArgMatches) -> Option<PathBuf> {
    matches.get_one::<PathBuf>("config").cloned()
}
