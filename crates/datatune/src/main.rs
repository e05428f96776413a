use datatune_lib::cli::{config_path, create_root_command, is_verbose};
use datatune_lib::commands::{dispatch_command, register_commands, Services};
use datatune_lib::config::{EnvConfig, Settings};
use datatune_lib::errors::{handle_command_error, handle_fatal, DataTuneError};
use datatune_lib::http_client::HttpClient;
use datatune_lib::signal::SignalHandler;

#[tokio::main]
async fn main() {
    // Secrets and switches from the environment
    let env = EnvConfig::from_env();

    // Parse arguments first so --verbose can pick the log level
    let matches = register_commands(create_root_command()).get_matches();
    let verbose = is_verbose(&matches);
    datatune_lib::logger::init(verbose, env.json_logs);

    // Ctrl-C / SIGTERM cancel long-running commands
    let signal_handler = SignalHandler::new();
    let shutdown = signal_handler.token();
    tokio::spawn(async move {
        signal_handler.listen().await;
    });

    let settings = Settings::load(config_path(&matches).as_deref()).unwrap_or_else(|e| handle_fatal(e));
    let http_client = HttpClient::new(&settings).unwrap_or_else(|e| handle_fatal(e));
    let services = Services::new(settings, env, http_client).with_shutdown(shutdown);

    match matches.subcommand() {
        Some((name, sub_matches)) => {
            tracing::debug!(command = name, "Executing command");
            if let Err(e) = dispatch_command(name, sub_matches, &services).await {
                handle_command_error(&e);
                std::process::exit(1);
            }
        }
        None => {
            let mut cmd = register_commands(create_root_command());
            if let Err(e) = cmd.print_help() {
                handle_fatal(DataTuneError::Application(format!("Failed to print help: {e}")));
            }
        }
    }
}
