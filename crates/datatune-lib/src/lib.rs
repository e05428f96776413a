// datatune-lib: multi-provider storage search behind a token broker

// Always-available modules
pub mod broker;
pub mod cli;
pub mod commands;
pub mod config;
pub mod connect;
pub mod credentials;
pub mod errors;
pub mod http_client;
pub mod logger;
pub mod output;
pub mod providers;
pub mod search;
pub mod signal;
pub mod utils;

// Feature-gated modules
#[cfg(feature = "http-server")]
pub mod server;

#[cfg(test)]
mod testing;
