//! typist - human-paced typing into browser tabs.
//!
//! Main entry point for the typist CLI and JSON-line server.

mod cli;
mod cmd_settings;
mod cmd_snippets;
mod cmd_typing;
mod server;

use clap::Parser;
use tracing::warn;

use typist_config::{ConfigLoader, ConfigValidator};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::load_or_default(&cli.config)?;
    if let Some(endpoint) = cli.endpoint {
        config.browser.endpoint = endpoint;
    }

    server::init_tracing(&config.logging)?;

    let validation = ConfigValidator::validate(&config);
    for warning in &validation.warnings {
        warn!("Config: {}: {}", warning.path, warning.message);
    }
    if !validation.is_valid() {
        let errors: Vec<String> = validation.errors.iter().map(|e| e.to_string()).collect();
        return Err(format!("Invalid configuration: {}", errors.join("; ")).into());
    }

    match cli.command {
        None | Some(Commands::Serve) => server::run_server(&config).await,
        Some(Commands::Type { tab, text, snippet }) => {
            cmd_typing::type_text(&config, tab, text, snippet).await
        }
        Some(Commands::Paste { tab, text, snippet }) => {
            cmd_typing::paste_text(&config, tab, text, snippet).await
        }
        Some(Commands::Tabs) => cmd_typing::list_tabs(&config).await,
        Some(Commands::Menu { format }) => cmd_snippets::show_menu(&config, &format).await,
        Some(Commands::Snippets { action }) => {
            cmd_snippets::handle_snippet_command(&config, action).await
        }
        Some(Commands::Settings { action }) => {
            cmd_settings::handle_settings_command(&config, action).await
        }
    }
}
