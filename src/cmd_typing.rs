//! One-shot browser subcommands: type, paste, tabs.

use typist_config::Config;
use typist_engine::{
    FileSettingsStore, PasteOutcome, SettingsStore, TypingControl, TypingOutcome,
};
use typist_cdp::active_page;

use crate::server::{connect_browser, Host};

/// Type text into a tab and wait until it is done. Ctrl-C stops typing at
/// the next character.
pub(crate) async fn type_text(
    config: &Config,
    tab: Option<String>,
    text: Option<String>,
    snippet: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = match snippet {
        Some(index) => Some(snippet_content(config, index).await?),
        None => text,
    };

    let host = Host::connect(config).await?;
    let tab = host.resolve_tab(tab).await?;

    let Some(mut handle) = host.engine.start_typing(tab.clone(), text) else {
        println!("Typing is already in progress for tab {}", tab);
        return Ok(());
    };

    let outcome = tokio::select! {
        result = &mut handle => result?,
        _ = tokio::signal::ctrl_c() => {
            host.engine.stop_typing(&tab).await;
            handle.await?
        }
    };

    match outcome {
        TypingOutcome::Completed { typed } => println!("Typed {} characters", typed),
        TypingOutcome::Cancelled { typed } => println!("Stopped after {} characters", typed),
        TypingOutcome::NothingToType => println!("Nothing to type: no text given and the clipboard is empty"),
        TypingOutcome::AttachFailed(e) => return Err(e.into()),
        TypingOutcome::InjectionFailed { typed, error } => {
            return Err(format!("{} (after {} characters)", error, typed).into());
        }
    }
    Ok(())
}

/// Insert text into a tab in one go.
pub(crate) async fn paste_text(
    config: &Config,
    tab: Option<String>,
    text: Option<String>,
    snippet: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = match snippet {
        Some(index) => Some(snippet_content(config, index).await?),
        None => text,
    };

    let host = Host::connect(config).await?;
    let tab = host.resolve_tab(tab).await?;

    match host.engine.force_paste(&tab, text).await {
        PasteOutcome::Pasted { chars } => println!("Pasted {} characters", chars),
        PasteOutcome::NothingToPaste => println!("Nothing to paste: no text given and the clipboard is empty"),
        PasteOutcome::AttachFailed(e) | PasteOutcome::InjectionFailed(e) => return Err(e.into()),
    }
    Ok(())
}

/// List the browser's page targets, marking the active one.
pub(crate) async fn list_tabs(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let client = connect_browser(config).await?;
    let pages = client.list_pages().await?;
    let active = active_page(&pages).map(|p| p.id.clone());

    let pages: Vec<_> = pages.into_iter().filter(|p| p.is_page()).collect();
    if pages.is_empty() {
        println!("No open tabs.");
        return Ok(());
    }

    println!("  {:<34} {:<40} {}", "ID", "TITLE", "URL");
    println!("{}", "-".repeat(100));
    for page in pages {
        let marker = if active.as_deref() == Some(page.id.as_str()) { "*" } else { " " };
        let title: String = page.title.chars().take(38).collect();
        println!("{} {:<34} {:<40} {}", marker, page.id, title, page.url);
    }
    Ok(())
}

async fn snippet_content(config: &Config, index: usize) -> Result<String, Box<dyn std::error::Error>> {
    let store = FileSettingsStore::new(config.storage.settings_path());
    let settings = store.get().await?;
    settings
        .snippets
        .get(index)
        .filter(|s| s.is_usable())
        .map(|s| s.content.clone())
        .ok_or_else(|| format!("No snippet at index {} ({} stored)", index, settings.snippets.len()).into())
}
