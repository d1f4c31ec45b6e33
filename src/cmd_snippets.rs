//! Snippet library and menu subcommand handlers.

use typist_config::Config;
use typist_engine::{FileSettingsStore, SettingsPatch, SettingsStore, Snippet};
use typist_menu::{build_menu, truncate_title, MenuItem};

use crate::cli::SnippetAction;

/// Handle snippet subcommands.
pub(crate) async fn handle_snippet_command(
    config: &Config,
    action: SnippetAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileSettingsStore::new(config.storage.settings_path());

    match action {
        SnippetAction::List { format } => snippet_list(&store, &format).await,
        SnippetAction::Add { name, content } => snippet_add(&store, &name, &content).await,
        SnippetAction::Remove { index } => snippet_remove(&store, index).await,
        SnippetAction::Clear => {
            store.set(SettingsPatch::snippets(Vec::new())).await?;
            println!("Removed all snippets");
            Ok(())
        }
    }
}

async fn snippet_list(
    store: &FileSettingsStore,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let snippets = store.get().await?.snippets;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&snippets)?);
        return Ok(());
    }

    if snippets.is_empty() {
        println!("No snippets stored.");
        return Ok(());
    }

    println!("{:<6} {:<36} {}", "INDEX", "NAME", "CONTENT");
    println!("{}", "-".repeat(80));
    for (index, snippet) in snippets.iter().enumerate() {
        if !snippet.is_usable() {
            println!("{:<6} {:<36}", index, "(invalid entry)");
            continue;
        }
        let preview: String = snippet.content.replace('\n', " ").chars().take(40).collect();
        println!("{:<6} {:<36} {}", index, truncate_title(&snippet.name), preview);
    }
    Ok(())
}

async fn snippet_add(
    store: &FileSettingsStore,
    name: &str,
    content: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let snippet = Snippet::new(name, content)?;
    let mut snippets = store.get().await?.snippets;
    snippets.push(snippet);
    let index = snippets.len() - 1;

    store.set(SettingsPatch::snippets(snippets)).await?;
    println!("Added snippet {} at index {}", name.trim(), index);
    Ok(())
}

async fn snippet_remove(
    store: &FileSettingsStore,
    index: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut snippets = store.get().await?.snippets;
    if index >= snippets.len() {
        return Err(format!("No snippet at index {} ({} stored)", index, snippets.len()).into());
    }
    let removed = snippets.remove(index);

    store.set(SettingsPatch::snippets(snippets)).await?;
    println!("Removed snippet {}", removed.name);
    Ok(())
}

/// Print the menu the stored snippets produce.
pub(crate) async fn show_menu(config: &Config, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileSettingsStore::new(config.storage.settings_path());
    let items = build_menu(&store.get().await?.snippets);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    for item in &items {
        print_item(item);
    }
    Ok(())
}

fn print_item(item: &MenuItem) {
    let indent = if item.parent_id.is_some() { "    " } else { "" };
    let suffix = if item.is_action() { "" } else { " >" };
    println!("{}{}{}  [{}]", indent, item.title, suffix, item.id);
}
