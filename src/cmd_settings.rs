//! Settings subcommand handlers.

use typist_config::Config;
use typist_engine::{FileSettingsStore, SettingsPatch, SettingsStore};

use crate::cli::SettingsAction;

/// Handle settings subcommands.
pub(crate) async fn handle_settings_command(
    config: &Config,
    action: SettingsAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileSettingsStore::new(config.storage.settings_path());

    match action {
        SettingsAction::Show => {}
        SettingsAction::Set {
            wpm,
            min_delay,
            max_delay,
        } => {
            if wpm.is_none() && min_delay.is_none() && max_delay.is_none() {
                return Err("Nothing to set: pass --wpm, --min-delay or --max-delay".into());
            }
            store
                .set(SettingsPatch {
                    typing_speed: wpm,
                    min_typing_speed: min_delay,
                    max_typing_speed: max_delay,
                    snippets: None,
                })
                .await?;
        }
        SettingsAction::Reset => {
            store.set(SettingsPatch::reset_pacing()).await?;
        }
    }

    let settings = store.get().await?;
    let pacing = settings.pacing()?;
    let (min, max) = pacing.delay_bounds();

    println!("Settings file:  {}", store.path().display());
    println!("Typing speed:   {} WPM", settings.typing_speed);
    println!(
        "Extra delay:    {}-{} ms per character",
        settings.min_typing_speed, settings.max_typing_speed
    );
    println!(
        "Total delay:    {:.0}-{:.0} ms per character",
        min.as_secs_f64() * 1000.0,
        max.as_secs_f64() * 1000.0
    );
    println!("Snippets:       {}", settings.snippets.len());
    Ok(())
}
