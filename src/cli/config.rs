use crate::client::normalize_base_url;
use crate::error::Result;
use crate::logging::log_path;
use crate::settings::{config_dir, load_settings, save_settings, Settings};

pub fn show(settings: &Settings) -> Result<()> {
    println!("{}", format_settings(settings));
    Ok(())
}

pub fn format_settings(settings: &Settings) -> String {
    let lines = [
        format!("API URL:       {}", settings.api_url),
        format!("Retries:       {}", settings.retries),
        format!("Retry delay:   {} ms", settings.retry_delay_ms),
        format!("Timeout:       {} s", settings.timeout_secs),
        format!("Cache window:  {} s", settings.stale_secs),
        format!("Log level:     {}", settings.log_level),
        format!(
            "Last location: {}",
            settings.last_location.as_deref().unwrap_or("(none)")
        ),
        format!("Config dir:    {}", config_dir().display()),
        format!("Log file:      {}", log_path().display()),
    ];
    lines.join("\n")
}

/// Save a new API URL. Only the saved file changes; a `--api-url` override
/// on this invocation is ignored.
pub fn set_url(url: &str) -> Result<()> {
    let normalized = normalize_base_url(url)?;
    let mut settings = load_settings();
    settings.api_url = normalized.to_string();
    save_settings(&settings)?;
    println!("API URL set to {}", settings.api_url);
    Ok(())
}
