//! `incant config`: Configuration management commands.

use incant_config::AppConfig;

pub fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    println!("{}", redacted_toml(&config)?);
    Ok(())
}

/// Render the configuration as TOML with the API key masked.
fn redacted_toml(config: &AppConfig) -> Result<String, toml::ser::Error> {
    let mut shown = config.clone();
    if shown.has_api_key() {
        shown.api_key = Some("[REDACTED]".into());
    }
    toml::to_string_pretty(&shown)
}

pub fn path() {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
}

pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let dir = AppConfig::config_dir();
    let config_path = dir.join("config.toml");

    if config_path.exists() {
        println!("  Config already exists at {}", config_path.display());
        return Ok(());
    }

    std::fs::create_dir_all(&dir)?;
    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("  Wrote starter config to {}", config_path.display());
    println!("  Set GEMINI_API_KEY (or api_key in the file) before chatting.");
    Ok(())
}
