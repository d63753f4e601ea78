//! `switchyard init`: Write the default configuration file.

use switchyard_config::AppConfig;

pub async fn run(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("Created config directory: {}", config_dir.display());
    }

    if config_path.exists() && !force {
        println!("Config already exists at: {}", config_path.display());
        println!("Edit it manually or re-run with --force to overwrite.");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("Wrote config: {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Point [backend] base_url at your OpenAI-compatible server");
    println!("  2. Run: switchyard ask -m \"What is India's GDP trend from 2010 to 2022?\"");

    Ok(())
}
