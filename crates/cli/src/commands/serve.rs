//! `switchyard serve`: Start the HTTP gateway.

use super::load_config;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config()?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("Switchyard Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Backend:   {} ({})", config.backend.model, config.backend.base_url);

    switchyard_gateway::start(config).await?;

    Ok(())
}
