//! Check command implementation.

use crate::config::AppConfig;
use hardlinker_api::SyncthingClient;
use hardlinker_engine::check_connection;

/// Runs the check command.
pub async fn run(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let client = SyncthingClient::new(&config.client_config()?)?;
    println!("Checking Syncthing at {}", client.base_url());

    match check_connection(&client).await {
        Ok(()) => {
            println!("✓ Connection healthy, no errors reported");
            Ok(())
        }
        Err(err) => {
            println!("✗ {}", err);
            Err(err.into())
        }
    }
}
