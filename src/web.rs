use smdash::app;
use smdash::config::DashboardConfig;

/// Main entry point for the dashboard backend
///
/// Loads configuration from the environment (failing fast before any row is
/// fetched), initializes logging, and runs the web server.
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = DashboardConfig::from_env()?;

    // Start the web application with the loaded configuration
    app::run(config).await
}
