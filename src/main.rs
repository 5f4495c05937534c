use spotter_lookup::config::Config;
use spotter_lookup::models::Entity;
use spotter_lookup::Integration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Looks up every IP given on the command line and prints the results as JSON.
///
/// Connection settings come from the environment (or a `.env` file), see
/// `Config::from_env`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spotter_lookup=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;

    let integration = Integration::startup(&config)?;

    let errors = integration.validate_options(&config.lookup);
    if !errors.is_empty() {
        for error in &errors {
            tracing::error!("Invalid option {}", error);
        }
        anyhow::bail!("{} invalid option(s)", errors.len());
    }

    let entities: Vec<Entity> = std::env::args().skip(1).map(Entity::new).collect();
    if entities.is_empty() {
        anyhow::bail!("usage: spotter-lookup <ip> [<ip> ...]");
    }

    let results = integration.do_lookup(&entities, &config.lookup).await?;

    println!("{}", serde_json::to_string_pretty(&results)?);

    Ok(())
}
