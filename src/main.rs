use anyhow::Result;
use content_translation::{config::Config, Database};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("content_translation=info".parse()?),
        )
        .init();

    info!("Starting content translation setup");

    // Load configuration from environment
    let config = Config::from_env()?;

    // Step 1: Open the database and make sure the table exists
    info!("Opening database at {}", config.database_url);
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    // Step 2: Register the configured content types
    let manager = config.manager(Arc::new(db));
    let types = manager.labeled_types();

    if types.is_empty() {
        info!("No content types configured, nothing else to do");
        return Ok(());
    }

    // Step 3: Report what is registered
    for (content_type, label) in &types {
        let options = manager.registry().options(content_type)?;
        info!(
            content_type = %content_type,
            label = %label,
            handler = manager.content_handler(content_type).unwrap_or("-"),
            properties = ?options.property_names(),
            label_property = %options.label_property,
            "content type registered"
        );
    }

    let locales: Vec<String> = manager
        .locale_names()
        .into_iter()
        .map(|(code, name)| format!("{name} ({code})"))
        .collect();
    info!(
        "Fallback locale: {}, supported locales: {}",
        manager.fallback_locale(),
        locales.join(", ")
    );

    info!("Content translation setup complete");
    Ok(())
}
