use std::sync::Arc;

use mail_triage::config::ServerConfig;
use mail_triage::llm::{EnvCredentials, ModelSettings, create_model_client, resolve_api_key};
use mail_triage::pipeline::Classifier;
use mail_triage::server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Pick up GEMINI_API_KEY and friends from a local .env, if present
    let _ = dotenvy::dotenv();

    let config = ServerConfig::from_env();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.default_log_filter())),
        )
        .with_target(false)
        .init();

    let settings = ModelSettings::from_env();

    eprintln!("📬 mail-triage v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", settings.model);
    eprintln!("   API: http://{}:{}/classify-email", config.host, config.port);
    eprintln!("   Info: http://{}:{}/info\n", config.host, config.port);

    if resolve_api_key(&EnvCredentials).is_err() {
        tracing::warn!("No GEMINI_API_KEY or GOOGLE_API_KEY set; classification requests will return missing_api_key");
    }

    let classifier = Arc::new(Classifier::new(create_model_client(settings)));
    server::serve(&config, classifier).await?;

    Ok(())
}
