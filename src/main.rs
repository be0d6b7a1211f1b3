use std::sync::Arc;

use ayursutra::assessment::Catalog;
use ayursutra::chat::ws::chat_routes;
use ayursutra::chat::{Dispatcher, SessionRegistry};
use ayursutra::config::ServerConfig;
use ayursutra::intent::{IntentClassifier, KeywordClassifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::from_env()?;
    let catalog = Arc::new(Catalog::standard());
    let registry = SessionRegistry::new();

    let classifier: Option<Arc<dyn IntentClassifier>> = if config.intent_replies {
        Some(Arc::new(KeywordClassifier::new()))
    } else {
        None
    };

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&catalog),
        Arc::clone(&registry),
        classifier.clone(),
        &config,
    ));

    eprintln!("🌿 AyurSutra v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Chat WS: ws://0.0.0.0:{}/ws/chat", config.port);
    eprintln!("   Questions API: http://0.0.0.0:{}/api/questions", config.port);
    eprintln!("   Score API: http://0.0.0.0:{}/api/assessment/score", config.port);
    eprintln!("   Questions: {}", catalog.len());
    eprintln!(
        "   Intent replies: {}",
        if classifier.is_some() { "enabled" } else { "disabled" }
    );
    eprintln!();

    let app = chat_routes(catalog, registry, dispatcher, config.clone());

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "Chat server started");
    axum::serve(listener, app).await?;

    Ok(())
}
