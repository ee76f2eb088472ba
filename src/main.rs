use replygram::automation::DedupeTracker;
use replygram::config::Config;
use replygram::instagram::GraphClient;
use replygram::rules::RuleStore;
use replygram::server::{build_router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "replygram=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "configuration error");
            std::process::exit(1);
        }
    };

    let store = match RuleStore::open(&config.rules_path) {
        Ok(store) => store,
        Err(err) => {
            tracing::error!(
                error = %err,
                path = %config.rules_path.display(),
                "failed to open rule store"
            );
            std::process::exit(1);
        }
    };
    tracing::info!(
        rules = store.len(),
        path = %config.rules_path.display(),
        "rule store opened"
    );

    let client = match GraphClient::new(config.graph_base_url.clone(), config.access_token.clone())
    {
        Ok(client) => client,
        Err(err) => {
            tracing::error!(error = %err, "failed to build Graph API client");
            std::process::exit(1);
        }
    };

    let dedupe = config.dedupe_ttl_hours.map(DedupeTracker::new);
    tracing::info!(
        signature_auth = config.app_secret.is_some(),
        dedupe = dedupe.is_some(),
        "webhook hardening"
    );

    let state = AppState::new(store, client, config.verify_token, config.app_secret, dedupe);
    let app = build_router(state);

    tracing::info!("listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
