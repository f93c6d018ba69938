//! press-review: music-press search, analysis and sharing
//!
//! This is the main entry point for the application.

use anyhow::Result;
use clap::Parser;
use press_review::{
    auth::SessionSigner,
    config,
    network::HttpClient,
    providers::ProviderLoader,
    web::{create_router, AppState},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const ENV_HELP: &str = "\
ENVIRONMENT VARIABLES:
    PRESS_REVIEW_SETTINGS_PATH  Path to settings.yml
    PRESS_REVIEW_DEBUG          Enable debug mode (true/false)
    PRESS_REVIEW_PORT           Server port
    PRESS_REVIEW_BIND_ADDRESS   Bind address
    PRESS_REVIEW_SECRET_KEY     Key used to verify session tokens
    PRESS_REVIEW_APP_URL        Public base URL for share links
    BING_API_KEY, BING_ENDPOINT, NEWS_API_KEY, GOOGLE_NEWS_API_KEY
    OPENAI_API_KEY              Enables the llm scorer";

/// Music-press search, analysis and sharing service
#[derive(Debug, Parser)]
#[command(name = "press-review", version, about, after_help = ENV_HELP)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print a session token for USER and exit
    #[arg(long, value_name = "USER")]
    issue_token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = config::load(cli.config)?;

    if let Some(user) = cli.issue_token {
        println!("{}", SessionSigner::new(&settings.server.secret_key).sign(&user));
        return Ok(());
    }

    // RUST_LOG wins; otherwise the debug flag decides
    let default_level = if settings.general.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    info!("Starting press-review v{}", press_review::VERSION);
    info!("Loaded configuration for instance: {}", settings.general.instance_name);

    // Initialize HTTP client
    let client = HttpClient::with_settings(&settings.outgoing)?;

    // Load providers
    let registry = ProviderLoader::load(&settings)?;
    info!("Loaded {} search providers", registry.len());

    let addr = SocketAddr::new(settings.server.bind_address.parse()?, settings.server.port);

    let state = AppState::new(settings, registry, client)?;
    info!("Application state initialized");

    let app = create_router(state);

    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
