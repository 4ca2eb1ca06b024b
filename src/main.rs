use rideline::api::{self, AppState};
use rideline::config::Config;
use rideline::db::init_db;
use rideline::dispatch::{Dispatch, TimeoutScheduler};
use rideline::events::EventHub;
use rideline::lifecycle::{TripCreator, TripLocation, TripRatings, TripUpdater};
use rideline::promotions::Promotions;
use rideline::routing::OrsRouteProvider;
use rideline::settlement::Settlement;
use rideline::{Repository, RouteProvider};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    // Initialize database and dependencies
    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let repo = Arc::new(Repository::new(pool));
    let hub = Arc::new(EventHub::new());
    let router_provider: Arc<dyn RouteProvider> = Arc::new(OrsRouteProvider::new(
        config.routing_api_url.clone(),
        config.routing_api_key.clone(),
    ));

    let creator = Arc::new(TripCreator::new(
        repo.clone(),
        router_provider,
        hub.clone(),
        config.search_timeout_secs,
    ));
    let updater = Arc::new(TripUpdater::new(repo.clone(), hub.clone()));
    let dispatch = Arc::new(Dispatch::new(repo.clone(), hub.clone()));
    let ratings = Arc::new(TripRatings::new(repo.clone()));
    let location = Arc::new(TripLocation::new(repo.clone(), hub.clone()));
    let settlement = Arc::new(Settlement::new(repo.clone()));
    let promotions = Arc::new(Promotions::new(repo.clone()));

    // Background sweep for armed search timeouts
    let scheduler = TimeoutScheduler::new(
        repo.clone(),
        updater.clone(),
        Duration::from_secs(config.timeout_poll_secs),
    );
    tokio::spawn(scheduler.run());

    // Create router
    let app = api::create_router(AppState {
        repo,
        config,
        hub,
        creator,
        updater,
        dispatch,
        ratings,
        location,
        settlement,
        promotions,
    });

    // Bind to address
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
