use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leaderboard_engine::api::{build_router, state::AppState};
use leaderboard_engine::calculate::{self, rank_rows};
use leaderboard_engine::config::{AppConfig, ClientConfig};
use leaderboard_engine::controller::{
    HttpClient, LeaderboardSession, LocalClient, QueryClient, ViewSnapshot,
};
use leaderboard_engine::models::{
    GameSession, NewGameSession, Player, RollupResult, Tenant, ViewRequest,
};
use leaderboard_engine::room::{HttpRoomResolver, RoomResolver};
use leaderboard_engine::storage::{
    FactFile, FactStore, JsonlFactStore, JsonlReader, StorageConfig,
};

#[derive(Parser)]
#[command(name = "leaderboard")]
#[command(about = "Multi-tenant leaderboard drill-down engine")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run one query against the data directory and print JSON
    Query {
        /// Query string as accepted by /api/leaderboard, e.g.
        /// "view=company_detail&company=acme&products=Trivia"
        query: String,

        /// Attach positional ranks and medals to player rankings
        #[arg(long)]
        ranked: bool,
    },

    /// Append fact rows from JSONL files
    Import {
        /// Session records without ids
        #[arg(long)]
        sessions: Option<PathBuf>,

        /// Tenant records
        #[arg(long)]
        tenants: Option<PathBuf>,

        /// Player profiles
        #[arg(long)]
        players: Option<PathBuf>,
    },

    /// Walk the drill-down and print each view as it settles
    Browse {
        /// Company to open
        #[arg(long)]
        company: String,

        /// Product filters to toggle on at the company tier
        #[arg(long = "filter-product")]
        filter_products: Vec<String>,

        /// Game type filters to toggle on at the company tier
        #[arg(long = "filter-game-type")]
        filter_game_types: Vec<String>,

        /// Product of the row to open
        #[arg(long, requires = "game_type")]
        product: Option<String>,

        /// Game type of the row to open
        #[arg(long, requires = "product")]
        game_type: Option<String>,

        /// Query a running server instead of the local data directory.
        /// Without a value, `[client] base_url` from the config is used.
        #[arg(long, value_name = "URL")]
        remote: Option<Option<String>>,
    },

    /// Resolve a room code and print the redirect path
    ResolveRoom {
        code: String,

        /// Room service root URL (overrides the config file)
        #[arg(long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    tracing::info!("Starting leaderboard v{}", env!("CARGO_PKG_VERSION"));

    let storage = StorageConfig::new(config.data_dir.clone());

    match cli.command {
        Commands::Serve { host, port } => {
            let mut server = config.server.clone();
            if let Some(host) = host {
                server.host = host;
            }
            if let Some(port) = port {
                server.port = port;
            }
            let addr = format!("{}:{}", server.host, server.port);

            let store: Arc<dyn FactStore> = Arc::new(JsonlFactStore::new(storage));
            let app = build_router(AppState::new(store).with_server_config(server));
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Leaderboard API: http://{}/api/leaderboard", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Query { query, ranked } => {
            let request = ViewRequest::from_query_string(query.trim_start_matches('?'))?;
            let store = JsonlFactStore::new(storage);
            let output = match request {
                ViewRequest::Rollup(scope) => match calculate::aggregate(&store, &scope)? {
                    RollupResult::Companies(rows) => serde_json::to_string_pretty(&rows)?,
                    RollupResult::CompanyDetail(rows) => serde_json::to_string_pretty(&rows)?,
                    RollupResult::PlayerRankings(rows) if ranked => {
                        serde_json::to_string_pretty(&rank_rows(&rows))?
                    }
                    RollupResult::PlayerRankings(rows) => serde_json::to_string_pretty(&rows)?,
                },
                ViewRequest::Filters(tenant) => {
                    serde_json::to_string_pretty(&calculate::available_filters(&store, &tenant)?)?
                }
            };
            println!("{}", output);
        }
        Commands::Import {
            sessions,
            tenants,
            players,
        } => {
            if let Some(path) = sessions {
                let rows: Vec<GameSession> = JsonlReader::<NewGameSession>::new(path.clone())
                    .read_all()
                    .with_context(|| format!("reading {}", path.display()))?
                    .into_iter()
                    .map(GameSession::from)
                    .collect();
                let written = JsonlFactStore::new(storage.clone()).append_sessions(&rows)?;
                println!(
                    "Sessions: {} read, {} appended, {} already present",
                    rows.len(),
                    written,
                    rows.len() - written
                );
                let stored =
                    JsonlReader::<GameSession>::for_fact(&storage, FactFile::Sessions).count()?;
                println!("Sessions stored: {}", stored);
            }
            if let Some(path) = tenants {
                let rows = JsonlReader::<Tenant>::new(path).read_all()?;
                let written = JsonlFactStore::new(storage.clone()).append_tenants(&rows)?;
                println!("Tenants: {} read, {} appended", rows.len(), written);
            }
            if let Some(path) = players {
                let rows = JsonlReader::<Player>::new(path).read_all()?;
                let written = JsonlFactStore::new(storage.clone()).append_players(&rows)?;
                println!("Players: {} read, {} appended", rows.len(), written);
            }
        }
        Commands::Browse {
            company,
            filter_products,
            filter_game_types,
            product,
            game_type,
            remote,
        } => {
            let client: Arc<dyn QueryClient> = match remote_base_url(remote, &config.client) {
                Some(url) => {
                    tracing::info!("Browsing {}", url);
                    Arc::new(HttpClient::new(&url, config.client.timeout())?)
                }
                None => Arc::new(LocalClient::new(Arc::new(JsonlFactStore::new(storage)))),
            };
            let mut session = LeaderboardSession::new(client);

            session.refresh().await;
            print_snapshot("companies", &session.settled_snapshot().await)?;

            session.select_company(company.as_str()).await?;
            print_snapshot("company", &session.settled_snapshot().await)?;

            if !filter_products.is_empty() || !filter_game_types.is_empty() {
                for p in &filter_products {
                    session.toggle_product(p).await?;
                }
                for g in &filter_game_types {
                    session.toggle_game_type(g).await?;
                }
                print_snapshot("filtered", &session.settled_snapshot().await)?;
            }

            if let (Some(product), Some(game_type)) = (product, game_type) {
                session.select_row(&product, &game_type).await?;
                print_snapshot("players", &session.settled_snapshot().await)?;
            }
        }
        Commands::ResolveRoom { code, url } => {
            let base = url.unwrap_or_else(|| config.client.room_service_url.clone());
            let resolver = HttpRoomResolver::new(&base, config.client.timeout())?;
            let target = resolver.resolve(&code).await?;
            println!("{}", target.redirect_path());
        }
    }

    Ok(())
}

/// `--remote URL` wins, a bare `--remote` falls back to the configured base
/// URL, and no flag means the local data directory.
fn remote_base_url(remote: Option<Option<String>>, client: &ClientConfig) -> Option<String> {
    remote.map(|url| url.unwrap_or_else(|| client.base_url.clone()))
}

fn print_snapshot(step: &str, snapshot: &ViewSnapshot) -> Result<()> {
    println!("=== {} ===", step);
    println!("{}", serde_json::to_string_pretty(snapshot)?);
    Ok(())
}
