use std::net::{IpAddr, Ipv4Addr};

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notes_server::config::{ServerConfig, DEFAULT_PORT};
use notes_server::{api, db};

#[derive(Parser)]
#[command(name = "notes-server")]
#[command(about = "Backend for organizing notes into folders with file attachments")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Used when no subcommand is given
    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Apply migrations, create the default folder if needed, then exit
    Migrate {
        /// Store connection string (`:memory:`, `sqlite://path` or a file path)
        #[arg(long, env = "DATABASE_URL")]
        database: Option<String>,
    },
}

#[derive(Args)]
struct ServeArgs {
    /// Port for HTTP API
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Address to bind
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    host: IpAddr,

    /// Store connection string (`:memory:`, `sqlite://path` or a file path)
    #[arg(long, env = "DATABASE_URL")]
    database: Option<String>,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "notes_server=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Open the store, bring the schema up to date and make sure a folder exists.
fn prepare_store(config: &ServerConfig) -> anyhow::Result<db::Database> {
    tracing::info!("Opening store at {}", config.store);
    let db = db::Database::connect(&config.store)?;
    db.migrate()?;
    db.ensure_default_folder()?;
    Ok(db)
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = ServerConfig::resolve(args.database.as_deref(), args.host, args.port)?;
    let db = prepare_store(&config)?;

    let app = api::create_router(db);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Notes server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Notes server shut down");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real environment variables still apply.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Serve(args)) => serve(args).await?,
        Some(Commands::Migrate { database }) => {
            let config = ServerConfig::resolve(
                database.as_deref(),
                IpAddr::V4(Ipv4Addr::LOCALHOST),
                DEFAULT_PORT,
            )?;
            prepare_store(&config)?;
            tracing::info!("Store at {} is up to date", config.store);
        }
        None => serve(cli.serve).await?,
    }

    Ok(())
}
