//! Knowledge Hub server and admin commands.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use knowledge_hub::api::{self, AppState};
use knowledge_hub::config::Config;
use knowledge_hub_core::auth::password::hash_password;
use knowledge_hub_core::auth::Hs256Tokens;
use knowledge_hub_core::events::{EventBus, Event};
use knowledge_hub_core::models::Role;
use knowledge_hub_core::services::DocumentService;
use knowledge_hub_core::storage::Store;
use knowledge_hub_core::{seed, validation};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "knowledge-hub")]
#[command(about = "Team knowledge base with sharing and version history")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Listen address (overrides BIND_ADDR)
        #[arg(short, long)]
        addr: Option<String>,

        /// Database URL (overrides DATABASE_URL)
        #[arg(long)]
        database_url: Option<String>,
    },

    /// Apply pending database migrations
    Migrate,

    /// Create a user account
    CreateUser {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        /// Grant the ADMIN role
        #[arg(long)]
        admin: bool,
    },

    /// Load sample users and documents
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,knowledge_hub=debug")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load()?;

    match cli.command {
        Commands::Serve { addr, database_url } => {
            if let Some(addr) = addr {
                config.bind_addr = addr;
            }
            if let Some(url) = database_url {
                config.database_url = url;
            }
            run_server(config).await?;
        }
        Commands::Migrate => {
            let store = open_store(&config).await?;
            store.close().await;
        }
        Commands::CreateUser {
            name,
            email,
            password,
            admin,
        } => {
            let store = open_store(&config).await?;
            let name = validation::name(&name)?;
            let email = validation::email(&email)?;
            let hash = hash_password(validation::password(&password)?)?;
            let role = if admin { Role::Admin } else { Role::User };
            let user = store.create_user(&name, &email, &hash, role).await?;
            println!("created user {} <{}> ({})", user.id, user.email, role.as_str());
            store.close().await;
        }
        Commands::Seed => {
            let store = open_store(&config).await?;
            let docs = DocumentService::new(store.clone(), EventBus::new());
            let report = seed::seed(&docs).await?;
            println!(
                "seeded {} users and {} documents (password: {})",
                report.users,
                report.documents,
                seed::SAMPLE_PASSWORD
            );
            store.close().await;
        }
    }

    Ok(())
}

async fn open_store(config: &Config) -> Result<Store> {
    let store = Store::connect(&config.database_url, config.db_max_connections)
        .await
        .with_context(|| format!("opening {}", config.database_url))?;
    store.migrate().await?;
    Ok(store)
}

async fn run_server(config: Config) -> Result<()> {
    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind_addr))?;
    let store = open_store(&config).await?;
    let tokens = Arc::new(Hs256Tokens::new(config.jwt_secret(), config.token_ttl()));
    let events = EventBus::new();
    spawn_audit_log(&events);

    let state = AppState::new(store.clone(), tokens, config.reset_token_ttl(), events);
    api::run_server(addr, state).await?;
    store.close().await;
    Ok(())
}

/// Writes every document lifecycle event to the log.
fn spawn_audit_log(events: &EventBus) {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "audit log fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    });
}

fn log_event(event: &Event) {
    match event {
        Event::Created { id, author } => info!(document = id, author, "document created"),
        Event::Updated { id, by, version } => {
            info!(document = id, by, version = ?version, "document updated")
        }
        Event::Deleted { id, by } => info!(document = id, by, "document deleted"),
        Event::Shared { id, user, permission } => {
            info!(document = id, user, permission = %permission, "document shared")
        }
        Event::Unshared { id, user } => info!(document = id, user, "document unshared"),
    }
}
