use std::{net::SocketAddr, time::Duration};

use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "ledgerd={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let server = settings.server;
    let db = match parse_database(&server.database).await {
        Ok(db) => db,
        Err(err) => {
            tracing::error!("failed to initialize database: {err}");
            return Err(err);
        }
    };
    let engine = engine::Engine::builder()
        .database(db.clone())
        .id_strategy(server.id_strategy)
        .max_retries(server.max_retries)
        .build()
        .await?;
    let addr: SocketAddr = format!("{}:{}", server.bind, server.port).parse()?;
    let config = server::ServerConfig {
        account_creation: server.account_creation,
        token_ttl: server.token_ttl()?,
        request_timeout: Duration::from_secs(server.request_timeout_secs),
    };

    tasks.spawn(async move {
        let state = server::ServerState::new(engine, config);
        if let Err(err) = server::run(state, addr).await {
            tracing::error!("server failed: {err}");
        }
    });

    tasks.spawn(async move {
        // Sessions are also dropped lazily when presented; this catches the
        // ones nobody presents again.
        let janitor = match engine::Engine::builder().database(db).build().await {
            Ok(engine) => engine,
            Err(err) => {
                tracing::error!("failed to build session janitor: {err}");
                return;
            }
        };
        let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            match janitor.purge_expired_sessions(chrono::Utc::now()).await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "purged expired sessions"),
                Err(err) => tracing::warn!("session purge failed: {err}"),
            }
        }
    });

    // The server stops on ctrl-c; take the janitor down with it.
    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
