// src/main.rs

use std::sync::Arc;
use std::time::Duration;

use quiz_arena::config::Config;
use quiz_arena::models::user::{NewAccount, Role};
use quiz_arena::repository::{MemoryRepository, PgRepository, QuizRepository};
use quiz_arena::routes;
use quiz_arena::state::{AppState, Repo};
use quiz_arena::utils::hash::hash_password;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const CONNECT_RETRIES: u32 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from environment (.env included)
    let config = Config::from_env()?;

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let repo: Repo = match &config.database_url {
        Some(url) => {
            let pool = connect_with_retry(url).await?;
            tracing::info!("Database connected...");

            let pg = PgRepository::new(pool);
            tracing::info!("Running migrations...");
            pg.migrate().await?;
            tracing::info!("Migrations applied successfully.");
            Arc::new(pg)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using the in-memory store (data is lost on exit)");
            Arc::new(MemoryRepository::new())
        }
    };

    // Seed Admin User
    if let Err(e) = seed_admin_user(repo.as_ref(), &config).await {
        tracing::error!("Failed to seed admin user: {:?}", e);
    }

    let addr = config.bind_addr;
    let state = AppState::new(repo, config);

    // Create the Axum application router
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    // Start the server
    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize Database Pool with Retry
async fn connect_with_retry(url: &str) -> Result<PgPool, sqlx::Error> {
    let mut retry_count = 0;
    loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(url)
            .await
        {
            Ok(pool) => return Ok(pool),
            Err(e) => {
                retry_count += 1;
                if retry_count > CONNECT_RETRIES {
                    tracing::error!(
                        "Failed to connect to database after {} retries",
                        CONNECT_RETRIES
                    );
                    return Err(e);
                }
                tracing::warn!(
                    "Database not ready, retrying in 2s... (Attempt {})",
                    retry_count
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}

async fn seed_admin_user(
    repo: &dyn QuizRepository,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    if let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) {
        if repo.find_user_by_username(username).await?.is_none() {
            tracing::info!("Seeding admin user: {}", username);
            let hashed_password = hash_password(password)?;

            repo.create_account(NewAccount {
                username: username.clone(),
                email: config.admin_email.clone().unwrap_or_default(),
                password_hash: hashed_password,
                role: Role::Admin,
            })
            .await?;
            tracing::info!("Admin user created successfully.");
        }
    }
    Ok(())
}
