use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;
use tera::Tera;

use crate::config::Config;
use crate::domain::ports::EmailService;
use crate::state::{AppState, Repositories};
use crate::infra::email::http_email_service::HttpEmailService;
use crate::infra::repositories::{
    postgres_booking_repo::PostgresBookingRepo, postgres_chalet_repo::PostgresChaletRepo,
    postgres_discount_repo::PostgresDiscountRepo, postgres_group_repo::PostgresGroupRepo,
    postgres_job_repo::PostgresJobRepo, postgres_review_repo::PostgresReviewRepo,
    sqlite_booking_repo::SqliteBookingRepo, sqlite_chalet_repo::SqliteChaletRepo,
    sqlite_discount_repo::SqliteDiscountRepo, sqlite_group_repo::SqliteGroupRepo,
    sqlite_job_repo::SqliteJobRepo, sqlite_review_repo::SqliteReviewRepo,
};

pub const CONFIRMATION_TEMPLATE: &str = "booking_confirmation.html";
pub const CANCELLATION_TEMPLATE: &str = "booking_cancellation.html";

pub fn load_templates() -> Tera {
    let mut tera = Tera::default();
    tera.add_raw_template(CONFIRMATION_TEMPLATE, include_str!("../templates/booking_confirmation.html"))
        .expect("Failed to load confirmation template");
    tera.add_raw_template(CANCELLATION_TEMPLATE, include_str!("../templates/booking_cancellation.html"))
        .expect("Failed to load cancellation template");
    tera
}

pub async fn bootstrap_state(config: &Config) -> AppState {
    let email_service = Arc::new(HttpEmailService::new(
        config.mail_service_url.clone(),
        config.mail_service_token.clone(),
    ));
    bootstrap_state_with_email(config, email_service).await
}

/// Connects, migrates and wires the state with the given mail transport.
pub async fn bootstrap_state_with_email(config: &Config, email_service: Arc<dyn EmailService>) -> AppState {
    let database_url = &config.database_url;
    let templates = Arc::new(load_templates());

    let repos = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;

        Repositories {
            chalet_repo: Arc::new(PostgresChaletRepo::new(pool.clone())),
            booking_repo: Arc::new(PostgresBookingRepo::new(pool.clone())),
            group_repo: Arc::new(PostgresGroupRepo::new(pool.clone())),
            discount_repo: Arc::new(PostgresDiscountRepo::new(pool.clone())),
            review_repo: Arc::new(PostgresReviewRepo::new(pool.clone())),
            job_repo: Arc::new(PostgresJobRepo::new(pool)),
        }
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true)
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;

        Repositories {
            chalet_repo: Arc::new(SqliteChaletRepo::new(pool.clone())),
            booking_repo: Arc::new(SqliteBookingRepo::new(pool.clone())),
            group_repo: Arc::new(SqliteGroupRepo::new(pool.clone())),
            discount_repo: Arc::new(SqliteDiscountRepo::new(pool.clone())),
            review_repo: Arc::new(SqliteReviewRepo::new(pool.clone())),
            job_repo: Arc::new(SqliteJobRepo::new(pool)),
        }
    };

    AppState::new(config.clone(), repos, email_service, templates)
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
