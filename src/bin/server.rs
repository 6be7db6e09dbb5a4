use bazar_monitor::alerting::evaluation_service::EvaluationService;
use bazar_monitor::db::schema::ensure_schema;
use bazar_monitor::monitoring::pipeline::MonitoringPipeline;
use bazar_monitor::monitoring::prober::HttpProber;
use bazar_monitor::notifications::bot::BotCommandHandler;
use bazar_monitor::notifications::senders::TelegramApi;
use bazar_monitor::notifications::senders::telegram::TelegramSender;
use bazar_monitor::notifications::service::NotificationService;
use bazar_monitor::server::config::ServerConfig;
use bazar_monitor::server::scheduler::MonitoringScheduler;
use bazar_monitor::web::{AppState, create_axum_router};

use clap::Parser;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

fn init_logging(log_dir: &str) {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "bazar-monitor.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    // Log to stdout: human-readable format
    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sea_orm=warn,sqlx::query=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

/// SQLite refuses to create a database file whose directory does not exist.
fn ensure_sqlite_dir(database_url: &str) -> std::io::Result<()> {
    let Some(rest) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let file = rest.split('?').next().unwrap_or_default();
    if file.is_empty() || file.starts_with(":memory:") {
        return Ok(());
    }
    match Path::new(file).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir),
        _ => Ok(()),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal.");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received.");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    // --- Server Config Setup ---
    let config = ServerConfig::load(args.config.as_deref())?;

    init_logging(&config.log_dir);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting bazar monitor.");

    // --- Database Setup ---
    ensure_sqlite_dir(&config.database_url)?;
    let mut opt = ConnectOptions::new(config.database_url.clone());
    opt.max_connections(10).sqlx_logging(false);
    let db: DatabaseConnection = match Database::connect(opt).await {
        Ok(db) => db,
        Err(e) => {
            error!(error = %e, "Failed to connect to the database.");
            return Err(e.into());
        }
    };
    ensure_schema(&db).await?;
    info!("Database schema is ready.");

    // --- Notification Setup ---
    let telegram: Option<Arc<dyn TelegramApi>> = match config.telegram_bot_token.as_deref() {
        Some(token) => {
            let sender = TelegramSender::new(
                &config.telegram_api_url,
                token,
                Duration::from_secs(config.telegram_timeout_seconds),
            )?;
            Some(Arc::new(sender))
        }
        None => {
            warn!("TELEGRAM_BOT_TOKEN is not set; notifications are disabled.");
            None
        }
    };
    let notification_service = Arc::new(NotificationService::new(db.clone(), telegram.clone()));
    let bot = telegram.map(|api| Arc::new(BotCommandHandler::new(db.clone(), api)));

    // --- Monitoring Pipeline Setup ---
    let prober = Arc::new(HttpProber::new(
        Duration::from_millis(config.liveness_timeout_ms),
        Duration::from_millis(config.statistics_timeout_ms),
    )?);
    let evaluation_service = Arc::new(EvaluationService::new(
        db.clone(),
        notification_service.clone(),
    ));
    let pipeline = Arc::new(MonitoringPipeline::new(
        db.clone(),
        prober,
        evaluation_service,
        config.sweep_concurrency,
    ));

    // --- Background Scheduler ---
    let scheduler_handle = MonitoringScheduler::new(
        pipeline.clone(),
        Duration::from_secs(config.sweep_interval_seconds),
    )
    .start();

    // --- HTTP Server ---
    let app_state = Arc::new(AppState {
        db,
        pipeline,
        notification_service,
        bot,
    });
    let app = create_axum_router(app_state);

    let listener = TcpListener::bind(&config.bind_address).await?;
    info!(address = %config.bind_address, "HTTP server listening.");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler_handle.abort();
    info!("Bazar monitor stopped.");
    Ok(())
}
