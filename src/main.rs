use std::sync::Arc;

use axum::Router;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eventhub_server::config::Config;
use eventhub_server::domain::clock::{Clock, SystemClock};
use eventhub_server::notify::{run_mail_worker, LogNotifier, MailQueue, Notifier, SmtpNotifier};
use eventhub_server::routes::create_routes;
use eventhub_server::services::{EventService, UserService};
use eventhub_server::state::AppState;
use eventhub_server::store::{PgEventStore, PgUserStore};

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eventhub_server=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Invalid configuration");

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Successfully connected to database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    tracing::info!("Migrations run successfully");

    let notifier: Arc<dyn Notifier> = match &config.smtp {
        Some(smtp) => Arc::new(
            SmtpNotifier::new(smtp, &config.mail_sender)
                .expect("Failed to configure SMTP transport"),
        ),
        None => {
            tracing::warn!("SMTP_HOST not set, notifications will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let (mail, receiver) = MailQueue::channel();
    tokio::spawn(run_mail_worker(receiver, notifier));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = AppState::new(
        EventService::new(Arc::new(PgEventStore::new(pool.clone())), clock.clone(), mail),
        UserService::new(Arc::new(PgUserStore::new(pool)), clock),
    );

    let app: Router = create_routes(state);

    let addr = config.socket_addr();
    tracing::info!("🚀 Server running at http://{}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
