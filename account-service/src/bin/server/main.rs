use std::sync::Arc;

use account_service::account::ports::AccountServicePort;
use account_service::account::ports::UserStore;
use account_service::account::service::AccountService;
use account_service::account::service::LinkSettings;
use account_service::config::Config;
use account_service::config::StoreKind;
use account_service::inbound::http::router::create_router;
use account_service::outbound::email::SendGridEmailSender;
use account_service::outbound::events::spawn_email_verification_worker;
use account_service::outbound::events::ChannelEventPublisher;
use account_service::outbound::identity::RsaTokenIssuer;
use account_service::stores::InMemoryUserStore;
use account_service::stores::PostgresUserStore;
use problem::ProblemTranslator;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn build_service<US: UserStore>(
    store: Arc<US>,
    email_sender: Arc<SendGridEmailSender>,
    token_issuer: Arc<RsaTokenIssuer>,
    event_publisher: Arc<ChannelEventPublisher>,
    links: LinkSettings,
) -> Arc<dyn AccountServicePort> {
    Arc::new(AccountService::new(
        store,
        email_sender,
        token_issuer,
        event_publisher,
        links,
    ))
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "account_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "account-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        base_url = %config.urls.base_url,
        store = ?config.store.kind,
        queue_capacity = config.events.queue_capacity,
        "Configuration loaded"
    );

    let email_sender = Arc::new(SendGridEmailSender::new(&config.email)?);
    let token_issuer = Arc::new(RsaTokenIssuer::new(config.jwt.issuer_settings()));
    let (event_publisher, event_receiver) =
        ChannelEventPublisher::channel(config.events.queue_capacity);
    let event_publisher = Arc::new(event_publisher);
    let links = config.urls.link_settings();

    let service = match config.store.kind {
        StoreKind::Postgres => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(&config.database.url)
                .await?;
            tracing::info!(
                max_connections = config.database.max_connections,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            build_service(
                Arc::new(PostgresUserStore::new(pg_pool)),
                email_sender,
                token_issuer,
                event_publisher,
                links,
            )
        }
        StoreKind::Memory => {
            tracing::warn!("Using in-memory user store; accounts are lost on restart");
            build_service(
                Arc::new(InMemoryUserStore::new()),
                email_sender,
                token_issuer,
                event_publisher,
                links,
            )
        }
    };

    let worker = spawn_email_verification_worker(event_receiver, Arc::clone(&service));

    let translator =
        ProblemTranslator::new(&config.urls.base_url).with_error_path(&config.urls.base_error_url);

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(service, translator);
    match axum::serve(http_listener, http_application).await {
        Ok(()) => tracing::info!("Server exited successfully"),
        Err(e) => tracing::error!(error = %e, "Server error"),
    }

    worker.abort();
    Ok(())
}
