use std::sync::Arc;
use std::time::Duration;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use inoutly::broadcast::Broadcaster;
use inoutly::config::Config;
use inoutly::db::init_db;
use inoutly::docs::ApiDoc;
use inoutly::routes;
use inoutly::scan::{ScanDebouncer, ScanReconciler};
use inoutly::store::{MySqlSessionStore, SessionStore};

#[get("/")]
async fn index() -> impl Responder {
    "Inoutly attendance system"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let store_timeout = Duration::from_secs(config.store_timeout_secs);
    let pool = init_db(&config.database_url, store_timeout).await;

    let store: Arc<dyn SessionStore> =
        Arc::new(MySqlSessionStore::new(pool.clone(), store_timeout));
    let broadcaster = Broadcaster::default();

    let policy = config.scan_policy();
    let debouncer = ScanDebouncer::new(policy.debounce_window_secs, policy.debounce_ttl_secs);
    let reconciler = Data::new(ScanReconciler::new(
        store.clone(),
        debouncer,
        broadcaster.clone(),
        policy,
    ));

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::from(store.clone()))
            .app_data(reconciler.clone())
            .app_data(Data::new(broadcaster.clone()))
            .app_data(Data::new(config.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
