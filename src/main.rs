use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use dotenvy::dotenv;
use tokio_util::sync::CancellationToken;
use tracing::info;
use utoipa::OpenApi; // needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use hrm_leave::cache::{CacheStore, MokaCacheStore, RedisCacheStore};
use hrm_leave::config::{CacheBackend, Config, ConfigError, StoreBackend};
use hrm_leave::db::init_db;
use hrm_leave::docs::ApiDoc;
use hrm_leave::routes;
use hrm_leave::service::{
    CacheService, EmployeeManager, EmployeeService, LeaveManager, LeaveService, PrewarmScheduler,
};
use hrm_leave::store::{
    EmployeeStore, InMemoryEmployeeStore, InMemoryLeaveStore, LeaveStore, MySqlEmployeeStore,
    MySqlLeaveStore,
};
use hrm_leave::telemetry;

async fn build_stores(
    config: &Config,
) -> anyhow::Result<(Arc<dyn EmployeeStore>, Arc<dyn LeaveStore>)> {
    let stores: (Arc<dyn EmployeeStore>, Arc<dyn LeaveStore>) = match config.store_backend {
        StoreBackend::Mysql => {
            let url = config
                .database_url
                .as_deref()
                .ok_or(ConfigError::Missing("DATABASE_URL"))?;
            let pool = init_db(url, config.database_max_connections)
                .await
                .context("Failed to connect to database")?;
            (
                Arc::new(MySqlEmployeeStore::new(pool.clone())),
                Arc::new(MySqlLeaveStore::new(pool)),
            )
        }
        StoreBackend::Memory => {
            let leaves = InMemoryLeaveStore::new();
            (
                Arc::new(InMemoryEmployeeStore::cascading_to(&leaves)),
                Arc::new(leaves),
            )
        }
    };
    Ok(stores)
}

async fn build_cache(config: &Config) -> anyhow::Result<Arc<dyn CacheStore>> {
    let store: Arc<dyn CacheStore> = match config.cache_backend {
        CacheBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .ok_or(ConfigError::Missing("REDIS_URL"))?;
            Arc::new(
                RedisCacheStore::connect(url)
                    .await
                    .context("Failed to connect to redis")?,
            )
        }
        CacheBackend::Memory => Arc::new(MokaCacheStore::new(config.cache_max_capacity)),
    };
    Ok(store)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;
    let _guard = telemetry::init_tracing(&config.log_dir, config.log_level);

    info!(
        store = %config.store_backend,
        cache = %config.cache_backend,
        "Server starting..."
    );

    let (employee_store, leave_store) = build_stores(&config).await?;
    let cache = Arc::new(CacheService::new(build_cache(&config).await?));

    let employee_service: Arc<dyn EmployeeService> =
        Arc::new(EmployeeManager::new(employee_store.clone(), cache.clone()));
    let leave_service: Arc<dyn LeaveService> = Arc::new(LeaveManager::new(
        leave_store.clone(),
        employee_store.clone(),
        cache.clone(),
    ));

    let shutdown = CancellationToken::new();
    let prewarm = config.prewarm_enabled.then(|| {
        PrewarmScheduler::new(employee_store, leave_store, cache)
            .with_interval(config.prewarm_interval)
            .start(shutdown.clone())
    });

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::from(employee_service.clone()))
            .app_data(Data::from(leave_service.clone()))
            .configure(|cfg| routes::configure(cfg, &config_data))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    shutdown.cancel();
    if let Some(handle) = prewarm {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Prewarm task ended abnormally");
        }
    }

    info!("Server stopped");
    Ok(())
}
