//! 服务启动器
//!
//! 提供统一的 HTTP 服务启动模式

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use yamdb_adapter_postgres::Migration;
use yamdb_config::AppConfig;
use yamdb_errors::AppResult;

use crate::health::{HealthChecker, health_routes};
use crate::infrastructure::Infrastructure;
use crate::runtime::{init_runtime, shutdown_signal};

/// 运行 HTTP 服务
///
/// 1. 加载配置并初始化日志
/// 2. 创建基础设施资源并执行迁移
/// 3. 调用 `app_builder` 构建业务路由
/// 4. 挂载健康检查、trace 与 CORS 中间件
/// 5. 启动服务器并处理 graceful shutdown
///
/// ```ignore
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     yamdb_bootstrap::run("config", &migrations(), |infra| async move {
///         Ok(build_router(infra))
///     })
///     .await
/// }
/// ```
pub async fn run<F, Fut>(
    config_dir: &str,
    migrations: &[Migration],
    app_builder: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(Infrastructure) -> Fut,
    Fut: Future<Output = AppResult<Router>>,
{
    let config = AppConfig::load(config_dir)?;
    init_runtime(&config);

    info!("Starting {} service", config.app_name);

    let infra = Infrastructure::from_config(config.clone(), migrations).await?;
    let health = health_routes(HealthChecker::new(infra.postgres_pool()), infra.metrics());

    let app = app_builder(infra)
        .await?
        .merge(health)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!(%addr, "HTTP server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Service stopped");
    Ok(())
}
