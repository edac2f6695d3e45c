//! 基础设施资源管理
//!
//! 按配置创建数据库连接池、Token 服务与邮件发送器

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::{info, warn};
use yamdb_adapter_email::build_sender;
use yamdb_adapter_postgres::{Migration, MigrationManager, PostgresConfig, create_pool};
use yamdb_auth_core::TokenService;
use yamdb_common::{RetryConfig, with_retry};
use yamdb_config::{AppConfig, StorageBackend};
use yamdb_errors::{AppError, AppResult};
use yamdb_ports::EmailSender;
use yamdb_telemetry::init_metrics;

/// 基础设施资源容器
#[derive(Clone)]
pub struct Infrastructure {
    config: AppConfig,
    /// 仅在 storage = "postgres" 时存在
    postgres_pool: Option<PgPool>,
    token_service: Arc<TokenService>,
    email_sender: Arc<dyn EmailSender>,
    metrics: Option<PrometheusHandle>,
}

impl Infrastructure {
    /// 从配置创建基础设施资源（带重试），并执行待处理的迁移
    pub async fn from_config(config: AppConfig, migrations: &[Migration]) -> AppResult<Self> {
        let postgres_pool = match (config.storage, &config.database) {
            (StorageBackend::Postgres, Some(database)) => {
                let pg_config = PostgresConfig::from(database);
                let pool = with_retry(&RetryConfig::default(), "PostgreSQL connection", || {
                    let cfg = pg_config.clone();
                    async move { create_pool(&cfg).await }
                })
                .await?;
                info!(
                    max_connections = database.max_connections,
                    "PostgreSQL connection pool created"
                );

                let result = MigrationManager::new(pool.clone()).migrate(migrations).await?;
                info!(applied = result.applied_count(), "Database migrations finished");

                Some(pool)
            }
            (StorageBackend::Postgres, None) => {
                return Err(AppError::internal("Postgres storage selected without [database]"));
            }
            (StorageBackend::Memory, _) => {
                warn!("Using in-memory storage, data is lost on restart");
                None
            }
        };

        let token_service = Arc::new(TokenService::new(
            config.jwt.secret.expose_secret(),
            config.jwt.expires_in,
            config.jwt.issuer.clone(),
            config.jwt.audience.clone(),
        ));

        let email_sender = build_sender(&config.email)?;
        info!(transport = ?config.email.transport, "Email sender created");

        let metrics = if config.telemetry.metrics_enabled {
            match init_metrics() {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!(error = %e, "Metrics disabled");
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            config,
            postgres_pool,
            token_service,
            email_sender,
            metrics,
        })
    }

    /// 获取应用配置
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 获取 PostgreSQL 连接池
    pub fn postgres_pool(&self) -> Option<PgPool> {
        self.postgres_pool.clone()
    }

    /// 获取 Token 服务
    pub fn token_service(&self) -> Arc<TokenService> {
        self.token_service.clone()
    }

    /// 获取邮件发送器
    pub fn email_sender(&self) -> Arc<dyn EmailSender> {
        self.email_sender.clone()
    }

    /// 获取 Prometheus 句柄（未启用时为 None）
    pub fn metrics(&self) -> Option<PrometheusHandle> {
        self.metrics.clone()
    }
}
