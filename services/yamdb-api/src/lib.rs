//! yamdb-api - 影视作品评论服务
//!
//! - `domain`: 实体、访问策略、评分聚合与仓储接口
//! - `application`: 用例服务、读写数据形状与输入校验
//! - `infrastructure`: PostgreSQL / 内存仓储与数据库迁移
//! - `api`: axum 路由、认证中间件与处理器

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;

use std::sync::Arc;

use axum::Router;
use tracing::info;
use yamdb_adapter_email::EmailTemplate;
use yamdb_bootstrap::Infrastructure;
use yamdb_errors::AppResult;

use crate::api::http::{AppState, router};
use crate::infrastructure::{MemoryStore, Repositories};

/// 由基础设施构建业务路由
///
/// 有连接池时使用 PostgreSQL，否则使用进程内存储；
/// 配置了 `[superuser]` 时确保该账号存在
pub async fn build_app(infra: Infrastructure) -> AppResult<Router> {
    let repositories = match infra.postgres_pool() {
        Some(pool) => Repositories::postgres(pool),
        None => {
            info!("Using in-memory repositories");
            Repositories::memory(MemoryStore::new())
        }
    };

    let state = AppState::new(
        repositories,
        infra.token_service(),
        infra.email_sender(),
        Arc::new(EmailTemplate::builtin()?),
        infra.config().pagination.limits(),
    );

    if let Some(superuser) = &infra.config().superuser {
        state
            .accounts
            .ensure_superuser(&superuser.username, &superuser.email)
            .await?;
    }

    Ok(router(state))
}
