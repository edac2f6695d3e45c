//! 应用层
//!
//! 用例编排：鉴权 → 校验 → 领域规则 → 仓储

pub mod account_service;
pub mod catalog_service;
pub mod dto;
pub mod review_service;
pub mod validation;

pub use account_service::AccountService;
pub use catalog_service::CatalogService;
pub use dto::*;
pub use review_service::ReviewService;

use metrics::counter;
use tracing::debug;
use yamdb_common::UserId;
use yamdb_errors::AppResult;
use yamdb_telemetry::names;

use crate::domain::{AccessPolicy, Action, Actor, Decision, ResourceKind};

/// 按访问策略检查一次操作，拒绝时记录指标
pub fn authorize(
    actor: &Actor,
    action: Action,
    kind: ResourceKind,
    owner: Option<UserId>,
) -> AppResult<()> {
    record(AccessPolicy::check(actor, action, kind, owner), action, kind)
}

/// 取对象前的集合级预检，之后仍需带上作者调用 [`authorize`]
pub fn authorize_collection(
    actor: &Actor,
    action: Action,
    kind: ResourceKind,
) -> AppResult<()> {
    record(AccessPolicy::check_collection(actor, action, kind), action, kind)
}

fn record(decision: Decision, action: Action, kind: ResourceKind) -> AppResult<()> {
    if let Decision::Deny(reason) = decision {
        counter!(
            names::ACCESS_DENIED_TOTAL,
            "resource" => kind.to_string(),
            "reason" => reason.to_string()
        )
        .increment(1);
        debug!(%action, resource = %kind, %reason, "Access denied");
    }

    decision.into_result()
}
