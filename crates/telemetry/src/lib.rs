//! yamdb-telemetry - 可观测性库

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// 指标名称
pub mod names {
    pub const ACCESS_DENIED_TOTAL: &str = "yamdb_access_denied_total";
    pub const SIGNUPS_TOTAL: &str = "yamdb_signups_total";
    pub const TOKENS_ISSUED_TOTAL: &str = "yamdb_tokens_issued_total";
    pub const REVIEWS_CREATED_TOTAL: &str = "yamdb_reviews_created_total";
    pub const REVIEW_CONFLICTS_TOTAL: &str = "yamdb_review_conflicts_total";
    pub const COMMENTS_CREATED_TOTAL: &str = "yamdb_comments_created_total";
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to install Prometheus recorder: {0}")]
pub struct MetricsInitError(String);

/// 初始化 tracing
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    // 重复初始化时保留已有 subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// 初始化 JSON 格式的 tracing（生产环境）
pub fn init_tracing_json(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json())
        .try_init();
}

/// 初始化 Prometheus metrics
pub fn init_metrics() -> Result<PrometheusHandle, MetricsInitError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsInitError(e.to_string()))?;

    metrics::describe_counter!(names::ACCESS_DENIED_TOTAL, "Requests rejected by the access policy");
    metrics::describe_counter!(names::SIGNUPS_TOTAL, "Signup requests that issued a confirmation code");
    metrics::describe_counter!(names::TOKENS_ISSUED_TOTAL, "Access tokens issued");
    metrics::describe_counter!(names::REVIEWS_CREATED_TOTAL, "Reviews created");
    metrics::describe_counter!(names::REVIEW_CONFLICTS_TOTAL, "Duplicate review attempts");
    metrics::describe_counter!(names::COMMENTS_CREATED_TOTAL, "Comments created");

    Ok(handle)
}
