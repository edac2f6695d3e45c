//! yamdb-bootstrap - 统一服务启动骨架
//!
//! 配置加载、基础设施初始化、健康检查与 HTTP 服务启动

mod health;
mod infrastructure;
mod runtime;
mod starter;

pub use health::*;
pub use infrastructure::*;
pub use runtime::*;
pub use starter::*;
