//! HTTP 接口

pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod pagination;
pub mod router;
pub mod state;

pub use middleware::CurrentActor;
pub use pagination::ListResponse;
pub use router::{API_PREFIX, router};
pub use state::AppState;
