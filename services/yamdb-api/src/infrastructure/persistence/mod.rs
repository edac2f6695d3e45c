//! 持久化
//!
//! PostgreSQL 与进程内两套仓储实现，由配置的存储后端选择

pub mod memory;
pub mod migrations;
pub mod postgres_comment_repository;
pub mod postgres_review_repository;
pub mod postgres_slug_repository;
pub mod postgres_title_repository;
pub mod postgres_user_repository;

pub use memory::MemoryStore;
pub use migrations::migrations;
pub use postgres_comment_repository::PostgresCommentRepository;
pub use postgres_review_repository::PostgresReviewRepository;
pub use postgres_slug_repository::PostgresSlugRepository;
pub use postgres_title_repository::PostgresTitleRepository;
pub use postgres_user_repository::PostgresUserRepository;

use std::sync::Arc;

use sqlx::PgPool;

use crate::domain::{
    Category, CommentRepository, Genre, ReviewRepository, SlugRepository, TitleRepository,
    UserRepository,
};

/// 全部仓储
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn SlugRepository<Category>>,
    pub genres: Arc<dyn SlugRepository<Genre>>,
    pub titles: Arc<dyn TitleRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub comments: Arc<dyn CommentRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            categories: Arc::new(PostgresSlugRepository::<Category>::new(pool.clone())),
            genres: Arc::new(PostgresSlugRepository::<Genre>::new(pool.clone())),
            titles: Arc::new(PostgresTitleRepository::new(pool.clone())),
            reviews: Arc::new(PostgresReviewRepository::new(pool.clone())),
            comments: Arc::new(PostgresCommentRepository::new(pool)),
        }
    }

    pub fn memory(store: MemoryStore) -> Self {
        Self {
            users: Arc::new(store.clone()),
            categories: Arc::new(store.clone()),
            genres: Arc::new(store.clone()),
            titles: Arc::new(store.clone()),
            reviews: Arc::new(store.clone()),
            comments: Arc::new(store),
        }
    }
}

/// 转义 LIKE 模式中的通配符
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
