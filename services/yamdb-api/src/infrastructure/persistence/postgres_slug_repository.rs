//! PostgreSQL 分类 / 体裁 Repository 实现
//!
//! 两张表结构相同，按 `SlugEntity::TABLE` 选择

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::PgPool;
use yamdb_adapter_postgres::{UNIQUE_VIOLATION, map_sqlx_error};
use yamdb_common::{Page, PageRequest};
use yamdb_errors::{AppError, AppResult};

use super::escape_like;
use crate::domain::{SlugEntity, SlugRepository};

pub struct PostgresSlugRepository<T> {
    pool: PgPool,
    _entity: PhantomData<fn() -> T>,
}

impl<T: SlugEntity> PostgresSlugRepository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SlugRow {
    id: i64,
    name: String,
    slug: String,
}

impl SlugRow {
    fn into_entity<T: SlugEntity>(self) -> T {
        T::from_parts(self.id, self.name, self.slug)
    }
}

#[async_trait]
impl<T: SlugEntity> SlugRepository<T> for PostgresSlugRepository<T> {
    async fn create(&self, name: &str, slug: &str) -> AppResult<T> {
        let sql = format!(
            "INSERT INTO {} (name, slug) VALUES ($1, $2) RETURNING id, name, slug",
            T::TABLE
        );

        let row = sqlx::query_as::<_, SlugRow>(&sql)
            .bind(name)
            .bind(slug)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                let duplicate = matches!(
                    &e,
                    sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
                );
                if duplicate {
                    AppError::validation(format!(
                        "{} with this name or slug already exists",
                        T::LABEL
                    ))
                } else {
                    map_sqlx_error(e)
                }
            })?;

        Ok(row.into_entity())
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<T>> {
        let sql = format!("SELECT id, name, slug FROM {} WHERE slug = $1", T::TABLE);

        let row = sqlx::query_as::<_, SlugRow>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(SlugRow::into_entity))
    }

    async fn exists_by_name(&self, name: &str) -> AppResult<bool> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE name = $1)", T::TABLE);

        sqlx::query_scalar(&sql)
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn delete_by_slug(&self, slug: &str) -> AppResult<bool> {
        // 外键负责解除作品上的引用
        let sql = format!("DELETE FROM {} WHERE slug = $1", T::TABLE);

        let result = sqlx::query(&sql)
            .bind(slug)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, search: Option<&str>, page: PageRequest) -> AppResult<Page<T>> {
        let pattern = search.map(|s| format!("%{}%", escape_like(s)));

        let count_sql = format!(
            "SELECT COUNT(*) FROM {} WHERE ($1::TEXT IS NULL OR name ILIKE $1)",
            T::TABLE
        );
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(pattern.as_deref())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let sql = format!(
            r#"
            SELECT id, name, slug FROM {}
            WHERE ($1::TEXT IS NULL OR name ILIKE $1)
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#,
            T::TABLE
        );
        let rows = sqlx::query_as::<_, SlugRow>(&sql)
            .bind(pattern.as_deref())
            .bind(i64::from(page.limit))
            .bind(i64::from(page.offset))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let items = rows.into_iter().map(SlugRow::into_entity).collect();
        Ok(Page::new(items, total.max(0) as u64, page))
    }
}
