//! PostgreSQL 评论 Repository 实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use yamdb_adapter_postgres::{is_unique_violation, map_sqlx_error};
use yamdb_common::{Page, PageRequest, ReviewId, TitleId, UserId};
use yamdb_errors::{AppError, AppResult};

use super::migrations::REVIEW_UNIQUE_CONSTRAINT;
use crate::domain::{
    NewReview, Review, ReviewChanges, ReviewRepository, Score, duplicate_review,
};

pub struct PostgresReviewRepository {
    pool: PgPool,
}

impl PostgresReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewRepository for PostgresReviewRepository {
    async fn create(&self, review: &NewReview) -> AppResult<Review> {
        // 唯一约束保证并发插入时只有一个成功
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            WITH inserted AS (
                INSERT INTO reviews (title_id, author_id, text, score)
                VALUES ($1, $2, $3, $4)
                RETURNING id, title_id, author_id, text, score, pub_date
            )
            SELECT i.id, i.title_id, i.author_id, u.username AS author, i.text, i.score, i.pub_date
            FROM inserted i
            JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(review.title_id.0)
        .bind(review.author_id.0)
        .bind(&review.text)
        .bind(i16::from(review.score.value()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, REVIEW_UNIQUE_CONSTRAINT) {
                duplicate_review()
            } else {
                map_sqlx_error(e)
            }
        })?;

        row.into_review()
    }

    async fn exists_for(&self, title_id: TitleId, author_id: UserId) -> AppResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reviews WHERE title_id = $1 AND author_id = $2)",
        )
        .bind(title_id.0)
        .bind(author_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn find(&self, title_id: TitleId, id: ReviewId) -> AppResult<Option<Review>> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT r.id, r.title_id, r.author_id, u.username AS author, r.text, r.score, r.pub_date
            FROM reviews r
            JOIN users u ON u.id = r.author_id
            WHERE r.id = $1 AND r.title_id = $2
            "#,
        )
        .bind(id.0)
        .bind(title_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(ReviewRow::into_review).transpose()
    }

    async fn update(&self, id: ReviewId, changes: &ReviewChanges) -> AppResult<Review> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            WITH updated AS (
                UPDATE reviews
                SET text = COALESCE($2, text),
                    score = COALESCE($3, score)
                WHERE id = $1
                RETURNING id, title_id, author_id, text, score, pub_date
            )
            SELECT i.id, i.title_id, i.author_id, u.username AS author, i.text, i.score, i.pub_date
            FROM updated i
            JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(id.0)
        .bind(changes.text.as_deref())
        .bind(changes.score.map(|s| i16::from(s.value())))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .ok_or_else(|| AppError::not_found("Review not found"))?;

        row.into_review()
    }

    async fn delete(&self, id: ReviewId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_title(
        &self,
        title_id: TitleId,
        page: PageRequest,
    ) -> AppResult<Page<Review>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE title_id = $1")
            .bind(title_id.0)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let rows = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT r.id, r.title_id, r.author_id, u.username AS author, r.text, r.score, r.pub_date
            FROM reviews r
            JOIN users u ON u.id = r.author_id
            WHERE r.title_id = $1
            ORDER BY r.id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(title_id.0)
        .bind(i64::from(page.limit))
        .bind(i64::from(page.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let reviews = rows
            .into_iter()
            .map(ReviewRow::into_review)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Page::new(reviews, total.max(0) as u64, page))
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    title_id: i64,
    author_id: i64,
    author: String,
    text: String,
    score: i16,
    pub_date: DateTime<Utc>,
}

impl ReviewRow {
    fn into_review(self) -> AppResult<Review> {
        let score = Score::new(i64::from(self.score))
            .map_err(|e| AppError::database(format!("Invalid score for review {}: {}", self.id, e)))?;

        Ok(Review {
            id: ReviewId(self.id),
            title_id: TitleId(self.title_id),
            author_id: UserId(self.author_id),
            author: self.author,
            text: self.text,
            score,
            pub_date: self.pub_date,
        })
    }
}
