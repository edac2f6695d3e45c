//! PostgreSQL 回复 Repository 实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use yamdb_adapter_postgres::map_sqlx_error;
use yamdb_common::{CommentId, Page, PageRequest, ReviewId, UserId};
use yamdb_errors::{AppError, AppResult};

use crate::domain::{Comment, CommentRepository, NewComment};

pub struct PostgresCommentRepository {
    pool: PgPool,
}

impl PostgresCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create(&self, comment: &NewComment) -> AppResult<Comment> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (review_id, author_id, text)
                VALUES ($1, $2, $3)
                RETURNING id, review_id, author_id, text, pub_date
            )
            SELECT i.id, i.review_id, i.author_id, u.username AS author, i.text, i.pub_date
            FROM inserted i
            JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(comment.review_id.0)
        .bind(comment.author_id.0)
        .bind(&comment.text)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find(&self, review_id: ReviewId, id: CommentId) -> AppResult<Option<Comment>> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT c.id, c.review_id, c.author_id, u.username AS author, c.text, c.pub_date
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.id = $1 AND c.review_id = $2
            "#,
        )
        .bind(id.0)
        .bind(review_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Comment::from))
    }

    async fn update(&self, id: CommentId, text: &str) -> AppResult<Comment> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            WITH updated AS (
                UPDATE comments SET text = $2 WHERE id = $1
                RETURNING id, review_id, author_id, text, pub_date
            )
            SELECT i.id, i.review_id, i.author_id, u.username AS author, i.text, i.pub_date
            FROM updated i
            JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(id.0)
        .bind(text)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .ok_or_else(|| AppError::not_found("Comment not found"))?;

        Ok(row.into())
    }

    async fn delete(&self, id: CommentId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_review(
        &self,
        review_id: ReviewId,
        page: PageRequest,
    ) -> AppResult<Page<Comment>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE review_id = $1")
            .bind(review_id.0)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT c.id, c.review_id, c.author_id, u.username AS author, c.text, c.pub_date
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.review_id = $1
            ORDER BY c.id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(review_id.0)
        .bind(i64::from(page.limit))
        .bind(i64::from(page.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let comments = rows.into_iter().map(Comment::from).collect();
        Ok(Page::new(comments, total.max(0) as u64, page))
    }
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    review_id: i64,
    author_id: i64,
    author: String,
    text: String,
    pub_date: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: CommentId(row.id),
            review_id: ReviewId(row.review_id),
            author_id: UserId(row.author_id),
            author: row.author,
            text: row.text,
            pub_date: row.pub_date,
        }
    }
}
