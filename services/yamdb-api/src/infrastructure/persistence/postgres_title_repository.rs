//! PostgreSQL 作品 Repository 实现

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use yamdb_adapter_postgres::map_sqlx_error;
use yamdb_common::{CategoryId, GenreId, Page, PageRequest, TitleId};
use yamdb_errors::AppResult;

use super::escape_like;
use crate::domain::{
    Category, Genre, NewTitle, RatingAggregator, Title, TitleChanges, TitleFilter,
    TitleRepository,
};

/// 作品、分类与评分汇总；评分由评论实时聚合
const TITLE_SELECT: &str = r#"
    SELECT t.id, t.name, t.year, t.description,
           c.id AS category_id, c.name AS category_name, c.slug AS category_slug,
           COALESCE(r.score_sum, 0) AS score_sum,
           COALESCE(r.score_count, 0) AS score_count
    FROM titles t
    LEFT JOIN categories c ON c.id = t.category_id
    LEFT JOIN (
        SELECT title_id, SUM(score)::BIGINT AS score_sum, COUNT(*) AS score_count
        FROM reviews
        GROUP BY title_id
    ) r ON r.title_id = t.id
    WHERE TRUE"#;

const TITLE_COUNT: &str = r#"
    SELECT COUNT(*)
    FROM titles t
    LEFT JOIN categories c ON c.id = t.category_id
    WHERE TRUE"#;

pub struct PostgresTitleRepository {
    pool: PgPool,
}

impl PostgresTitleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 批量加载作品的体裁
    async fn load_genres(&self, title_ids: &[i64]) -> AppResult<HashMap<i64, Vec<Genre>>> {
        if title_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, TitleGenreRow>(
            r#"
            SELECT tg.title_id, g.id, g.name, g.slug
            FROM title_genres tg
            JOIN genres g ON g.id = tg.genre_id
            WHERE tg.title_id = ANY($1)
            ORDER BY g.id
            "#,
        )
        .bind(title_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let mut genres: HashMap<i64, Vec<Genre>> = HashMap::new();
        for row in rows {
            genres.entry(row.title_id).or_default().push(Genre {
                id: GenreId(row.id),
                name: row.name,
                slug: row.slug,
            });
        }
        Ok(genres)
    }

    async fn assemble(&self, rows: Vec<TitleRow>) -> AppResult<Vec<Title>> {
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let mut genres = self.load_genres(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let genres = genres.remove(&row.id).unwrap_or_default();
                row.into_title(genres)
            })
            .collect())
    }
}

#[async_trait]
impl TitleRepository for PostgresTitleRepository {
    async fn create(&self, title: &NewTitle) -> AppResult<TitleId> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO titles (name, year, description, category_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&title.name)
        .bind(title.year)
        .bind(title.description.as_deref())
        .bind(title.category_id.map(|c| c.0))
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let genre_ids: Vec<i64> = title.genre_ids.iter().map(|g| g.0).collect();
        sqlx::query(
            r#"
            INSERT INTO title_genres (title_id, genre_id)
            SELECT $1, UNNEST($2::BIGINT[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(id)
        .bind(&genre_ids)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(TitleId(id))
    }

    async fn update(&self, id: TitleId, changes: &TitleChanges) -> AppResult<bool> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let result = sqlx::query(
            r#"
            UPDATE titles
            SET name = COALESCE($2, name),
                year = COALESCE($3, year),
                description = COALESCE($4, description),
                category_id = COALESCE($5, category_id)
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(changes.name.as_deref())
        .bind(changes.year)
        .bind(changes.description.as_deref())
        .bind(changes.category_id.map(|c| c.0))
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        if let Some(genre_ids) = &changes.genre_ids {
            let genre_ids: Vec<i64> = genre_ids.iter().map(|g| g.0).collect();

            sqlx::query("DELETE FROM title_genres WHERE title_id = $1")
                .bind(id.0)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;

            sqlx::query(
                r#"
                INSERT INTO title_genres (title_id, genre_id)
                SELECT $1, UNNEST($2::BIGINT[])
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(id.0)
            .bind(&genre_ids)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(true)
    }

    async fn delete(&self, id: TitleId) -> AppResult<bool> {
        // 评论与回复由外键级联删除
        let result = sqlx::query("DELETE FROM titles WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, id: TitleId) -> AppResult<Option<Title>> {
        let mut builder = QueryBuilder::<Postgres>::new(TITLE_SELECT);
        builder.push(" AND t.id = ").push_bind(id.0);

        let row = builder
            .build_query_as::<TitleRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => Ok(self.assemble(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn exists(&self, id: TitleId) -> AppResult<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM titles WHERE id = $1)")
            .bind(id.0)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn list(&self, filter: &TitleFilter, page: PageRequest) -> AppResult<Page<Title>> {
        let mut count_builder = QueryBuilder::<Postgres>::new(TITLE_COUNT);
        push_filters(&mut count_builder, filter);

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let mut builder = QueryBuilder::<Postgres>::new(TITLE_SELECT);
        push_filters(&mut builder, filter);
        builder
            .push(" ORDER BY t.id LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(i64::from(page.offset));

        let rows = builder
            .build_query_as::<TitleRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let titles = self.assemble(rows).await?;
        Ok(Page::new(titles, total.max(0) as u64, page))
    }
}

/// 追加过滤条件，所有条件取交集
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &TitleFilter) {
    if let Some(category) = &filter.category {
        builder.push(" AND c.slug = ").push_bind(category.clone());
    }

    if let Some(genre) = &filter.genre {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM title_genres tg JOIN genres g ON g.id = tg.genre_id \
                 WHERE tg.title_id = t.id AND g.slug = ",
            )
            .push_bind(genre.clone())
            .push(")");
    }

    if let Some(year) = filter.year {
        builder.push(" AND t.year = ").push_bind(year);
    }

    if let Some(name) = &filter.name {
        builder
            .push(" AND t.name ILIKE ")
            .push_bind(format!("%{}%", escape_like(name)));
    }
}

#[derive(sqlx::FromRow)]
struct TitleRow {
    id: i64,
    name: String,
    year: i32,
    description: Option<String>,
    category_id: Option<i64>,
    category_name: Option<String>,
    category_slug: Option<String>,
    score_sum: i64,
    score_count: i64,
}

impl TitleRow {
    fn into_title(self, genres: Vec<Genre>) -> Title {
        let category = match (self.category_id, self.category_name, self.category_slug) {
            (Some(id), Some(name), Some(slug)) => Some(Category {
                id: CategoryId(id),
                name,
                slug,
            }),
            _ => None,
        };

        Title {
            id: TitleId(self.id),
            name: self.name,
            year: self.year,
            description: self.description,
            category,
            genres,
            rating: RatingAggregator::from_totals(self.score_sum, self.score_count),
        }
    }
}

#[derive(sqlx::FromRow)]
struct TitleGenreRow {
    title_id: i64,
    id: i64,
    name: String,
    slug: String,
}
