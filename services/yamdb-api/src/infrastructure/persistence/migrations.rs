//! 数据库迁移

use yamdb_adapter_postgres::Migration;

/// 评论 (title, author) 唯一约束名
pub const REVIEW_UNIQUE_CONSTRAINT: &str = "reviews_title_author_key";
pub const USERS_USERNAME_CONSTRAINT: &str = "users_username_key";
pub const USERS_EMAIL_CONSTRAINT: &str = "users_email_key";

/// 按版本排序的全部迁移
pub fn migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            1,
            "create_users",
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGSERIAL PRIMARY KEY,
                username VARCHAR(150) NOT NULL,
                email VARCHAR(254) NOT NULL,
                role VARCHAR(16) NOT NULL DEFAULT 'user',
                bio TEXT NOT NULL DEFAULT '',
                first_name VARCHAR(150) NOT NULL DEFAULT '',
                last_name VARCHAR(150) NOT NULL DEFAULT '',
                is_superuser BOOLEAN NOT NULL DEFAULT FALSE,
                confirmation_code VARCHAR(6),
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                CONSTRAINT users_username_key UNIQUE (username),
                CONSTRAINT users_email_key UNIQUE (email),
                CONSTRAINT users_role_check CHECK (role IN ('user', 'moderator', 'admin'))
            );
            "#,
        ),
        Migration::new(
            2,
            "create_catalog",
            r#"
            CREATE TABLE IF NOT EXISTS categories (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR(256) NOT NULL UNIQUE,
                slug VARCHAR(50) NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS genres (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR(256) NOT NULL UNIQUE,
                slug VARCHAR(50) NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS titles (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR(256) NOT NULL,
                year INTEGER NOT NULL,
                description TEXT,
                category_id BIGINT REFERENCES categories(id) ON DELETE SET NULL
            );

            CREATE INDEX IF NOT EXISTS idx_titles_category ON titles(category_id);
            CREATE INDEX IF NOT EXISTS idx_titles_year ON titles(year);

            CREATE TABLE IF NOT EXISTS title_genres (
                title_id BIGINT NOT NULL REFERENCES titles(id) ON DELETE CASCADE,
                genre_id BIGINT NOT NULL REFERENCES genres(id) ON DELETE CASCADE,
                PRIMARY KEY (title_id, genre_id)
            );

            CREATE INDEX IF NOT EXISTS idx_title_genres_genre ON title_genres(genre_id);
            "#,
        ),
        Migration::new(
            3,
            "create_reviews",
            r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id BIGSERIAL PRIMARY KEY,
                title_id BIGINT NOT NULL REFERENCES titles(id) ON DELETE CASCADE,
                author_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                text TEXT NOT NULL,
                score SMALLINT NOT NULL CHECK (score BETWEEN 1 AND 10),
                pub_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                CONSTRAINT reviews_title_author_key UNIQUE (title_id, author_id)
            );

            CREATE TABLE IF NOT EXISTS comments (
                id BIGSERIAL PRIMARY KEY,
                review_id BIGINT NOT NULL REFERENCES reviews(id) ON DELETE CASCADE,
                author_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                text TEXT NOT NULL,
                pub_date TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );

            CREATE INDEX IF NOT EXISTS idx_comments_review ON comments(review_id);
            "#,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_are_ordered_and_unique() {
        let versions: Vec<i64> = migrations().iter().map(|m| m.version).collect();
        let mut sorted = versions.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(versions, sorted);
    }

    #[test]
    fn test_review_uniqueness_is_declared() {
        let all: String = migrations().iter().map(|m| m.up_sql.clone()).collect();
        assert!(all.contains(REVIEW_UNIQUE_CONSTRAINT));
        assert!(all.contains(USERS_USERNAME_CONSTRAINT));
        assert!(all.contains(USERS_EMAIL_CONSTRAINT));
    }
}
