//! PostgreSQL 用户 Repository 实现

use async_trait::async_trait;
use sqlx::PgPool;
use yamdb_adapter_postgres::{is_unique_violation, map_sqlx_error};
use yamdb_common::{Page, PageRequest, UserId};
use yamdb_errors::{AppError, AppResult};

use super::escape_like;
use super::migrations::{USERS_EMAIL_CONSTRAINT, USERS_USERNAME_CONSTRAINT};
use crate::domain::{NewUser, Role, User, UserRepository};

const USER_COLUMNS: &str = "id, username, email, role, bio, first_name, last_name, is_superuser, confirmation_code";

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, column);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(UserRow::into_user).transpose()
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: &NewUser) -> AppResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users (username, email, role, bio, first_name, last_name, is_superuser)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.username)
            .bind(&user.email)
            .bind(user.role.as_str())
            .bind(&user.bio)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(user.is_superuser)
            .fetch_one(&self.pool)
            .await
            .map_err(map_user_error)?;

        row.into_user()
    }

    async fn update(&self, user: &User) -> AppResult<User> {
        let sql = format!(
            r#"
            UPDATE users
            SET username = $2, email = $3, role = $4, bio = $5,
                first_name = $6, last_name = $7, is_superuser = $8
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.id.0)
            .bind(&user.username)
            .bind(&user.email)
            .bind(user.role.as_str())
            .bind(&user.bio)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(user.is_superuser)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        row.into_user()
    }

    async fn delete(&self, id: UserId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(UserRow::into_user).transpose()
    }

    // 用户名匹配区分大小写

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.find_one("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.find_one("email", email).await
    }

    async fn set_confirmation_code(&self, id: UserId, code: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET confirmation_code = $2 WHERE id = $1")
            .bind(id.0)
            .bind(code)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User not found"));
        }
        Ok(())
    }

    async fn list(&self, search: Option<&str>, page: PageRequest) -> AppResult<Page<User>> {
        let pattern = search.map(|s| format!("%{}%", escape_like(s)));

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE ($1::TEXT IS NULL OR username ILIKE $1)",
        )
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let sql = format!(
            r#"
            SELECT {} FROM users
            WHERE ($1::TEXT IS NULL OR username ILIKE $1)
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#,
            USER_COLUMNS
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(pattern.as_deref())
            .bind(i64::from(page.limit))
            .bind(i64::from(page.offset))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let users = rows
            .into_iter()
            .map(UserRow::into_user)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Page::new(users, total.max(0) as u64, page))
    }
}

/// 用户名 / 邮箱冲突按输入错误处理
fn map_user_error(e: sqlx::Error) -> AppError {
    if is_unique_violation(&e, USERS_USERNAME_CONSTRAINT) {
        return AppError::validation("username: A user with that username already exists");
    }
    if is_unique_violation(&e, USERS_EMAIL_CONSTRAINT) {
        return AppError::validation("email: A user with that email already exists");
    }
    map_sqlx_error(e)
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    role: String,
    bio: String,
    first_name: String,
    last_name: String,
    is_superuser: bool,
    confirmation_code: Option<String>,
}

impl UserRow {
    fn into_user(self) -> AppResult<User> {
        let role: Role = self.role.parse().map_err(|_| {
            AppError::database(format!("Invalid role '{}' for user {}", self.role, self.id))
        })?;

        Ok(User {
            id: UserId(self.id),
            username: self.username,
            email: self.email,
            role,
            bio: self.bio,
            first_name: self.first_name,
            last_name: self.last_name,
            is_superuser: self.is_superuser,
            confirmation_code: self.confirmation_code,
        })
    }
}
