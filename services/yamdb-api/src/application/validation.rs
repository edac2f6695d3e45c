//! 输入校验
//!
//! 每个写入形状对应一组按顺序执行的规则；所有规则都会执行，
//! 失败项合并为一个 Validation 错误（`field: message; field: message`）

use chrono::{Datelike, Utc};
use email_address::EmailAddress;
use std::fmt;
use yamdb_errors::{AppError, AppResult};

use super::dto::{
    CommentCreate, CommentPatch, ReviewCreate, ReviewPatch, SignupRequest, SlugCreate, TitleCreate,
    TitlePatch, TokenRequest, UserCreate, UserPatch,
};
use crate::domain::Score;

pub const USERNAME_MAX_LEN: usize = 150;
pub const EMAIL_MAX_LEN: usize = 254;
pub const PERSON_NAME_MAX_LEN: usize = 150;
pub const CATALOG_NAME_MAX_LEN: usize = 256;
pub const SLUG_MAX_LEN: usize = 50;

/// 保留用户名，与 /users/me 冲突
const RESERVED_USERNAME: &str = "me";

/// 单个字段的校验失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// 校验规则
pub type Rule<T> = fn(&T) -> Result<(), FieldError>;

/// 执行全部规则
pub fn validate<T>(input: &T, rules: &[Rule<T>]) -> AppResult<()> {
    let errors: Vec<String> = rules
        .iter()
        .filter_map(|rule| rule(input).err())
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation(errors.join("; ")))
    }
}

// ============================================================================
// 字段谓词
// ============================================================================

fn required(field: &'static str, value: &str) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::new(field, "This field may not be blank"));
    }
    Ok(())
}

fn max_len(field: &'static str, value: &str, max: usize) -> Result<(), FieldError> {
    if value.chars().count() > max {
        return Err(FieldError::new(
            field,
            format!("Ensure this field has no more than {} characters", max),
        ));
    }
    Ok(())
}

pub fn username(value: &str) -> Result<(), FieldError> {
    const FIELD: &str = "username";
    required(FIELD, value)?;
    max_len(FIELD, value, USERNAME_MAX_LEN)?;

    // 字母、数字与 @ . + - _
    if !value
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
    {
        return Err(FieldError::new(
            FIELD,
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters",
        ));
    }

    if value.eq_ignore_ascii_case(RESERVED_USERNAME) {
        return Err(FieldError::new(FIELD, "Username \"me\" is reserved"));
    }
    Ok(())
}

pub fn email(value: &str) -> Result<(), FieldError> {
    const FIELD: &str = "email";
    required(FIELD, value)?;
    max_len(FIELD, value, EMAIL_MAX_LEN)?;

    if !EmailAddress::is_valid(value) {
        return Err(FieldError::new(FIELD, "Enter a valid email address"));
    }
    Ok(())
}

pub fn slug(value: &str) -> Result<(), FieldError> {
    const FIELD: &str = "slug";
    required(FIELD, value)?;
    max_len(FIELD, value, SLUG_MAX_LEN)?;

    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(FieldError::new(
            FIELD,
            "Enter a valid slug consisting of letters, numbers, underscores or hyphens",
        ));
    }
    Ok(())
}

/// 发行年份不能晚于当前年份
pub fn year(value: i32) -> Result<(), FieldError> {
    let current = Utc::now().year();
    if !(0..=current).contains(&value) {
        return Err(FieldError::new(
            "year",
            format!("Year must be between 0 and {}", current),
        ));
    }
    Ok(())
}

pub fn score(value: i64) -> Result<(), FieldError> {
    Score::new(value)
        .map(|_| ())
        .map_err(|e| FieldError::new("score", e.to_string()))
}

fn catalog_name(value: &str) -> Result<(), FieldError> {
    required("name", value)?;
    max_len("name", value, CATALOG_NAME_MAX_LEN)
}

fn genre_list(genres: &[String]) -> Result<(), FieldError> {
    if genres.is_empty() {
        return Err(FieldError::new("genre", "At least one genre is required"));
    }
    Ok(())
}

fn optional<V: ?Sized>(
    value: Option<&V>,
    check: impl Fn(&V) -> Result<(), FieldError>,
) -> Result<(), FieldError> {
    value.map_or(Ok(()), check)
}

// ============================================================================
// 规则集
// ============================================================================

pub const SIGNUP_RULES: &[Rule<SignupRequest>] = &[|r| username(&r.username), |r| email(&r.email)];

pub const TOKEN_RULES: &[Rule<TokenRequest>] = &[
    |r| required("username", &r.username),
    |r| required("confirmation_code", &r.confirmation_code),
];

pub const USER_CREATE_RULES: &[Rule<UserCreate>] = &[
    |r| username(&r.username),
    |r| email(&r.email),
    |r| optional(r.first_name.as_deref(), |v| max_len("first_name", v, PERSON_NAME_MAX_LEN)),
    |r| optional(r.last_name.as_deref(), |v| max_len("last_name", v, PERSON_NAME_MAX_LEN)),
];

pub const USER_PATCH_RULES: &[Rule<UserPatch>] = &[
    |r| optional(r.username.as_deref(), username),
    |r| optional(r.email.as_deref(), email),
    |r| optional(r.first_name.as_deref(), |v| max_len("first_name", v, PERSON_NAME_MAX_LEN)),
    |r| optional(r.last_name.as_deref(), |v| max_len("last_name", v, PERSON_NAME_MAX_LEN)),
];

pub const SLUG_CREATE_RULES: &[Rule<SlugCreate>] = &[|r| catalog_name(&r.name), |r| slug(&r.slug)];

pub const TITLE_CREATE_RULES: &[Rule<TitleCreate>] = &[
    |r| catalog_name(&r.name),
    |r| year(r.year),
    |r| genre_list(&r.genre),
];

pub const TITLE_PATCH_RULES: &[Rule<TitlePatch>] = &[
    |r| optional(r.name.as_deref(), catalog_name),
    |r| r.year.map_or(Ok(()), year),
    |r| optional(r.genre.as_deref(), genre_list),
];

pub const REVIEW_CREATE_RULES: &[Rule<ReviewCreate>] =
    &[|r| required("text", &r.text), |r| score(r.score)];

pub const REVIEW_PATCH_RULES: &[Rule<ReviewPatch>] = &[
    |r| optional(r.text.as_deref(), |v| required("text", v)),
    |r| r.score.map_or(Ok(()), score),
];

pub const COMMENT_CREATE_RULES: &[Rule<CommentCreate>] = &[|r| required("text", &r.text)];

pub const COMMENT_PATCH_RULES: &[Rule<CommentPatch>] =
    &[|r| optional(r.text.as_deref(), |v| required("text", v))];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(username("reader_1").is_ok());
        assert!(username("first.last@home+x-y").is_ok());
        assert!(username("").is_err());
        assert!(username("with space").is_err());
        assert!(username("me").is_err());
        assert!(username("ME").is_err());
        assert!(username(&"a".repeat(USERNAME_MAX_LEN)).is_ok());
        assert!(username(&"a".repeat(USERNAME_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(email("reader@example.com").is_ok());
        assert!(email("not-an-email").is_err());
        assert!(email("").is_err());
    }

    #[test]
    fn test_slug_rules() {
        assert!(slug("sci-fi_2").is_ok());
        assert!(slug("sci fi").is_err());
        assert!(slug("научная").is_err());
        assert!(slug(&"s".repeat(SLUG_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn test_year_rules() {
        let current = Utc::now().year();
        assert!(year(0).is_ok());
        assert!(year(current).is_ok());
        assert!(year(current + 1).is_err());
        assert!(year(-1).is_err());
    }

    #[test]
    fn test_score_rules() {
        assert!(score(1).is_ok());
        assert!(score(10).is_ok());
        assert!(score(0).is_err());
        assert!(score(11).is_err());
    }

    #[test]
    fn test_all_failures_are_reported() {
        let input = SignupRequest {
            username: "me".to_string(),
            email: "broken".to_string(),
        };

        let err = validate(&input, SIGNUP_RULES).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("username:"));
        assert!(message.contains("email:"));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_patch_rules_skip_absent_fields() {
        assert!(validate(&TitlePatch::default(), TITLE_PATCH_RULES).is_ok());
        assert!(validate(&ReviewPatch::default(), REVIEW_PATCH_RULES).is_ok());

        let patch = TitlePatch {
            genre: Some(vec![]),
            ..TitlePatch::default()
        };
        assert!(validate(&patch, TITLE_PATCH_RULES).is_err());
    }

    #[test]
    fn test_review_rules() {
        let review = ReviewCreate {
            text: "  ".to_string(),
            score: 12,
        };
        let message = validate(&review, REVIEW_CREATE_RULES).unwrap_err().to_string();
        assert!(message.contains("text:"));
        assert!(message.contains("score:"));
    }
}
