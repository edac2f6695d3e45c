//! 读写数据形状
//!
//! 每个实体一个读视图（`*View`）与独立的写入形状（`*Create` / `*Patch`），
//! 读视图由显式的 `From` 映射生成

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Comment, Review, Role, SlugEntity, Title, User};

// ============================================================================
// 认证
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignupResponse {
    pub email: String,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub confirmation_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

// ============================================================================
// 用户
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserView {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub bio: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            bio: user.bio.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

/// 管理员创建用户
#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// 用户的局部修改；在 /users/me 上 `username` 与 `role` 被忽略
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl UserPatch {
    /// 去掉自助修改资料时只读的字段
    pub fn without_read_only(self) -> Self {
        Self {
            username: None,
            role: None,
            ..self
        }
    }

    pub fn apply_to(self, user: &mut User) {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(bio) = self.bio {
            user.bio = bio;
        }
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
    }
}

// ============================================================================
// 分类 / 体裁
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlugView {
    pub name: String,
    pub slug: String,
}

impl SlugView {
    pub fn from_entity<T: SlugEntity>(entity: &T) -> Self {
        Self {
            name: entity.name().to_string(),
            slug: entity.slug().to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlugCreate {
    pub name: String,
    pub slug: String,
}

// ============================================================================
// 作品
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TitleView {
    pub id: i64,
    pub name: String,
    pub year: i32,
    pub rating: Option<u8>,
    /// 缺省时为空字符串
    pub description: String,
    pub genre: Vec<SlugView>,
    /// 未设置分类时为 null
    pub category: Option<SlugView>,
}

impl From<&Title> for TitleView {
    fn from(title: &Title) -> Self {
        Self {
            id: title.id.value(),
            name: title.name.clone(),
            year: title.year,
            rating: title.rating,
            description: title.description.clone().unwrap_or_default(),
            genre: title.genres.iter().map(SlugView::from_entity).collect(),
            category: title.category.as_ref().map(SlugView::from_entity),
        }
    }
}

/// 创建作品；分类与体裁以 slug 引用
#[derive(Debug, Clone, Deserialize)]
pub struct TitleCreate {
    pub name: String,
    pub year: i32,
    #[serde(default)]
    pub description: Option<String>,
    pub genre: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TitlePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub genre: Option<Vec<String>>,
    #[serde(default)]
    pub category: Option<String>,
}

/// 作品列表查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TitleQuery {
    pub category: Option<String>,
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub name: Option<String>,
}

// ============================================================================
// 评论 / 回复
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewView {
    pub id: i64,
    pub text: String,
    /// 作者用户名
    pub author: String,
    pub score: u8,
    pub pub_date: DateTime<Utc>,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        Self {
            id: review.id.value(),
            text: review.text.clone(),
            author: review.author.clone(),
            score: review.score.value(),
            pub_date: review.pub_date,
        }
    }
}

/// 分数先按整数接收，范围由校验规则检查
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewCreate {
    pub text: String,
    pub score: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPatch {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommentView {
    pub id: i64,
    pub text: String,
    pub author: String,
    pub pub_date: DateTime<Utc>,
}

impl From<&Comment> for CommentView {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id.value(),
            text: comment.text.clone(),
            author: comment.author.clone(),
            pub_date: comment.pub_date,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentCreate {
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentPatch {
    #[serde(default)]
    pub text: Option<String>,
}
