//! 仓储接口

use async_trait::async_trait;
use yamdb_common::{CommentId, Page, PageRequest, ReviewId, TitleId, UserId};
use yamdb_errors::AppResult;

use super::catalog::{NewTitle, SlugEntity, Title, TitleChanges, TitleFilter};
use super::review::{Comment, NewComment, NewReview, Review, ReviewChanges};
use super::user::{NewUser, User};

/// 用户仓储接口
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 创建用户，用户名或邮箱已存在时返回 Validation
    async fn create(&self, user: &NewUser) -> AppResult<User>;

    /// 保存用户的全部可变字段
    async fn update(&self, user: &User) -> AppResult<User>;

    /// 删除用户及其评论、回复
    async fn delete(&self, id: UserId) -> AppResult<bool>;

    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// 记录新的确认码
    async fn set_confirmation_code(&self, id: UserId, code: &str) -> AppResult<()>;

    /// 按用户名包含搜索
    async fn list(&self, search: Option<&str>, page: PageRequest) -> AppResult<Page<User>>;
}

/// 分类 / 体裁仓储接口
#[async_trait]
pub trait SlugRepository<T: SlugEntity>: Send + Sync {
    async fn create(&self, name: &str, slug: &str) -> AppResult<T>;

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<T>>;

    async fn exists_by_name(&self, name: &str) -> AppResult<bool>;

    /// 删除后作品上的引用被解除（分类置空 / 体裁关联移除）
    async fn delete_by_slug(&self, slug: &str) -> AppResult<bool>;

    /// 按名称包含搜索
    async fn list(&self, search: Option<&str>, page: PageRequest) -> AppResult<Page<T>>;
}

/// 作品仓储接口
#[async_trait]
pub trait TitleRepository: Send + Sync {
    async fn create(&self, title: &NewTitle) -> AppResult<TitleId>;

    /// 作品不存在时返回 false
    async fn update(&self, id: TitleId, changes: &TitleChanges) -> AppResult<bool>;

    /// 删除作品及其评论、回复
    async fn delete(&self, id: TitleId) -> AppResult<bool>;

    /// 返回带实时评分的作品
    async fn find_by_id(&self, id: TitleId) -> AppResult<Option<Title>>;

    async fn exists(&self, id: TitleId) -> AppResult<bool>;

    async fn list(&self, filter: &TitleFilter, page: PageRequest) -> AppResult<Page<Title>>;
}

/// 评论仓储接口
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// 原子地检查并插入；(title, author) 已有评论时返回 Conflict
    async fn create(&self, review: &NewReview) -> AppResult<Review>;

    async fn exists_for(&self, title_id: TitleId, author_id: UserId) -> AppResult<bool>;

    async fn find(&self, title_id: TitleId, id: ReviewId) -> AppResult<Option<Review>>;

    async fn update(&self, id: ReviewId, changes: &ReviewChanges) -> AppResult<Review>;

    /// 删除评论及其回复
    async fn delete(&self, id: ReviewId) -> AppResult<bool>;

    async fn list_for_title(&self, title_id: TitleId, page: PageRequest)
    -> AppResult<Page<Review>>;
}

/// 回复仓储接口
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, comment: &NewComment) -> AppResult<Comment>;

    async fn find(&self, review_id: ReviewId, id: CommentId) -> AppResult<Option<Comment>>;

    async fn update(&self, id: CommentId, text: &str) -> AppResult<Comment>;

    async fn delete(&self, id: CommentId) -> AppResult<bool>;

    async fn list_for_review(
        &self,
        review_id: ReviewId,
        page: PageRequest,
    ) -> AppResult<Page<Comment>>;
}
